//! Dense linear algebra helpers
//!
//! Only what the ridge fit needs: Gaussian elimination with partial pivoting
//! on small, well-conditioned normal-equation systems.

use crate::{MathError, Result};

const PIVOT_EPSILON: f64 = 1e-12;

/// Solve `a * x = b` for a square matrix `a` given as rows.
pub fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = a.len();
    if n == 0 {
        return Err(MathError::InsufficientData(
            "Cannot solve an empty system".to_string(),
        ));
    }
    if b.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(format!(
            "Expected a {}x{} matrix and a vector of length {}",
            n, n, n
        )));
    }

    for col in 0..n {
        // Partial pivoting
        let mut pivot_row = col;
        for row in (col + 1)..n {
            if a[row][col].abs() > a[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        if a[pivot_row][col].abs() < PIVOT_EPSILON {
            return Err(MathError::SingularMatrix(format!(
                "No usable pivot in column {}",
                col
            )));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Solution contains non-finite values".to_string(),
        ));
    }

    Ok(x)
}

/// Dot product of two equally sized slices.
pub fn dot(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(MathError::InvalidInput(format!(
            "Vector lengths differ ({} vs {})",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_solve_two_by_two() {
        // 2x + y = 5, x + 3y = 10
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let x = solve(a, vec![5.0, 10.0]).unwrap();
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(x[1], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_solve_requires_pivoting() {
        let a = vec![
            vec![0.0, 1.0, 1.0],
            vec![1.0, 0.0, 1.0],
            vec![1.0, 1.0, 0.0],
        ];
        let x = solve(a, vec![5.0, 4.0, 3.0]).unwrap();
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(x[1], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(x[2], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_solve_singular() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(matches!(
            solve(a, vec![1.0, 2.0]),
            Err(MathError::SingularMatrix(_))
        ));
    }

    #[test]
    fn test_solve_shape_errors() {
        assert!(solve(Vec::new(), Vec::new()).is_err());
        assert!(solve(vec![vec![1.0, 0.0]], vec![1.0]).is_err());
        assert!(dot(&[1.0], &[1.0, 2.0]).is_err());
    }
}
