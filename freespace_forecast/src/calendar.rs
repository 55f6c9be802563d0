//! Public holiday calendar used for the holiday covariate

use chrono::{Datelike, Duration, NaiveDate};

/// Source of public holidays
pub trait HolidayCalendar: std::fmt::Debug {
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

/// Swiss federal holidays plus the cantonal holidays of Zurich
#[derive(Debug, Clone, Copy, Default)]
pub struct SwissHolidays;

impl SwissHolidays {
    /// All holidays of `year`, sorted
    pub fn holidays(year: i32) -> Vec<NaiveDate> {
        let fixed = [(1, 1), (1, 2), (5, 1), (8, 1), (12, 25), (12, 26)];
        let mut days: Vec<NaiveDate> = fixed
            .iter()
            .filter_map(|&(m, d)| NaiveDate::from_ymd_opt(year, m, d))
            .collect();

        if let Some(easter) = easter_sunday(year) {
            // Good Friday, Easter Monday, Ascension, Whit Monday
            for offset in [-2, 1, 39, 50] {
                days.push(easter + Duration::days(offset));
            }
        }

        days.sort();
        days
    }
}

impl HolidayCalendar for SwissHolidays {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        Self::holidays(date.year()).contains(&date)
    }
}

/// Gregorian Easter Sunday (anonymous Gregorian computus)
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}
