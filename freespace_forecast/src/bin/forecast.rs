use freespace_forecast::data::ObservationLoader;
use freespace_forecast::pipeline::{ForecastPipeline, PredictionInput, PredictionResponse};
use freespace_forecast::store::{InMemoryModelStore, JsonFileModelStore, ModelStore};
use freespace_forecast::{ForecastConfig, ForecastError};
use log::info;
use std::path::PathBuf;
use std::process;

const USAGE: &str = "Usage: freespace-forecast <observations.csv> [--days N] [--config FILE] [--full]";

#[derive(Debug)]
struct Args {
    observations: PathBuf,
    days: Option<u32>,
    config: Option<PathBuf>,
    full: bool,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Args, String> {
    let mut observations = None;
    let mut days = None;
    let mut config = None;
    let mut full = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--days" => {
                let value = args.next().ok_or("--days needs a value")?;
                days = Some(
                    value
                        .parse::<u32>()
                        .map_err(|e| format!("Invalid --days '{}': {}", value, e))?,
                );
            }
            "--config" => {
                config = Some(PathBuf::from(args.next().ok_or("--config needs a value")?));
            }
            "--full" => full = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            other if other.starts_with("--") => {
                return Err(format!("Unknown option '{}'\n{}", other, USAGE))
            }
            other => observations = Some(PathBuf::from(other)),
        }
    }

    Ok(Args {
        observations: observations.ok_or_else(|| USAGE.to_string())?,
        days,
        config,
        full,
    })
}

fn forecast<S: ModelStore>(
    config: ForecastConfig,
    store: S,
    input: &PredictionInput,
) -> Result<PredictionResponse, ForecastError> {
    ForecastPipeline::new(config, store)?.run(input)
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => ForecastConfig::from_path(path)?,
        None => ForecastConfig::default(),
    };

    let observations = ObservationLoader::from_csv(&args.observations)?;
    info!(
        "Loaded {} observations from {}",
        observations.len(),
        args.observations.display()
    );
    let (timestamps, values) = observations.iter().map(|o| (o.timestamp, o.value)).unzip();

    let mut input = PredictionInput::new(timestamps, values).full_history(args.full);
    input.days = args.days;

    let response = match config.store_dir.clone() {
        Some(dir) => forecast(config, JsonFileModelStore::new(dir)?, &input)?,
        None => forecast(config, InMemoryModelStore::new(), &input)?,
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn main() {
    env_logger::init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(2);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
