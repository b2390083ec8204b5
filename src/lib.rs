pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use crate::core::{
    cache::{ForecastCache, ManualClock, SystemClock},
    etl::{ForecastEngine, RunOutcome},
    fetcher::ForecastFetcher,
    normalizer::normalize,
    pipeline::ForecastPipeline,
};
pub use domain::model::{ForecastRecord, ForecastReport, NormalizedForecast, RawForecastDocument};
pub use utils::error::{ForecastError, Result};
