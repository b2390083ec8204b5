pub mod cache;
pub mod etl;
pub mod fetcher;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod selector;

pub use crate::domain::model::{ForecastRecord, ForecastReport, NormalizedForecast, RawForecastDocument};
pub use crate::domain::ports::{Clock, ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
