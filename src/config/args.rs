use super::{DEFAULT_ENDPOINT, SUPPORTED_FORMATS};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "tw-forecast")]
#[command(about = "36-hour county forecast from the CWA open data feed")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub api_endpoint: String,

    #[arg(long, env = "CWA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, default_value = "臺北市")]
    pub region: Option<String>,

    #[arg(long, default_value = "900")]
    pub cache_ttl_secs: u64,

    #[arg(long, default_value = "20")]
    pub timeout_secs: u64,

    #[arg(long, help = "Skip TLS certificate validation for the upstream")]
    pub accept_invalid_certs: bool,

    #[arg(long, default_value = "3")]
    pub summary_rows: usize,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "csv,tsv,json")]
    pub output_formats: Vec<String>,

    #[arg(long, help = "Re-run every N seconds, reusing the forecast cache")]
    pub watch_secs: Option<u64>,

    #[arg(long, help = "Bypass the cache and fetch immediately")]
    pub refresh: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl ConfigProvider for CliConfig {
    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    fn preferred_region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    fn summary_rows(&self) -> usize {
        self.summary_rows
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.output_formats
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api_endpoint", &self.api_endpoint)?;
        let api_key = validation::validate_required_field("api_key", &self.api_key)?;
        validation::validate_non_empty_string("api_key", api_key)?;
        validation::validate_positive_number("cache_ttl_secs", self.cache_ttl_secs as usize, 1)?;
        validation::validate_range("timeout_secs", self.timeout_secs, 1, 300)?;
        validation::validate_range("summary_rows", self.summary_rows, 1, 20)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_formats("output_formats", &self.output_formats, &SUPPORTED_FORMATS)?;
        if let Some(watch) = self.watch_secs {
            validation::validate_positive_number("watch_secs", watch as usize, 1)?;
        }
        Ok(())
    }
}
