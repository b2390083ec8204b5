pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
mod args;

#[cfg(feature = "cli")]
pub use args::CliConfig;

pub const DEFAULT_ENDPOINT: &str =
    "https://opendata.cwa.gov.tw/api/v1/rest/datastore/F-C0032-001";
pub const SUPPORTED_FORMATS: [&str; 3] = ["csv", "tsv", "json"];
