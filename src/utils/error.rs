use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Upstream request failed: {0}")]
    UpstreamError(#[from] UpstreamFailure),

    #[error("Unexpected forecast document shape: {message}")]
    SchemaError { message: String },

    #[error("Region #{position} ({region}) skipped: {issue}")]
    PartialRegionError {
        position: usize,
        region: String,
        issue: RegionIssue,
    },

    #[error("No forecast records for region: {region}")]
    NotFoundError { region: String },

    #[error("No forecast records to select from")]
    EmptyResultError,

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration field '{field}' is invalid: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

/// 上游請求失敗的底層原因
#[derive(Error, Debug)]
pub enum UpstreamFailure {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response body is not valid JSON: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("response has no forecast data: {body}")]
    UnexpectedShape { body: String },
}

/// 單一縣市資料無法對齊的原因
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegionIssue {
    #[error("locationName is missing or empty")]
    MissingName,

    #[error("region entry is malformed: {0}")]
    MalformedEntry(String),

    #[error("required element series '{0}' is missing")]
    MissingElement(String),

    #[error("element '{element}' has {actual} entries, expected {expected}")]
    LengthMismatch {
        element: String,
        expected: usize,
        actual: usize,
    },

    #[error("interval #{index} is invalid: {detail}")]
    InvalidInterval { index: usize, detail: String },

    #[error("interval #{index} has MinT {min} above MaxT {max}")]
    InvertedTemperature { index: usize, min: f64, max: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Query,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ForecastError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UpstreamError(_) => ErrorCategory::Network,
            Self::SchemaError { .. } | Self::PartialRegionError { .. } => ErrorCategory::Data,
            Self::NotFoundError { .. } | Self::EmptyResultError => ErrorCategory::Query,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::ZipError(_)
            | Self::CsvError(_)
            | Self::IoError(_)
            | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一縣市被略過不影響其他縣市
            Self::PartialRegionError { .. } => ErrorSeverity::Low,
            // 下次刷新週期可能恢復
            Self::UpstreamError(_) => ErrorSeverity::Medium,
            Self::SchemaError { .. }
            | Self::NotFoundError { .. }
            | Self::EmptyResultError
            | Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorSeverity::High,
            Self::ZipError(_)
            | Self::CsvError(_)
            | Self::IoError(_)
            | Self::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::UpstreamError(UpstreamFailure::Status { status: 401, .. })
            | Self::UpstreamError(UpstreamFailure::Status { status: 403, .. }) => {
                "Check that CWA_API_KEY holds a valid authorization key".to_string()
            }
            Self::UpstreamError(UpstreamFailure::UnexpectedShape { .. }) => {
                "The upstream answered without records.location; check the API key quota and the dataset id".to_string()
            }
            Self::UpstreamError(_) => {
                "Check network connectivity and retry after the next refresh window".to_string()
            }
            Self::SchemaError { .. } => {
                "The upstream dataset format may have changed; verify the endpoint points at F-C0032-001".to_string()
            }
            Self::PartialRegionError { .. } => {
                "No action needed; the region will be retried on the next fetch".to_string()
            }
            Self::NotFoundError { .. } => {
                "Pick one of the regions listed in the latest forecast".to_string()
            }
            Self::EmptyResultError => "Wait for the next forecast refresh".to_string(),
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => {
                "Review the command line arguments or the TOML configuration file".to_string()
            }
            Self::IoError(_) | Self::ZipError(_) => {
                "Check that the output path exists and is writable".to_string()
            }
            Self::CsvError(_) | Self::SerializationError(_) => {
                "Re-run with --verbose and report the failing record".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::UpstreamError(_) => format!("無法取得氣象資料：{}", self),
            Self::SchemaError { .. } => format!("氣象資料格式不符：{}", self),
            Self::NotFoundError { region } => format!("找不到「{}」的預報資料", region),
            Self::EmptyResultError => "目前沒有任何預報資料".to_string(),
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => format!("設定錯誤：{}", self),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;
