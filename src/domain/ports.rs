use crate::domain::model::{ForecastReport, RawForecastDocument};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub const DEFAULT_ARCHIVE_NAME: &str = "forecast_export.zip";

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn api_key(&self) -> &str;
    fn cache_ttl(&self) -> Duration;
    fn request_timeout(&self) -> Duration;
    /// 上游憑證設定有誤時才開啟
    fn accept_invalid_certs(&self) -> bool;
    fn preferred_region(&self) -> Option<&str>;
    fn summary_rows(&self) -> usize;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];

    fn archive_name(&self) -> &str {
        DEFAULT_ARCHIVE_NAME
    }
}

/// 單調時鐘，讓快取過期可以在測試中控制
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Arc<RawForecastDocument>>;
    async fn transform(&self, document: Arc<RawForecastDocument>) -> Result<ForecastReport>;
    async fn load(&self, report: &ForecastReport) -> Result<String>;
}
