use crate::core::cache::{ForecastCache, SystemClock};
use crate::core::fetcher::ForecastFetcher;
use crate::core::{normalizer, report, selector};
use crate::core::{Clock, ConfigProvider, Pipeline, Storage};
use crate::domain::model::{ForecastReport, RawForecastDocument};
use crate::utils::error::{ForecastError, Result};
use std::io::Write;
use std::sync::Arc;
use zip::write::{SimpleFileOptions, ZipWriter};

pub struct ForecastPipeline<S: Storage, C: ConfigProvider, K: Clock = SystemClock> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) fetcher: Arc<ForecastFetcher<K>>,
    force_refresh: bool,
}

impl<S: Storage, C: ConfigProvider> ForecastPipeline<S, C, SystemClock> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let cache = Arc::new(ForecastCache::new(config.cache_ttl()));
        let fetcher = Arc::new(ForecastFetcher::new(&config, cache)?);
        Ok(Self::with_fetcher(storage, config, fetcher))
    }
}

impl<S: Storage, C: ConfigProvider, K: Clock> ForecastPipeline<S, C, K> {
    /// 共用既有的 fetcher (以及它的快取)
    pub fn with_fetcher(storage: S, config: C, fetcher: Arc<ForecastFetcher<K>>) -> Self {
        Self {
            storage,
            config,
            fetcher,
            force_refresh: false,
        }
    }

    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    pub fn fetcher(&self) -> &Arc<ForecastFetcher<K>> {
        &self.fetcher
    }

    fn build_archive(&self, report: &ForecastReport) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        for format in self.config.output_formats() {
            let (name, content) = match format.as_str() {
                "csv" => ("forecast.csv", report::to_csv(&report.records)?),
                "tsv" => ("forecast.tsv", report::to_tsv(&report.records)?),
                "json" => ("forecast.json", report::to_json(&report.records)?),
                other => {
                    return Err(ForecastError::InvalidConfigValueError {
                        field: "output_formats".to_string(),
                        value: other.to_string(),
                        reason: "Unsupported format".to_string(),
                    })
                }
            };
            zip.start_file(name, SimpleFileOptions::default())?;
            zip.write_all(content.as_bytes())?;
        }

        // 被略過的縣市另外列出，方便追查上游資料
        if !report.failures.is_empty() {
            let skipped: Vec<String> = report
                .failures
                .iter()
                .map(|failure| ForecastError::from(failure.clone()).to_string())
                .collect();
            zip.start_file("skipped_regions.json", SimpleFileOptions::default())?;
            zip.write_all(serde_json::to_string_pretty(&skipped)?.as_bytes())?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, K: Clock> Pipeline for ForecastPipeline<S, C, K> {
    async fn extract(&self) -> Result<Arc<RawForecastDocument>> {
        if self.force_refresh {
            tracing::info!("🔄 Forcing a fresh fetch from {}", self.config.api_endpoint());
            self.fetcher.refresh().await
        } else {
            self.fetcher.fetch().await
        }
    }

    async fn transform(&self, document: Arc<RawForecastDocument>) -> Result<ForecastReport> {
        let normalized = normalizer::normalize(&document)?;

        let names = selector::regions(&normalized.records);
        let region = selector::default_region(&names, self.config.preferred_region())?;
        let records = selector::for_region(&normalized.records, &region)?;
        let current = selector::current(&records)?.clone();
        let summary_window = selector::head(&records, self.config.summary_rows());

        tracing::info!(
            "🔧 Selected {} with {} intervals ({} regions available)",
            region,
            records.len(),
            names.len()
        );

        Ok(ForecastReport {
            region,
            regions: names.into_iter().collect(),
            records,
            current,
            summary_window,
            failures: normalized.failures,
        })
    }

    async fn load(&self, report: &ForecastReport) -> Result<String> {
        let archive_name = self.config.archive_name();
        let output_path = format!("{}/{}", self.config.output_path(), archive_name);

        let zip_data = self.build_archive(report)?;
        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage.write_file(archive_name, &zip_data).await?;

        tracing::info!("📦 Forecast export saved: {}", output_path);
        Ok(output_path)
    }
}
