use crate::core::{ForecastReport, Pipeline};
use crate::utils::error::Result;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: ForecastReport,
    pub output_path: String,
}

pub struct ForecastEngine<P: Pipeline> {
    pipeline: P,
    timings: bool,
}

impl<P: Pipeline> ForecastEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            timings: false,
        }
    }

    /// 每個階段結束時記錄耗時
    pub fn new_with_timings(pipeline: P, timings: bool) -> Self {
        Self { pipeline, timings }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// 抓取、正規化並匯出；任何一步失敗整個週期就中止
    pub async fn run(&self) -> Result<RunOutcome> {
        let started = Instant::now();
        tracing::info!("🚀 Starting forecast refresh cycle");

        let document = self.pipeline.extract().await?;
        self.log_phase("extract", started);

        let report = self.pipeline.transform(document).await?;
        tracing::info!(
            "Transformed {} records for {}",
            report.records.len(),
            report.region
        );
        self.log_phase("transform", started);

        let output_path = self.pipeline.load(&report).await?;
        self.log_phase("load", started);

        Ok(RunOutcome {
            report,
            output_path,
        })
    }

    fn log_phase(&self, phase: &str, started: Instant) {
        if self.timings {
            tracing::info!("📊 {} done after {:?}", phase, started.elapsed());
        }
    }
}
