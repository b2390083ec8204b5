use crate::utils::error::{ForecastError, RegionIssue};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// 上游回傳的原始 JSON 文件，只在快取與正規化之間流動
#[derive(Debug, Clone, PartialEq)]
pub struct RawForecastDocument {
    value: serde_json::Value,
}

impl RawForecastDocument {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes).map(Self::new)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.value
    }

    /// `records.location` 陣列；上游回傳錯誤訊息時不存在
    pub fn locations(&self) -> Option<&[serde_json::Value]> {
        self.value
            .get("records")
            .and_then(|records| records.get("location"))
            .and_then(|location| location.as_array())
            .map(Vec::as_slice)
    }
}

/// 一個縣市在一個預報時段的正規化資料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub region: String,
    pub interval_start: DateTime<FixedOffset>,
    pub interval_end: DateTime<FixedOffset>,
    pub condition: String,
    pub rain_probability: Option<f64>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub approx_temp: Option<f64>,
}

/// 被略過的縣市與原因
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFailure {
    /// 在 `records.location` 中的索引
    pub position: usize,
    pub region: String,
    pub issue: RegionIssue,
}

impl From<RegionFailure> for ForecastError {
    fn from(failure: RegionFailure) -> Self {
        ForecastError::PartialRegionError {
            position: failure.position,
            region: failure.region,
            issue: failure.issue,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedForecast {
    pub records: Vec<ForecastRecord>,
    pub failures: Vec<RegionFailure>,
}

/// 單一縣市的查詢結果，交給呈現層 (表格、圖表、摘要)
#[derive(Debug, Clone)]
pub struct ForecastReport {
    pub region: String,
    pub regions: Vec<String>,
    pub records: Vec<ForecastRecord>,
    pub current: ForecastRecord,
    pub summary_window: Vec<ForecastRecord>,
    pub failures: Vec<RegionFailure>,
}
