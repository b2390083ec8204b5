use crate::domain::model::{ForecastRecord, ForecastReport};
use crate::utils::error::{ForecastError, Result};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt::Write as _;

const PLACEHOLDER: &str = "—";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// 明細表的一列
#[derive(Debug, Serialize)]
struct DetailRow<'a> {
    start: String,
    end: String,
    condition: &'a str,
    min_temp: Option<f64>,
    max_temp: Option<f64>,
    rain_probability: Option<f64>,
    approx_temp: Option<f64>,
}

impl<'a> From<&'a ForecastRecord> for DetailRow<'a> {
    fn from(record: &'a ForecastRecord) -> Self {
        Self {
            start: record.interval_start.format(TIME_FORMAT).to_string(),
            end: record.interval_end.format(TIME_FORMAT).to_string(),
            condition: &record.condition,
            min_temp: record.min_temp,
            max_temp: record.max_temp,
            rain_probability: record.rain_probability,
            approx_temp: record.approx_temp,
        }
    }
}

/// 圖表用的資料點
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub at: DateTime<FixedOffset>,
    pub value: Option<f64>,
}

pub fn temperature_series(records: &[ForecastRecord]) -> Vec<ChartPoint> {
    records
        .iter()
        .map(|record| ChartPoint {
            at: record.interval_start,
            value: record.approx_temp,
        })
        .collect()
}

pub fn rain_series(records: &[ForecastRecord]) -> Vec<ChartPoint> {
    records
        .iter()
        .map(|record| ChartPoint {
            at: record.interval_start,
            value: record.rain_probability,
        })
        .collect()
}

pub fn format_temperature(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn format_percentage(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.0}", v))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn to_csv(records: &[ForecastRecord]) -> Result<String> {
    write_delimited(records, b',')
}

pub fn to_tsv(records: &[ForecastRecord]) -> Result<String> {
    write_delimited(records, b'\t')
}

pub fn to_json(records: &[ForecastRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

fn write_delimited(records: &[ForecastRecord], delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    for record in records {
        writer.serialize(DetailRow::from(record))?;
    }

    let bytes = writer.into_inner().map_err(|e| ForecastError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| ForecastError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// 終端機輸出：指標卡、明細表與摘要時段
pub fn render_text(report: &ForecastReport) -> String {
    let mut out = String::new();
    let now = &report.current;

    let _ = writeln!(out, "☁️  {} 36 小時預報", report.region);
    let _ = writeln!(
        out,
        "當期天氣: {}  最低溫: {}°C  最高溫: {}°C  降雨機率: {}%",
        now.condition,
        format_temperature(now.min_temp),
        format_temperature(now.max_temp),
        format_percentage(now.rain_probability)
    );
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{:<17} {:<17} {:<14} {:>6} {:>6} {:>5}",
        "開始", "結束", "天氣", "低溫", "高溫", "降雨"
    );
    for record in &report.records {
        let _ = writeln!(
            out,
            "{:<17} {:<17} {:<14} {:>6} {:>6} {:>5}",
            record.interval_start.format(TIME_FORMAT),
            record.interval_end.format(TIME_FORMAT),
            record.condition,
            format_temperature(record.min_temp),
            format_temperature(record.max_temp),
            format_percentage(record.rain_probability)
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "近似溫度 / 降雨機率:");
    for (temp, rain) in temperature_series(&report.summary_window)
        .iter()
        .zip(rain_series(&report.summary_window))
    {
        let _ = writeln!(
            out,
            "  {}  {}°C  {}%",
            temp.at.format(TIME_FORMAT),
            format_temperature(temp.value),
            format_percentage(rain.value)
        );
    }

    if !report.failures.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "⚠️ {} 個縣市資料不完整已略過", report.failures.len());
    }

    out
}
