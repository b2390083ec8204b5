use crate::domain::model::{ForecastRecord, NormalizedForecast, RawForecastDocument, RegionFailure};
use crate::utils::error::{ForecastError, RegionIssue, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

pub const CONDITION: &str = "Wx";
pub const RAIN_PROBABILITY: &str = "PoP";
pub const MIN_TEMPERATURE: &str = "MinT";
pub const MAX_TEMPERATURE: &str = "MaxT";

/// 中央氣象署時間字串未附時區時視為台灣時間
const TAIWAN_OFFSET_SECS: i32 = 8 * 3600;
const NAIVE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLocation {
    #[serde(default)]
    location_name: Option<String>,
    #[serde(default)]
    weather_element: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTimeEntry {
    start_time: String,
    end_time: String,
    parameter: RawParameter,
}

/// 時段以 Wx 為準，其他要素只取數值
#[derive(Debug, Deserialize)]
struct RawValueEntry {
    parameter: RawParameter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParameter {
    #[serde(default)]
    parameter_name: serde_json::Value,
}

impl RawParameter {
    fn text(&self) -> String {
        match &self.parameter_name {
            serde_json::Value::String(s) => s.trim().to_string(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// 將巢狀的要素時間序列攤平成每縣市、每時段一筆的記錄
///
/// 缺少 `records.location` 會整批失敗；單一縣市要素不齊或長度不一致
/// 只略過該縣市並記在 `failures`。數值解析失敗只會讓欄位為空。
pub fn normalize(doc: &RawForecastDocument) -> Result<NormalizedForecast> {
    let locations = doc.locations().ok_or_else(|| ForecastError::SchemaError {
        message: "missing records.location array".to_string(),
    })?;

    let mut normalized = NormalizedForecast::default();

    for (position, location) in locations.iter().enumerate() {
        let region_hint = location
            .get("locationName")
            .and_then(|name| name.as_str())
            .unwrap_or("<unknown>")
            .to_string();

        match normalize_region(location) {
            Ok(records) => {
                tracing::debug!("Region {} produced {} records", region_hint, records.len());
                normalized.records.extend(records);
            }
            Err(issue) => {
                let failure = RegionFailure {
                    position,
                    region: region_hint,
                    issue,
                };
                tracing::warn!("⚠️ {}", ForecastError::from(failure.clone()));
                normalized.failures.push(failure);
            }
        }
    }

    tracing::info!(
        "📊 Normalized {} records from {} regions ({} skipped)",
        normalized.records.len(),
        locations.len(),
        normalized.failures.len()
    );
    Ok(normalized)
}

fn normalize_region(
    location: &serde_json::Value,
) -> std::result::Result<Vec<ForecastRecord>, RegionIssue> {
    let location: RawLocation = serde_json::from_value(location.clone())
        .map_err(|e| RegionIssue::MalformedEntry(e.to_string()))?;

    let region = location
        .location_name
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if region.is_empty() {
        return Err(RegionIssue::MissingName);
    }

    // 同名要素以最後一筆為準；用不到的要素不解析
    let elements: HashMap<&str, &serde_json::Value> = location
        .weather_element
        .iter()
        .filter_map(|element| {
            let name = element.get("elementName")?.as_str()?;
            Some((name, element))
        })
        .collect();

    let conditions: Vec<RawTimeEntry> = element_series(&elements, CONDITION)?;
    let rain: Vec<RawValueEntry> = element_series(&elements, RAIN_PROBABILITY)?;
    let min_temps: Vec<RawValueEntry> = element_series(&elements, MIN_TEMPERATURE)?;
    let max_temps: Vec<RawValueEntry> = element_series(&elements, MAX_TEMPERATURE)?;

    let expected = conditions.len();
    for (element, actual) in [
        (RAIN_PROBABILITY, rain.len()),
        (MIN_TEMPERATURE, min_temps.len()),
        (MAX_TEMPERATURE, max_temps.len()),
    ] {
        if actual != expected {
            return Err(RegionIssue::LengthMismatch {
                element: element.to_string(),
                expected,
                actual,
            });
        }
    }

    let mut records = Vec::with_capacity(expected);
    for (index, (((wx, pop), min_t), max_t)) in conditions
        .iter()
        .zip(&rain)
        .zip(&min_temps)
        .zip(&max_temps)
        .enumerate()
    {
        let interval_start =
            parse_timestamp(&wx.start_time).ok_or_else(|| RegionIssue::InvalidInterval {
                index,
                detail: format!("unparseable startTime '{}'", wx.start_time),
            })?;
        let interval_end =
            parse_timestamp(&wx.end_time).ok_or_else(|| RegionIssue::InvalidInterval {
                index,
                detail: format!("unparseable endTime '{}'", wx.end_time),
            })?;
        if interval_start >= interval_end {
            return Err(RegionIssue::InvalidInterval {
                index,
                detail: format!(
                    "startTime {} is not before endTime {}",
                    wx.start_time, wx.end_time
                ),
            });
        }

        let min_temp = parse_number(&min_t.parameter.text());
        let max_temp = parse_number(&max_t.parameter.text());
        if let (Some(min), Some(max)) = (min_temp, max_temp) {
            if min > max {
                return Err(RegionIssue::InvertedTemperature { index, min, max });
            }
        }

        records.push(ForecastRecord {
            region: region.clone(),
            interval_start,
            interval_end,
            condition: wx.parameter.text(),
            rain_probability: parse_percentage(&pop.parameter.text()),
            min_temp,
            max_temp,
            approx_temp: approx_temperature(min_temp, max_temp),
        });
    }

    Ok(records)
}

fn element_series<T: DeserializeOwned>(
    elements: &HashMap<&str, &serde_json::Value>,
    name: &str,
) -> std::result::Result<Vec<T>, RegionIssue> {
    let element = elements
        .get(name)
        .ok_or_else(|| RegionIssue::MissingElement(name.to_string()))?;

    match element.get("time") {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(time) => serde_json::from_value(time.clone())
            .map_err(|e| RegionIssue::MalformedEntry(format!("{}: {}", name, e))),
    }
}

/// 接受 `2024-01-01 06:00:00`（台灣時間）或 RFC 3339
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    let naive = NaiveDateTime::parse_from_str(raw, NAIVE_TIME_FORMAT).ok()?;
    let offset = FixedOffset::east_opt(TAIWAN_OFFSET_SECS)?;
    naive.and_local_timezone(offset).single()
}

pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_percentage(raw: &str) -> Option<f64> {
    parse_number(raw).filter(|value| (0.0..=100.0).contains(value))
}

pub fn approx_temperature(min_temp: Option<f64>, max_temp: Option<f64>) -> Option<f64> {
    match (min_temp, max_temp) {
        (Some(min), Some(max)) => Some((min + max) / 2.0),
        _ => None,
    }
}
