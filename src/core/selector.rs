use crate::domain::model::ForecastRecord;
use crate::utils::error::{ForecastError, Result};
use std::collections::BTreeSet;

/// 不重複的縣市名稱，依字典序排列
pub fn regions(records: &[ForecastRecord]) -> BTreeSet<String> {
    records.iter().map(|record| record.region.clone()).collect()
}

/// 指定縣市的所有記錄，依開始時間穩定排序
pub fn for_region(records: &[ForecastRecord], region: &str) -> Result<Vec<ForecastRecord>> {
    let mut matched: Vec<ForecastRecord> = records
        .iter()
        .filter(|record| record.region == region)
        .cloned()
        .collect();

    if matched.is_empty() {
        return Err(ForecastError::NotFoundError {
            region: region.to_string(),
        });
    }

    matched.sort_by_key(|record| record.interval_start);
    Ok(matched)
}

/// 最接近現在的時段；同一開始時間取原本順序較前者
pub fn current(records: &[ForecastRecord]) -> Result<&ForecastRecord> {
    records
        .iter()
        .min_by_key(|record| record.interval_start)
        .ok_or(ForecastError::EmptyResultError)
}

/// 前 `k` 個時段，交給摘要使用；不足 `k` 筆時全部回傳
pub fn head(records: &[ForecastRecord], k: usize) -> Vec<ForecastRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|record| record.interval_start);
    sorted.truncate(k);
    sorted
}

/// 偏好的縣市存在就用它，否則取字典序第一個
pub fn default_region(regions: &BTreeSet<String>, preferred: Option<&str>) -> Result<String> {
    if let Some(preferred) = preferred {
        if regions.contains(preferred) {
            return Ok(preferred.to_string());
        }
        tracing::warn!("Preferred region {} not in forecast, falling back", preferred);
    }

    regions
        .iter()
        .next()
        .cloned()
        .ok_or_else(|| ForecastError::NotFoundError {
            region: preferred.unwrap_or_default().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalizer::parse_timestamp;

    fn record(region: &str, start: &str, condition: &str) -> ForecastRecord {
        let interval_start = parse_timestamp(start).unwrap();
        ForecastRecord {
            region: region.to_string(),
            interval_start,
            interval_end: interval_start + chrono::Duration::hours(12),
            condition: condition.to_string(),
            rain_probability: Some(20.0),
            min_temp: Some(20.0),
            max_temp: Some(26.0),
            approx_temp: Some(23.0),
        }
    }

    fn sample() -> Vec<ForecastRecord> {
        vec![
            record("臺北市", "2024-05-02 06:00:00", "晴"),
            record("高雄市", "2024-05-01 06:00:00", "多雲"),
            record("臺北市", "2024-05-01 06:00:00", "陰"),
            record("臺北市", "2024-05-01 18:00:00", "雨"),
            record("高雄市", "2024-05-01 18:00:00", "晴"),
        ]
    }

    #[test]
    fn test_regions_are_distinct_and_sorted() {
        let names: Vec<String> = regions(&sample()).into_iter().collect();

        assert_eq!(names, vec!["臺北市".to_string(), "高雄市".to_string()]);
    }

    #[test]
    fn test_for_region_sorts_by_start() {
        let taipei = for_region(&sample(), "臺北市").unwrap();

        let conditions: Vec<&str> = taipei.iter().map(|r| r.condition.as_str()).collect();
        assert_eq!(conditions, vec!["陰", "雨", "晴"]);
        assert!(taipei.windows(2).all(|w| w[0].interval_start <= w[1].interval_start));
    }

    #[test]
    fn test_for_region_is_stable_for_equal_starts() {
        let records = vec![
            record("臺中市", "2024-05-01 18:00:00", "second"),
            record("臺中市", "2024-05-01 06:00:00", "first-a"),
            record("臺中市", "2024-05-01 06:00:00", "first-b"),
        ];
        let sorted = for_region(&records, "臺中市").unwrap();

        let conditions: Vec<&str> = sorted.iter().map(|r| r.condition.as_str()).collect();
        assert_eq!(conditions, vec!["first-a", "first-b", "second"]);
    }

    #[test]
    fn test_for_region_unknown_is_not_found() {
        let result = for_region(&sample(), "花蓮縣");

        assert!(matches!(result, Err(ForecastError::NotFoundError { region }) if region == "花蓮縣"));
    }

    #[test]
    fn test_current_is_soonest_interval() {
        let records = sample();
        let taipei: Vec<ForecastRecord> = records.into_iter().filter(|r| r.region == "臺北市").collect();

        assert_eq!(current(&taipei).unwrap().condition, "陰");
    }

    #[test]
    fn test_current_of_empty_is_error() {
        assert!(matches!(current(&[]), Err(ForecastError::EmptyResultError)));
    }

    #[test]
    fn test_head_bounds_summary_window() {
        let taipei = for_region(&sample(), "臺北市").unwrap();

        assert_eq!(head(&taipei, 2).len(), 2);
        assert_eq!(head(&taipei, 2)[0].condition, "陰");
        assert_eq!(head(&taipei, 10).len(), 3);
        assert!(head(&taipei, 0).is_empty());
    }

    #[test]
    fn test_default_region_prefers_configured_name() {
        let names = regions(&sample());

        assert_eq!(default_region(&names, Some("高雄市")).unwrap(), "高雄市");
        assert_eq!(default_region(&names, Some("澎湖縣")).unwrap(), "臺北市");
        assert_eq!(default_region(&names, None).unwrap(), "臺北市");
        assert!(default_region(&BTreeSet::new(), Some("臺北市")).is_err());
    }
}
