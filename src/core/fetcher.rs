use crate::core::cache::{ForecastCache, SystemClock};
use crate::domain::model::RawForecastDocument;
use crate::domain::ports::{Clock, ConfigProvider};
use crate::utils::error::{ForecastError, Result, UpstreamFailure};
use reqwest::Client;
use std::sync::Arc;

/// 錯誤回應內容只保留開頭，避免日誌被整頁 HTML 灌爆
const ERROR_BODY_LIMIT: usize = 200;

pub struct ForecastFetcher<K: Clock = SystemClock> {
    client: Client,
    endpoint: String,
    api_key: String,
    cache: Arc<ForecastCache<K>>,
}

impl<K: Clock> ForecastFetcher<K> {
    pub fn new<C: ConfigProvider + ?Sized>(config: &C, cache: Arc<ForecastCache<K>>) -> Result<Self> {
        if config.accept_invalid_certs() {
            tracing::warn!("⚠️ TLS certificate validation is disabled for the forecast upstream");
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs())
            .build()
            .map_err(|e| ForecastError::ConfigError {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: config.api_endpoint().to_string(),
            api_key: config.api_key().to_string(),
            cache,
        })
    }

    pub fn cache(&self) -> &Arc<ForecastCache<K>> {
        &self.cache
    }

    /// 快取未過期時直接回傳，否則向上游抓取並寫入快取
    pub async fn fetch(&self) -> Result<Arc<RawForecastDocument>> {
        self.cache.get_or_refresh(|| self.request()).await
    }

    /// 強制向上游抓取；失敗時沿用仍有效的快取
    pub async fn refresh(&self) -> Result<Arc<RawForecastDocument>> {
        self.cache.force_refresh(|| self.request()).await
    }

    async fn request(&self) -> Result<RawForecastDocument> {
        tracing::debug!("Making API request to: {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("Authorization", self.api_key.as_str())])
            .send()
            .await
            .map_err(UpstreamFailure::Transport)?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        let body = response.bytes().await.map_err(UpstreamFailure::Transport)?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(UpstreamFailure::Status {
                status: status.as_u16(),
                body: text.chars().take(ERROR_BODY_LIMIT).collect(),
            }
            .into());
        }

        let document = RawForecastDocument::from_slice(&body).map_err(UpstreamFailure::MalformedBody)?;
        // 200 但沒有預報內容 (例如 success=false) 不能進快取
        if document.locations().is_none() {
            let text = String::from_utf8_lossy(&body);
            return Err(UpstreamFailure::UnexpectedShape {
                body: text.chars().take(ERROR_BODY_LIMIT).collect(),
            }
            .into());
        }
        tracing::info!("🌤️ Fetched forecast document ({} bytes)", body.len());
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::ManualClock;
    use httpmock::prelude::*;
    use std::time::Duration;

    struct MockConfig {
        api_endpoint: String,
        output_formats: Vec<String>,
    }

    impl MockConfig {
        fn new(api_endpoint: String) -> Self {
            Self {
                api_endpoint,
                output_formats: vec![],
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn api_endpoint(&self) -> &str {
            &self.api_endpoint
        }

        fn api_key(&self) -> &str {
            "CWA-TEST-KEY"
        }

        fn cache_ttl(&self) -> Duration {
            Duration::from_secs(900)
        }

        fn request_timeout(&self) -> Duration {
            Duration::from_secs(5)
        }

        fn accept_invalid_certs(&self) -> bool {
            false
        }

        fn preferred_region(&self) -> Option<&str> {
            None
        }

        fn summary_rows(&self) -> usize {
            3
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn output_formats(&self) -> &[String] {
            &self.output_formats
        }
    }

    fn body() -> serde_json::Value {
        serde_json::json!({ "success": "true", "records": { "location": [] } })
    }

    fn fetcher(server: &MockServer, clock: Arc<ManualClock>) -> ForecastFetcher<Arc<ManualClock>> {
        let config = MockConfig::new(server.url("/F-C0032-001"));
        let cache = Arc::new(ForecastCache::with_clock(config.cache_ttl(), clock));
        ForecastFetcher::new(&config, cache).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_api_key_as_query_parameter() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/F-C0032-001")
                .query_param("Authorization", "CWA-TEST-KEY");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(body());
        });

        let doc = fetcher(&server, Arc::new(ManualClock::new())).fetch().await.unwrap();

        api_mock.assert();
        assert_eq!(doc.as_value()["success"], "true");
    }

    #[tokio::test]
    async fn test_fetch_reuses_cache_until_ttl_expires() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/F-C0032-001");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(body());
        });

        let clock = Arc::new(ManualClock::new());
        let fetcher = fetcher(&server, Arc::clone(&clock));

        fetcher.fetch().await.unwrap();
        clock.advance(Duration::from_secs(600));
        fetcher.fetch().await.unwrap();
        api_mock.assert_hits(1);

        clock.advance(Duration::from_secs(301));
        fetcher.fetch().await.unwrap();
        api_mock.assert_hits(2);
    }

    #[tokio::test]
    async fn test_server_error_is_upstream_error_and_keeps_cache() {
        let server = MockServer::start();
        let mut ok_mock = server.mock(|when, then| {
            when.method(GET).path("/F-C0032-001");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(body());
        });

        let clock = Arc::new(ManualClock::new());
        let fetcher = fetcher(&server, Arc::clone(&clock));
        let first = fetcher.fetch().await.unwrap();
        let fetched_at = fetcher.cache().latest().await.unwrap().fetched_at;
        ok_mock.delete();

        let error_mock = server.mock(|when, then| {
            when.method(GET).path("/F-C0032-001");
            then.status(500).body("internal error");
        });
        clock.advance(Duration::from_secs(901));

        let result = fetcher.fetch().await;
        error_mock.assert();
        assert!(matches!(
            result,
            Err(ForecastError::UpstreamError(UpstreamFailure::Status { status: 500, .. }))
        ));

        let entry = fetcher.cache().latest().await.unwrap();
        assert_eq!(entry.fetched_at, fetched_at);
        assert_eq!(entry.document, first);
    }

    #[tokio::test]
    async fn test_refresh_falls_back_to_valid_cache() {
        let server = MockServer::start();
        let mut ok_mock = server.mock(|when, then| {
            when.method(GET).path("/F-C0032-001");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(body());
        });

        let fetcher = fetcher(&server, Arc::new(ManualClock::new()));
        let first = fetcher.fetch().await.unwrap();
        ok_mock.delete();

        let error_mock = server.mock(|when, then| {
            when.method(GET).path("/F-C0032-001");
            then.status(502);
        });

        let refreshed = fetcher.refresh().await.unwrap();
        error_mock.assert();
        assert_eq!(refreshed, first);
    }

    #[tokio::test]
    async fn test_malformed_body_is_upstream_error() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/F-C0032-001");
            then.status(200).body("<html>maintenance</html>");
        });

        let fetcher = fetcher(&server, Arc::new(ManualClock::new()));
        let result = fetcher.fetch().await;

        api_mock.assert();
        assert!(matches!(
            result,
            Err(ForecastError::UpstreamError(UpstreamFailure::MalformedBody(_)))
        ));
        assert!(fetcher.cache().latest().await.is_none());
    }

    #[tokio::test]
    async fn test_body_without_locations_is_rejected_and_not_cached() {
        let server = MockServer::start();
        let mut ok_mock = server.mock(|when, then| {
            when.method(GET).path("/F-C0032-001");
            then.status(200).json_body(body());
        });

        let clock = Arc::new(ManualClock::new());
        let fetcher = fetcher(&server, Arc::clone(&clock));
        let first = fetcher.fetch().await.unwrap();
        let fetched_at = fetcher.cache().latest().await.unwrap().fetched_at;
        ok_mock.delete();

        let mut quota_mock = server.mock(|when, then| {
            when.method(GET).path("/F-C0032-001");
            then.status(200)
                .json_body(serde_json::json!({ "success": "false", "message": "quota" }));
        });
        clock.advance(Duration::from_secs(901));

        let result = fetcher.fetch().await;
        quota_mock.assert();
        assert!(matches!(
            result,
            Err(ForecastError::UpstreamError(UpstreamFailure::UnexpectedShape { .. }))
        ));

        let entry = fetcher.cache().latest().await.unwrap();
        assert_eq!(entry.fetched_at, fetched_at);
        assert_eq!(entry.document, first);
        quota_mock.delete();

        // 上游恢復後下一次抓取要重新打網路
        let recovered_mock = server.mock(|when, then| {
            when.method(GET).path("/F-C0032-001");
            then.status(200).json_body(body());
        });
        fetcher.fetch().await.unwrap();
        recovered_mock.assert_hits(1);
        assert!(fetcher.cache().is_fresh().await);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        let config = MockConfig::new("http://127.0.0.1:9/F-C0032-001".to_string());
        let cache = Arc::new(ForecastCache::with_clock(
            config.cache_ttl(),
            ManualClock::new(),
        ));
        let fetcher = ForecastFetcher::new(&config, cache).unwrap();

        let result = fetcher.fetch().await;

        assert!(matches!(
            result,
            Err(ForecastError::UpstreamError(UpstreamFailure::Transport(_)))
        ));
    }
}
