use crate::domain::model::RawForecastDocument;
use crate::domain::ports::Clock;
use crate::utils::error::Result;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// 可手動推進的時鐘
#[derive(Debug)]
pub struct ManualClock {
    now: StdMutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: StdMutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub document: Arc<RawForecastDocument>,
    pub fetched_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) <= ttl
    }
}

/// 行程共用的單筆預報快取
///
/// 檢查過期、讀取、刷新寫入都在同一把鎖內完成，網路請求期間也持有鎖，
/// 所以同時進來的請求只會觸發一次抓取。失敗的抓取不會動到既有項目。
pub struct ForecastCache<K: Clock = SystemClock> {
    ttl: Duration,
    clock: K,
    slot: Mutex<Option<CacheEntry>>,
}

impl ForecastCache<SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<K: Clock> ForecastCache<K> {
    pub fn with_clock(ttl: Duration, clock: K) -> Self {
        Self {
            ttl,
            clock,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 未過期就直接回傳快取，否則呼叫 `refresh` 並覆寫
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<Arc<RawForecastDocument>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RawForecastDocument>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(entry) = slot.as_ref() {
            if entry.is_fresh(self.clock.now(), self.ttl) {
                tracing::debug!("Forecast cache hit");
                return Ok(Arc::clone(&entry.document));
            }
            tracing::debug!("Forecast cache entry expired");
        } else {
            tracing::debug!("Forecast cache empty");
        }

        let document = Arc::new(refresh().await?);
        *slot = Some(CacheEntry {
            document: Arc::clone(&document),
            fetched_at: self.clock.now(),
        });
        Ok(document)
    }

    /// 無視 TTL 強制刷新；失敗時若仍有未過期的項目就沿用它
    pub async fn force_refresh<F, Fut>(&self, refresh: F) -> Result<Arc<RawForecastDocument>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<RawForecastDocument>>,
    {
        let mut slot = self.slot.lock().await;

        match refresh().await {
            Ok(document) => {
                let document = Arc::new(document);
                *slot = Some(CacheEntry {
                    document: Arc::clone(&document),
                    fetched_at: self.clock.now(),
                });
                Ok(document)
            }
            Err(e) => match slot.as_ref() {
                Some(entry) if entry.is_fresh(self.clock.now(), self.ttl) => {
                    tracing::warn!("⚠️ Refresh failed, serving cached forecast: {}", e);
                    Ok(Arc::clone(&entry.document))
                }
                _ => Err(e),
            },
        }
    }

    /// 最近一次成功抓取的項目，不論是否過期
    pub async fn latest(&self) -> Option<CacheEntry> {
        self.slot.lock().await.clone()
    }

    pub async fn is_fresh(&self) -> bool {
        self.slot
            .lock()
            .await
            .as_ref()
            .map(|entry| entry.is_fresh(self.clock.now(), self.ttl))
            .unwrap_or(false)
    }

    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}
