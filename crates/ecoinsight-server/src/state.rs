use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::Mutex;

use ecoinsight_cache::ResultCache;
use ecoinsight_core::config::Config;
use ecoinsight_pg::{DocStore, SeriesStore};

/// Upstream calls are bounded so a stalled weather API cannot pin a
/// handler past this window.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(8);

/// Live proxy routes use their own 60-second window, independent of the
/// global limiter, to protect upstream API quota.
const LIVE_WINDOW: Duration = Duration::from_secs(60);

/// Per-key sliding-window rate limiter.
///
/// Key: client IP string. Value: deque of request timestamps within the
/// window. The window slides on every check.
pub struct SlidingWindow {
    window: Duration,
    max: usize,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindow {
    pub fn new(window: Duration, max: usize) -> Self {
        Self {
            window,
            max,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if the request should proceed, `false` if it should
    /// be rejected with 429.
    pub async fn check(&self, key: &str) -> bool {
        let mut map = self.hits.lock().await;
        let window = map.entry(key.to_string()).or_default();
        let cutoff = Instant::now() - self.window;
        while window.front().is_some_and(|t| *t < cutoff) {
            window.pop_front();
        }
        if window.len() >= self.max {
            return false;
        }
        window.push_back(Instant::now());
        true
    }
}

/// Shared application state injected into every handler via
/// [`axum::extract::State`].
///
/// One instance per process, constructed at startup; all connection
/// handles live here rather than in globals.
pub struct AppState {
    pub docs: DocStore,
    pub series: SeriesStore,
    pub cache: ResultCache,
    /// Shared HTTP client for the external data adapters.
    pub http: reqwest::Client,
    pub config: Arc<Config>,
    global_limiter: SlidingWindow,
    live_limiter: SlidingWindow,
}

impl AppState {
    pub fn new(
        docs: DocStore,
        series: SeriesStore,
        cache: ResultCache,
        config: Config,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;
        let global_limiter = SlidingWindow::new(
            Duration::from_secs(config.rate_limit_window_secs),
            config.rate_limit_max,
        );
        let live_limiter = SlidingWindow::new(LIVE_WINDOW, config.live_rate_limit_max);
        Ok(Self {
            docs,
            series,
            cache,
            http,
            config: Arc::new(config),
            global_limiter,
            live_limiter,
        })
    }

    pub async fn check_rate_limit(&self, ip: &str) -> bool {
        if self.config.rate_limit_disable {
            return true;
        }
        self.global_limiter.check(ip).await
    }

    pub async fn check_live_rate_limit(&self, ip: &str) -> bool {
        if self.config.rate_limit_disable {
            return true;
        }
        self.live_limiter.check(ip).await
    }
}
