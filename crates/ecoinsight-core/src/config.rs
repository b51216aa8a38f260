#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Postgres URI for the document store (climate/ESG/users).
    pub docstore_uri: String,
    /// Postgres/TimescaleDB URI for the raw time-series store.
    pub timeseries_uri: String,
    pub redis_uri: String,
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    pub rate_limit_window_secs: u64,
    pub rate_limit_max: usize,
    /// Separate budget for the live weather/air-quality proxy routes,
    /// protecting upstream API quota independently of the global limiter.
    pub live_rate_limit_max: usize,
    pub openweather_api_key: Option<String>,
    /// Opt-in destructive recreate of the time-series table at startup.
    /// Never inferred from an environment name.
    pub timeseries_reset: bool,
    pub doc_pool_max: u32,
    pub series_pool_max: u32,
    pub rate_limit_disable: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("ECOINSIGHT_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            docstore_uri: std::env::var("DOCSTORE_URI")
                .unwrap_or_else(|_| "postgres://localhost:5432/ecoinsight".to_string()),
            timeseries_uri: std::env::var("TIMESCALEDB_URI")
                .unwrap_or_else(|_| "postgres://localhost:5432/ecoinsight_timeseries".to_string()),
            redis_uri: std::env::var("REDIS_URI")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            jwt_secret: std::env::var("JWT_SECRET")
                .map_err(|_| "JWT_SECRET is required".to_string())?,
            cors_origins: std::env::var("ECOINSIGHT_CORS_ORIGINS")
                .map(|v| v.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            rate_limit_window_secs: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .unwrap_or(900),
            rate_limit_max: std::env::var("RATE_LIMIT_MAX")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),
            live_rate_limit_max: std::env::var("LIVE_RATE_LIMIT_MAX")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            openweather_api_key: std::env::var("OPENWEATHER_API_KEY").ok(),
            timeseries_reset: std::env::var("ECOINSIGHT_TIMESERIES_RESET")
                .map(|v| v == "true")
                .unwrap_or(false),
            doc_pool_max: std::env::var("DOCSTORE_POOL_MAX")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            series_pool_max: std::env::var("TIMESCALEDB_POOL_MAX")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .unwrap_or(20),
            rate_limit_disable: std::env::var("ECOINSIGHT_RATE_LIMIT_DISABLE")
                .map(|v| v == "true")
                .unwrap_or(false),
        })
    }
}
