/// Runtime configuration for the data layer, sourced from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    pub http_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
    pub retry_jitter: f64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("API_BASE").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string()),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            max_retries: std::env::var("MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(3),
            retry_base_ms: std::env::var("RETRY_BASE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(1000),
            retry_max_ms: std::env::var("RETRY_MAX_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(30_000),
            retry_jitter: std::env::var("RETRY_JITTER").ok().and_then(|v| v.parse().ok()).unwrap_or(0.0),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8000".to_string(),
            http_timeout_secs: 30,
            max_retries: 3,
            retry_base_ms: 1000,
            retry_max_ms: 30_000,
            retry_jitter: 0.0,
        }
    }
}
