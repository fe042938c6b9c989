//! Resilient HTTP transport for the forecasting backend.
//!
//! One client, one base endpoint, a fixed per-attempt timeout, and
//! retry-with-backoff for transient failures. The raw exchange sits behind
//! the [`HttpExchange`] trait so the retry loop can be tested against
//! scripted responses.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::time::{sleep, Duration};
use url::Url;

use crate::config::Config;
use crate::error::{classify_status, TransportError};
use crate::logging;

pub mod retry;

pub use retry::RetryPolicy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One logical request. `retry_count` belongs to this request alone and is
/// only ever incremented inside its own retry loop.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub retry_count: u32,
}

impl RequestDescriptor {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retry_count: 0,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
            retry_count: 0,
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// A received HTTP response, any status.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

/// The raw exchange: returns `Ok` for any response that arrived (whatever
/// the status) and `Err(Network)` only when none did.
#[async_trait]
pub trait HttpExchange: Send + Sync {
    async fn execute(&self, req: &RequestDescriptor) -> Result<ApiResponse, TransportError>;
}

/// Production exchange over reqwest.
pub struct ReqwestExchange {
    client: Client,
    base: Url,
}

impl ReqwestExchange {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        let base = Url::parse(&cfg.api_base)?;
        Ok(Self { client, base })
    }

    fn build_url(&self, req: &RequestDescriptor) -> Result<Url, TransportError> {
        let mut url = self.base.join(&req.path).map_err(|e| TransportError::Network {
            message: format!("invalid url {}: {}", req.path, e),
        })?;
        if !req.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(req.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }
}

#[async_trait]
impl HttpExchange for ReqwestExchange {
    async fn execute(&self, req: &RequestDescriptor) -> Result<ApiResponse, TransportError> {
        let url = self.build_url(req)?;

        let builder = match req.method {
            Method::Get => self.client.get(url),
            Method::Post => {
                let mut b = self.client.post(url);
                if let Some(body) = &req.body {
                    b = b.json(body);
                }
                b
            }
        };

        // Timeout and connection failures land here: no response received.
        let resp = builder.send().await.map_err(|e| TransportError::Network {
            message: e.to_string(),
        })?;

        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(|e| TransportError::Network {
            message: format!("read body failed: {}", e),
        })?;

        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(ApiResponse { status, body })
    }
}

/// Server error bodies look like `{"error": "..."}`; fall back to the raw
/// body when the shape differs.
fn error_message(body: &Value) -> String {
    body.get("error")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| body.to_string())
}

/// HTTP client with the retry loop. 2xx/3xx resolves, 4xx rejects
/// immediately, 5xx and network failures retry with exponential backoff
/// until the policy is exhausted, then the last failure surfaces unchanged.
pub struct ApiClient {
    exchange: Box<dyn HttpExchange>,
    policy: RetryPolicy,
}

impl ApiClient {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            exchange: Box::new(ReqwestExchange::new(cfg)?),
            policy: RetryPolicy::from_config(cfg),
        })
    }

    pub fn with_exchange(exchange: Box<dyn HttpExchange>, policy: RetryPolicy) -> Self {
        Self { exchange, policy }
    }

    pub async fn send(&self, mut desc: RequestDescriptor) -> Result<ApiResponse, TransportError> {
        loop {
            let err = match self.exchange.execute(&desc).await {
                Ok(resp) if (200..400).contains(&resp.status) => return Ok(resp),
                Ok(resp) => classify_status(resp.status, error_message(&resp.body)),
                Err(e) => e,
            };

            if !err.is_retryable() || desc.retry_count >= self.policy.max_retries {
                return Err(err);
            }

            let delay = self.policy.delay_for_attempt(desc.retry_count);
            logging::log_retry(
                &desc.path,
                desc.retry_count + 1,
                self.policy.max_retries,
                delay.as_millis() as u64,
                &err.to_string(),
            );
            sleep(delay).await;
            desc.retry_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Plays back a fixed script of outcomes, counting attempts. Once the
    /// script runs out the last outcome repeats.
    struct ScriptedExchange {
        script: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
        attempts: AtomicU32,
    }

    impl ScriptedExchange {
        fn new(script: Vec<Result<ApiResponse, TransportError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                attempts: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl HttpExchange for ScriptedExchange {
        async fn execute(&self, _req: &RequestDescriptor) -> Result<ApiResponse, TransportError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 10,
            jitter_factor: 0.0,
        }
    }

    fn ok(status: u16) -> Result<ApiResponse, TransportError> {
        Ok(ApiResponse { status, body: json!({"ok": true}) })
    }

    #[tokio::test]
    async fn test_success_single_attempt() {
        let exchange = std::sync::Arc::new(ScriptedExchange::new(vec![ok(200)]));
        let client = ApiClient::with_exchange(Box::new(SharedExchange(exchange.clone())), fast_policy());
        let resp = client.send(RequestDescriptor::get("/api/models")).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(exchange.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_persistent_5xx_four_attempts() {
        let exchange = std::sync::Arc::new(ScriptedExchange::new(vec![Ok(ApiResponse {
            status: 503,
            body: json!({"error": "overloaded"}),
        })]));
        let client = ApiClient::with_exchange(Box::new(SharedExchange(exchange.clone())), fast_policy());

        let err = client.send(RequestDescriptor::get("/api/models")).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(exchange.attempts.load(Ordering::SeqCst), 4); // 1 initial + 3 retries
    }

    #[tokio::test]
    async fn test_4xx_no_retry() {
        let exchange = std::sync::Arc::new(ScriptedExchange::new(vec![Ok(ApiResponse {
            status: 404,
            body: json!({"error": "unknown model"}),
        })]));
        let client = ApiClient::with_exchange(Box::new(SharedExchange(exchange.clone())), fast_policy());

        let err = client.send(RequestDescriptor::get("/api/evaluation/nope")).await.unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("unknown model"));
        assert_eq!(exchange.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_network_failure_then_success() {
        let exchange = std::sync::Arc::new(ScriptedExchange::new(vec![
            Err(TransportError::Network { message: "connection reset".into() }),
            ok(200),
        ]));
        let client = ApiClient::with_exchange(Box::new(SharedExchange(exchange.clone())), fast_policy());

        let resp = client.send(RequestDescriptor::get("/api/historical")).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(exchange.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_3xx_is_terminal_success() {
        let exchange = std::sync::Arc::new(ScriptedExchange::new(vec![ok(304)]));
        let client = ApiClient::with_exchange(Box::new(SharedExchange(exchange.clone())), fast_policy());

        let resp = client.send(RequestDescriptor::get("/api/models")).await.unwrap();
        assert_eq!(resp.status, 304);
        assert_eq!(exchange.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_count_not_shared_across_requests() {
        let exchange = std::sync::Arc::new(ScriptedExchange::new(vec![Ok(ApiResponse {
            status: 500,
            body: json!({"error": "boom"}),
        })]));
        let client = ApiClient::with_exchange(Box::new(SharedExchange(exchange.clone())), fast_policy());

        let _ = client.send(RequestDescriptor::get("/api/peaks")).await;
        assert_eq!(exchange.attempts.load(Ordering::SeqCst), 4);

        // A second logical request starts its own loop from zero.
        let _ = client.send(RequestDescriptor::get("/api/peaks")).await;
        assert_eq!(exchange.attempts.load(Ordering::SeqCst), 8);
    }

    struct SharedExchange(std::sync::Arc<ScriptedExchange>);

    #[async_trait]
    impl HttpExchange for SharedExchange {
        async fn execute(&self, req: &RequestDescriptor) -> Result<ApiResponse, TransportError> {
            self.0.execute(req).await
        }
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(&json!({"error": "bad input"})), "bad input");
        assert_eq!(error_message(&json!("plain text")), "\"plain text\"");
    }
}
