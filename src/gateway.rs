//! Composition of transport and cache: one typed operation per resource
//! kind, each fetched at most once per session per key.
//!
//! GET kinds key by entity id (or `"all"` for singleton resources); POST
//! kinds key by a SHA-256 fingerprint of the canonical request body, so two
//! panels asking the same question share one answer. Raw transport errors
//! are logged here and replaced by display-ready strings on the cache entry;
//! one kind's failure never disturbs another.

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::api::{
    ComparisonResult, CompareRequest, EvaluationReport, HistoricalData, InterpretationReport,
    ModelInfo, PredictRequest, PredictionResponse, SimulateRequest, SimulationResult,
};
use crate::cache::{CacheEntry, CacheStore, ResourceKind};
use crate::catalog;
use crate::config::Config;
use crate::error::TransportError;
use crate::logging;
use crate::series::ModelSeries;
use crate::transport::{ApiClient, RequestDescriptor};

/// Fixed key for resources that exist once per backend, not per model.
const SINGLETON_KEY: &str = "all";

pub struct ForecastGateway {
    client: Arc<ApiClient>,
    store: CacheStore,
}

impl ForecastGateway {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self::with_client(ApiClient::new(cfg)?))
    }

    pub fn with_client(client: ApiClient) -> Self {
        Self { client: Arc::new(client), store: CacheStore::new() }
    }

    /// `{value, isLoading, error}` snapshot for a consumer panel.
    pub fn peek(&self, kind: ResourceKind, key: &str) -> CacheEntry {
        self.store.peek(kind, key).unwrap_or_else(CacheEntry::idle)
    }

    pub fn clear(&self, kind: ResourceKind, key: Option<&str>) {
        self.store.clear(kind, key);
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    // -------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------

    /// Eager per-session catalog fetch; call once at startup.
    pub async fn warm_catalog(&self) -> Result<Vec<ModelInfo>> {
        self.models().await
    }

    /// The model list, filtered at ingestion (see `catalog::ingest`); the
    /// cache holds the already-filtered list.
    pub async fn models(&self) -> Result<Vec<ModelInfo>> {
        let client = self.client.clone();
        let fut = async move {
            match client.send(RequestDescriptor::get("/api/models")).await {
                Ok(resp) => {
                    let kept = catalog::ingest(resp.body)?;
                    serde_json::to_value(kept)
                        .map_err(|e| format!("model catalog re-encode failed: {}", e))
                }
                Err(err) => {
                    logging::log_fetch_failed("models", SINGLETON_KEY, &err.to_string());
                    Err(display_error("models", SINGLETON_KEY, &err))
                }
            }
        };
        let value = self
            .store
            .get_or_fetch(ResourceKind::Models, SINGLETON_KEY, fut)
            .await
            .map_err(|msg| anyhow!(msg))?;
        decode(value, "model catalog")
    }

    // -------------------------------------------------------------------
    // Per-model GET resources
    // -------------------------------------------------------------------

    pub async fn evaluation(&self, model_id: &str) -> Result<EvaluationReport> {
        let desc = RequestDescriptor::get(format!("/api/evaluation/{}", model_id));
        let value = self.fetch_cached(ResourceKind::Evaluation, model_id, desc).await?;
        decode(value, "evaluation")
    }

    pub async fn interpretation(&self, model_id: &str) -> Result<InterpretationReport> {
        let desc = RequestDescriptor::get(format!("/api/interpret/{}", model_id));
        let value = self.fetch_cached(ResourceKind::Interpretation, model_id, desc).await?;
        decode(value, "interpretation")
    }

    /// Feature manifest: the input columns a model was trained on.
    pub async fn features(&self, model_id: &str) -> Result<Vec<String>> {
        let desc = RequestDescriptor::get(format!("/api/features/{}", model_id));
        let value = self.fetch_cached(ResourceKind::Features, model_id, desc).await?;
        decode(value, "feature manifest")
    }

    // -------------------------------------------------------------------
    // Singleton GET resources
    // -------------------------------------------------------------------

    pub async fn historical(&self) -> Result<HistoricalData> {
        let desc = RequestDescriptor::get("/api/historical");
        let value = self.fetch_cached(ResourceKind::Historical, SINGLETON_KEY, desc).await?;
        decode(value, "historical data")
    }

    /// Chart-shaped payloads pass through untyped; only the cache layer
    /// cares about them here.
    pub async fn patterns(&self) -> Result<Value> {
        let desc = RequestDescriptor::get("/api/patterns");
        self.fetch_cached(ResourceKind::Patterns, SINGLETON_KEY, desc).await
    }

    pub async fn peaks(&self) -> Result<Value> {
        let desc = RequestDescriptor::get("/api/peaks");
        self.fetch_cached(ResourceKind::Peaks, SINGLETON_KEY, desc).await
    }

    pub async fn decomposition(&self) -> Result<Value> {
        let desc = RequestDescriptor::get("/api/decomposition");
        self.fetch_cached(ResourceKind::Decomposition, SINGLETON_KEY, desc).await
    }

    // -------------------------------------------------------------------
    // POST resources, keyed by request fingerprint
    // -------------------------------------------------------------------

    pub async fn predict(&self, req: &PredictRequest) -> Result<PredictionResponse> {
        let body = serde_json::to_value(req)?;
        let key = fingerprint(&body);
        let desc = RequestDescriptor::post("/api/predict", body);
        let value = self.fetch_cached(ResourceKind::Prediction, &key, desc).await?;
        decode(value, "prediction")
    }

    pub async fn simulate(&self, req: &SimulateRequest) -> Result<SimulationResult> {
        let body = serde_json::to_value(req)?;
        let key = fingerprint(&body);
        let desc = RequestDescriptor::post("/api/simulate", body);
        let value = self.fetch_cached(ResourceKind::Simulation, &key, desc).await?;
        decode(value, "simulation")
    }

    pub async fn compare(&self, req: &CompareRequest) -> Result<ComparisonResult> {
        let body = serde_json::to_value(req)?;
        let key = fingerprint(&body);
        let desc = RequestDescriptor::post("/api/compare", body);
        let value = self.fetch_cached(ResourceKind::Comparison, &key, desc).await?;
        decode(value, "comparison")
    }

    /// Forecast series ready for the aligner.
    pub async fn prediction_series(&self, req: &PredictRequest) -> Result<Vec<ModelSeries>> {
        let resp = self.predict(req).await?;
        Ok(resp.series.into_iter().map(|s| s.into_model_series()).collect())
    }

    // -------------------------------------------------------------------

    async fn fetch_cached(
        &self,
        kind: ResourceKind,
        key: &str,
        desc: RequestDescriptor,
    ) -> Result<Value> {
        let client = self.client.clone();
        let kind_label = kind.as_str();
        let key_owned = key.to_string();
        let fut = async move {
            match client.send(desc).await {
                Ok(resp) => Ok(resp.body),
                Err(err) => {
                    logging::log_fetch_failed(kind_label, &key_owned, &err.to_string());
                    Err(display_error(kind_label, &key_owned, &err))
                }
            }
        };
        self.store
            .get_or_fetch(kind, key, fut)
            .await
            .map_err(|msg| anyhow!(msg))
    }
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| anyhow!("{} payload malformed: {}", what, e))
}

/// Bounded, kind-specific message for the cache entry. Client errors carry
/// the server-provided message; everything else gets a generic retry hint.
fn display_error(kind: &str, key: &str, err: &TransportError) -> String {
    let subject = if key == SINGLETON_KEY {
        kind.to_string()
    } else {
        format!("{} for {}", kind, key)
    };
    match err {
        TransportError::Client { message, .. } if !message.is_empty() => {
            format!("{}: {}", subject, message)
        }
        _ => format!("{} is currently unavailable, please retry", subject),
    }
}

/// Canonical body hash: serde_json orders object keys, so semantically
/// identical requests collapse to one cache key.
fn fingerprint(body: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
