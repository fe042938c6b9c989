//! Session-scoped entity cache shared by every dashboard panel.
//!
//! Each `(resource kind, entity key)` pair owns at most one slot. A Ready
//! slot is immutable for the rest of the session; a Failed slot may be
//! retried from scratch; a Loading slot holds the in-flight future itself,
//! so concurrent callers for the same key attach to it instead of issuing a
//! second network call. Kinds are fully isolated from one another.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use crate::logging;

/// A category of fetched entity, one per backend endpoint family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Models,
    Evaluation,
    Interpretation,
    Features,
    Prediction,
    Simulation,
    Comparison,
    Historical,
    Patterns,
    Peaks,
    Decomposition,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Models => "models",
            ResourceKind::Evaluation => "evaluation",
            ResourceKind::Interpretation => "interpretation",
            ResourceKind::Features => "features",
            ResourceKind::Prediction => "prediction",
            ResourceKind::Simulation => "simulation",
            ResourceKind::Comparison => "comparison",
            ResourceKind::Historical => "historical",
            ResourceKind::Patterns => "patterns",
            ResourceKind::Peaks => "peaks",
            ResourceKind::Decomposition => "decomposition",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    kind: ResourceKind,
    key: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Snapshot of a slot as consumers see it: `{value, isLoading, error}`.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub status: FetchStatus,
    pub value: Option<Value>,
    pub error: Option<String>,
}

impl CacheEntry {
    pub fn idle() -> Self {
        Self { status: FetchStatus::Idle, value: None, error: None }
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn is_ready(&self) -> bool {
        self.status == FetchStatus::Ready
    }
}

/// Display-ready error on failure; raw errors are logged where the fetch
/// future is built.
pub type FetchResult = Result<Value, String>;

type InFlight = Shared<BoxFuture<'static, FetchResult>>;

enum Slot {
    Loading(InFlight),
    Ready(Value),
    Failed(String),
}

/// The shared store. Created at session start, dropped at teardown; nothing
/// persists across sessions.
pub struct CacheStore {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }

    /// Serve a Ready hit, attach to an in-flight fetch, or start a new one.
    ///
    /// The fetcher future is dropped unpolled on a hit or attach, so exactly
    /// one underlying call runs per key however many callers pile on.
    pub async fn get_or_fetch<F>(&self, kind: ResourceKind, key: &str, fetcher: F) -> FetchResult
    where
        F: Future<Output = FetchResult> + Send + 'static,
    {
        let cache_key = CacheKey { kind, key: key.to_string() };

        let flight: InFlight = {
            let mut slots = self
                .slots
                .lock()
                .map_err(|_| "cache lock poisoned".to_string())?;
            match slots.get(&cache_key) {
                Some(Slot::Ready(value)) => {
                    logging::log_cache_event("hit", kind.as_str(), key);
                    return Ok(value.clone());
                }
                Some(Slot::Loading(flight)) => {
                    logging::log_cache_event("attach", kind.as_str(), key);
                    flight.clone()
                }
                Some(Slot::Failed(_)) | None => {
                    // Failed entries retry from scratch; Ready ones never do.
                    logging::log_cache_event("fetch", kind.as_str(), key);
                    let flight: InFlight = fetcher.boxed().shared();
                    slots.insert(cache_key.clone(), Slot::Loading(flight.clone()));
                    flight
                }
            }
        };

        let result = flight.clone().await;

        {
            let mut slots = self
                .slots
                .lock()
                .map_err(|_| "cache lock poisoned".to_string())?;
            // Commit only if our fetch still owns the slot. A clear() during
            // flight (followed by a fresh fetch) must not be clobbered by
            // this stale completion.
            if let Some(Slot::Loading(current)) = slots.get(&cache_key) {
                if current.ptr_eq(&flight) {
                    let slot = match &result {
                        Ok(value) => Slot::Ready(value.clone()),
                        Err(message) => Slot::Failed(message.clone()),
                    };
                    slots.insert(cache_key, slot);
                }
            }
        }

        result
    }

    /// Non-blocking snapshot of one entry.
    pub fn peek(&self, kind: ResourceKind, key: &str) -> Option<CacheEntry> {
        let slots = self.slots.lock().ok()?;
        let cache_key = CacheKey { kind, key: key.to_string() };
        slots.get(&cache_key).map(|slot| match slot {
            Slot::Loading(_) => CacheEntry {
                status: FetchStatus::Loading,
                value: None,
                error: None,
            },
            Slot::Ready(value) => CacheEntry {
                status: FetchStatus::Ready,
                value: Some(value.clone()),
                error: None,
            },
            Slot::Failed(message) => CacheEntry {
                status: FetchStatus::Failed,
                value: None,
                error: Some(message.clone()),
            },
        })
    }

    /// Drop one entry, or every entry of a kind when `key` is `None`.
    /// Other kinds are untouched.
    pub fn clear(&self, kind: ResourceKind, key: Option<&str>) {
        if let Ok(mut slots) = self.slots.lock() {
            match key {
                Some(key) => {
                    let cache_key = CacheKey { kind, key: key.to_string() };
                    slots.remove(&cache_key);
                    logging::log_cache_event("clear", kind.as_str(), key);
                }
                None => {
                    slots.retain(|k, _| k.kind != kind);
                    logging::log_cache_event("clear_kind", kind.as_str(), "*");
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
