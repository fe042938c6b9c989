//! forecastfx: data-fetch and cache coordination layer for a forecasting
//! dashboard.
//!
//! Three components, composed bottom-up:
//! - [`transport`]: one HTTP client with retry-with-backoff for transient
//!   failures (network errors and 5xx; 4xx is terminal).
//! - [`cache`]: a session-scoped store keyed by `(resource kind, entity
//!   key)` that serves Ready hits without re-fetching and attaches
//!   concurrent callers to the in-flight fetch.
//! - [`series`]: pure outer-join alignment of sparse per-model forecast
//!   series, plus color-scale derivation for the heatmap view.
//!
//! [`gateway::ForecastGateway`] wires the first two together and exposes one
//! typed operation per backend resource.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod series;
pub mod transport;
