//! Model catalog ingestion.
//!
//! The raw `/api/models` payload is filtered exactly once here, before the
//! list is cached or exposed: legacy ensemble wrappers predate per-model
//! evaluation output and none of the per-model views can chart them.

use serde_json::Value;

use crate::api::ModelInfo;
use crate::logging::{self, obj, v_num, Domain, Level};

pub const INCOMPATIBLE_MODEL_KIND: &str = "legacy_ensemble";

/// Deserialize and filter the catalog payload. Pure post-processing: the
/// cache stores the already-filtered list.
pub fn ingest(body: Value) -> Result<Vec<ModelInfo>, String> {
    let models: Vec<ModelInfo> = serde_json::from_value(body)
        .map_err(|e| format!("model catalog payload malformed: {}", e))?;

    let total = models.len();
    let kept: Vec<ModelInfo> = models
        .into_iter()
        .filter(|m| m.model_type != INCOMPATIBLE_MODEL_KIND)
        .collect();

    if kept.len() != total {
        logging::log(
            Level::Info,
            Domain::Catalog,
            "filtered_incompatible",
            obj(&[
                ("total", v_num(total as f64)),
                ("kept", v_num(kept.len() as f64)),
            ]),
        );
    }

    Ok(kept)
}
