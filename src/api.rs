//! Wire types for the forecasting backend's JSON payloads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::series::ModelSeries;

/// One entry of the model catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub model_type: String,
    #[serde(default)]
    pub trained_at: Option<String>,
    #[serde(default)]
    pub horizon: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub model_id: String,
    pub mae: f64,
    pub rmse: f64,
    #[serde(default)]
    pub mape: Option<f64>,
    #[serde(default)]
    pub r2: Option<f64>,
}

/// Interpretation payloads come in two shapes depending on the model family:
/// a plain feature-importance table, or SHAP summaries. The backend does not
/// tag them, so this is an untagged variant with explicit capability checks
/// instead of ad hoc key probing at call sites.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Explanation {
    FeatureImportance {
        #[serde(rename = "featureImportance")]
        feature_importance: BTreeMap<String, f64>,
    },
    Shap {
        #[serde(rename = "shapValues")]
        shap_values: BTreeMap<String, f64>,
        #[serde(rename = "baseValue", default)]
        base_value: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretationReport {
    pub model_id: String,
    #[serde(flatten)]
    pub explanation: Explanation,
}

impl InterpretationReport {
    pub fn has_feature_importance(&self) -> bool {
        matches!(self.explanation, Explanation::FeatureImportance { .. })
    }

    pub fn has_shap_values(&self) -> bool {
        matches!(self.explanation, Explanation::Shap { .. })
    }
}

/// Per-model sparse forecast: opaque date-key → value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSeries {
    pub model_id: String,
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

impl ForecastSeries {
    pub fn into_model_series(self) -> ModelSeries {
        ModelSeries { id: self.model_id, values: self.values }
    }
}

/// Observed values behind the forecasts, for overlay charts.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalData {
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub series: Vec<ForecastSeries>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    pub model_ids: Vec<String>,
    pub horizon: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    pub model_id: String,
    pub horizon: u32,
    #[serde(default)]
    pub scenario: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub model_id: String,
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub model_ids: Vec<String>,
    pub metric: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub metric: String,
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_info_wire_shape() {
        let m: ModelInfo = serde_json::from_value(json!({
            "id": "m1",
            "name": "Gradient Boost v2",
            "modelType": "gbm",
            "trainedAt": "2026-08-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(m.model_type, "gbm");
        assert_eq!(m.horizon, None);
    }

    #[test]
    fn test_interpretation_feature_importance_variant() {
        let r: InterpretationReport = serde_json::from_value(json!({
            "modelId": "m1",
            "featureImportance": {"lag_7": 0.4, "temp": 0.2}
        }))
        .unwrap();
        assert!(r.has_feature_importance());
        assert!(!r.has_shap_values());
    }

    #[test]
    fn test_interpretation_shap_variant() {
        let r: InterpretationReport = serde_json::from_value(json!({
            "modelId": "m2",
            "shapValues": {"lag_7": 0.12},
            "baseValue": 3.5
        }))
        .unwrap();
        assert!(r.has_shap_values());
        match r.explanation {
            Explanation::Shap { base_value, .. } => assert_eq!(base_value, 3.5),
            _ => panic!("expected shap variant"),
        }
    }

    #[test]
    fn test_forecast_series_to_model_series() {
        let f: ForecastSeries = serde_json::from_value(json!({
            "modelId": "m1",
            "values": {"2010-01-01": 1.5}
        }))
        .unwrap();
        let s = f.into_model_series();
        assert_eq!(s.id, "m1");
        assert_eq!(s.values.get("2010-01-01"), Some(&1.5));
    }
}
