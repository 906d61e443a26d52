// crates/cardio-core/src/schema.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PredictError;

/// 已知的模型种类。选择器字符串只在边界处解析一次，之后都走枚举。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    /// Hand-written logistic regression, trained on min-max scaled inputs.
    #[serde(rename = "custom")]
    Custom,
    #[serde(rename = "rf")]
    RandomForest,
    #[serde(rename = "xgboost")]
    XgBoost,
}

/// 特征准备方式：custom 模型用归一化数据训练，树模型用原始数据训练。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preparation {
    Scaled,
    Raw,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Custom, ModelKind::RandomForest, ModelKind::XgBoost];

    pub fn key(self) -> &'static str {
        match self {
            ModelKind::Custom => "custom",
            ModelKind::RandomForest => "rf",
            ModelKind::XgBoost => "xgboost",
        }
    }

    pub fn preparation(self) -> Preparation {
        match self {
            ModelKind::Custom => Preparation::Scaled,
            ModelKind::RandomForest | ModelKind::XgBoost => Preparation::Raw,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

impl FromStr for ModelKind {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .ok_or_else(|| PredictError::UnknownModel(s.to_string()))
    }
}

/// The eleven raw inputs collected by the diagnose form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// years
    pub age: f64,
    pub gender: f64,
    /// cm
    pub height: f64,
    /// kg
    pub weight: f64,
    /// systolic
    pub ap_hi: f64,
    /// diastolic
    pub ap_lo: f64,
    pub cholesterol: f64,
    pub gluc: f64,
    pub smoke: f64,
    pub alco: f64,
    pub active: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(flatten)]
    pub patient: PatientRecord,

    /// 可选：缺省时使用配置里的 default_model
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: u8,
    /// "73.45%" 或 "N/A"
    pub probability: String,
    pub model_used: ModelKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionRow {
    pub name: String,
    #[serde(rename = "Predicted Healthy")]
    pub predicted_healthy: u32,
    #[serde(rename = "Predicted Disease")]
    pub predicted_disease: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsResponse {
    pub feature_importance: Vec<FeatureImportance>,
    pub metrics: EvalMetrics,
    pub confusion_matrix: Vec<ConfusionRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub desc: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    pub desc: String,
    pub accuracy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub columns: Vec<ColumnInfo>,
    pub models: Vec<ModelSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub models: Vec<ModelKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_kind_parses_selector_keys() {
        assert_eq!("custom".parse::<ModelKind>().unwrap(), ModelKind::Custom);
        assert_eq!("rf".parse::<ModelKind>().unwrap(), ModelKind::RandomForest);
        assert_eq!("xgboost".parse::<ModelKind>().unwrap(), ModelKind::XgBoost);
        assert!(matches!(
            "svm".parse::<ModelKind>(),
            Err(PredictError::UnknownModel(k)) if k == "svm"
        ));
    }

    #[test]
    fn only_custom_is_scaled() {
        assert_eq!(ModelKind::Custom.preparation(), Preparation::Scaled);
        assert_eq!(ModelKind::RandomForest.preparation(), Preparation::Raw);
        assert_eq!(ModelKind::XgBoost.preparation(), Preparation::Raw);
    }

    #[test]
    fn predict_request_flattens_patient_fields() {
        let req: PredictRequest = serde_json::from_value(serde_json::json!({
            "age": 50, "gender": 2, "height": 168, "weight": 62,
            "ap_hi": 110, "ap_lo": 80, "cholesterol": 1, "gluc": 1,
            "smoke": 0, "alco": 0, "active": 1, "model": "custom"
        }))
        .unwrap();
        assert_eq!(req.model.as_deref(), Some("custom"));
        assert_eq!(req.patient.height, 168.0);

        let missing = serde_json::from_value::<PredictRequest>(serde_json::json!({ "age": 50 }));
        assert!(missing.is_err());
    }

    #[test]
    fn confusion_row_uses_dashboard_keys() {
        let row = ConfusionRow {
            name: "Actual Healthy".into(),
            predicted_healthy: 1,
            predicted_disease: 2,
        };
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["Predicted Healthy"], 1);
        assert_eq!(v["Predicted Disease"], 2);
    }
}
