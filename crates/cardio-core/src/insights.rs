//! Dashboard payloads: feature importances plus the fixed evaluation figures
//! from the held-out test split.

use crate::schema::{
    ColumnInfo, ConfusionRow, EvalMetrics, FeatureImportance, InsightsResponse, ModelInfoResponse,
    ModelSummary,
};
use crate::util::round_to;

pub const TEST_METRICS: EvalMetrics = EvalMetrics {
    accuracy: 0.7355,
    precision: 0.7463,
    recall: 0.7285,
};

/// [[TN, FP], [FN, TP]]
pub const CONFUSION: [[u32; 2]; 2] = [[4482, 1923], [2016, 4562]];

/// Pair names with importances (shorter side wins), round to 3 places and sort
/// descending. The sort is stable, so ties keep column order.
pub fn rank_importances(names: &[String], importances: &[f64]) -> Vec<FeatureImportance> {
    let mut out: Vec<FeatureImportance> = names
        .iter()
        .zip(importances)
        .map(|(name, &v)| FeatureImportance {
            name: name.clone(),
            value: round_to(v, 3),
        })
        .collect();
    out.sort_by(|a, b| b.value.total_cmp(&a.value));
    out
}

pub fn build(names: &[String], importances: &[f64]) -> InsightsResponse {
    if names.len() != importances.len() {
        tracing::warn!(
            names = names.len(),
            importances = importances.len(),
            "column names and importances differ in length, extra entries dropped"
        );
    }
    InsightsResponse {
        feature_importance: rank_importances(names, importances),
        metrics: TEST_METRICS,
        confusion_matrix: vec![
            ConfusionRow {
                name: "Actual Healthy".into(),
                predicted_healthy: CONFUSION[0][0],
                predicted_disease: CONFUSION[0][1],
            },
            ConfusionRow {
                name: "Actual Disease".into(),
                predicted_healthy: CONFUSION[1][0],
                predicted_disease: CONFUSION[1][1],
            },
        ],
    }
}

pub fn model_info() -> ModelInfoResponse {
    let col = |name: &str, desc: &str, kind: &str| ColumnInfo {
        name: name.into(),
        desc: desc.into(),
        kind: kind.into(),
    };
    let model = |name: &str, desc: &str, accuracy: &str| ModelSummary {
        name: name.into(),
        desc: desc.into(),
        accuracy: accuracy.into(),
    };

    ModelInfoResponse {
        columns: vec![
            col("Age", "Age in years", "Numerical"),
            col("Systolic BP", "Upper blood pressure reading", "Numerical"),
            col("Cholesterol", "1: Normal, 2: Above, 3: High", "Categorical"),
        ],
        models: vec![
            model(
                "Logistic Regression (Custom)",
                "Gradient descent logistic regression built from scratch.",
                "72%",
            ),
            model("Random Forest", "Ensemble of 100 trees.", "73.55%"),
            model("XGBoost", "Gradient Boosting algorithm.", "73.43%"),
        ],
    }
}
