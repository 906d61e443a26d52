use crate::{
    config::Config,
    error::PredictError,
    features::assemble,
    insights,
    registry::ModelRegistry,
    schema::{
        HealthResponse, InsightsResponse, ModelInfoResponse, ModelKind, PredictRequest,
        PredictResponse,
    },
    util::{now_us, round_to},
};

use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Sentinel used when a model cannot report a probability.
pub const PROBABILITY_NA: &str = "N/A";

#[derive(Clone)]
pub struct AppCore {
    pub cfg: Config,
    pub registry: Arc<ModelRegistry>,
}

impl AppCore {
    pub fn new(cfg: Config, registry: ModelRegistry) -> Self {
        Self {
            cfg,
            registry: Arc::new(registry),
        }
    }

    pub fn load(cfg: Config) -> anyhow::Result<Self> {
        let registry = ModelRegistry::load_from_dir(&cfg.model_dir, &cfg.artifacts)?;
        Ok(Self::new(cfg, registry))
    }

    /// Parse a raw JSON body, then predict.
    pub fn predict_json(&self, body: &[u8]) -> Result<PredictResponse, PredictError> {
        let req: PredictRequest = serde_json::from_slice(body)?;
        self.predict(&req)
    }

    pub fn predict(&self, req: &PredictRequest) -> Result<PredictResponse, PredictError> {
        let t0 = Instant::now();

        let kind = match req.model.as_deref() {
            Some(key) => key.parse::<ModelKind>()?,
            None => self.cfg.default_model,
        };
        let model = self.registry.get(kind)?;

        // feature build（按模型选择归一化 / 原始）
        let t_feat = Instant::now();
        let features = assemble(&req.patient, kind.preparation())?;
        metrics::histogram!("stage_feature_us").record(now_us(t_feat) as f64);

        let t_pred = Instant::now();
        let prediction = model.predict(&features);
        let probability = model
            .predict_proba(&features)
            .and_then(format_probability)
            .unwrap_or_else(|| PROBABILITY_NA.to_string());
        metrics::histogram!("stage_predict_us").record(now_us(t_pred) as f64);

        metrics::counter!("predict_total", "model" => kind.key()).increment(1);
        metrics::histogram!("e2e_us").record(now_us(t0) as f64);
        debug!(model = %kind, prediction, %probability, "prediction");

        Ok(PredictResponse {
            prediction,
            probability,
            model_used: kind,
            message: risk_message(prediction).to_string(),
        })
    }

    pub fn insights(&self) -> Result<InsightsResponse, PredictError> {
        let rf = self
            .registry
            .get(ModelKind::RandomForest)
            .map_err(|_| PredictError::InsightsUnavailable)?;
        let importances = rf
            .feature_importances()
            .ok_or(PredictError::InsightsUnavailable)?;
        Ok(insights::build(self.registry.column_names(), importances))
    }

    pub fn model_info(&self) -> ModelInfoResponse {
        insights::model_info()
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "ok".into(),
            models: self.registry.loaded(),
        }
    }
}

fn risk_message(prediction: u8) -> &'static str {
    if prediction == 1 {
        "High Risk"
    } else {
        "Low Risk"
    }
}

/// p ∈ [0,1] -> "73.45%"（百分比保留两位；整数也带一位小数，如 "50.0%"）
pub fn format_probability(p: f64) -> Option<String> {
    if !p.is_finite() {
        return None;
    }
    let pct = round_to(p * 100.0, 2);
    Some(if pct.fract() == 0.0 {
        format!("{pct:.1}%")
    } else {
        format!("{pct}%")
    })
}
