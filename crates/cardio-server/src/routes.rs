use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cardio_core::{
    pipeline::AppCore,
    schema::{ErrorBody, HealthResponse, InsightsResponse, ModelInfoResponse, PredictResponse},
    PredictError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub core: Arc<AppCore>,
    pub prom: PrometheusHandle,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/predict", post(predict))
        .route("/api/insights", get(insights))
        .route("/api/model-info", get(model_info))
        .route("/api/health", get(health))
        .route("/metrics", get(metrics))
        // 前端与后端不同源
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `{error}` body with a status chosen by failure kind.
pub struct ApiError(PredictError);

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            PredictError::UnknownModel(_) | PredictError::ModelNotLoaded(_) => {
                (StatusCode::NOT_FOUND, "model")
            }
            PredictError::InvalidInput(_) | PredictError::Malformed(_) => {
                (StatusCode::BAD_REQUEST, "input")
            }
            PredictError::InsightsUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "insights"),
        };
        metrics::counter!("request_error_total", "kind" => kind).increment(1);
        tracing::warn!(status = status.as_u16(), err = %self.0, "request failed");

        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// body 手动解析：字段缺失/类型错误也要返回 {error}，而不是 axum 默认的纯文本拒绝
async fn predict(State(st): State<AppState>, body: Bytes) -> Result<Json<PredictResponse>, ApiError> {
    Ok(Json(st.core.predict_json(&body)?))
}

async fn insights(State(st): State<AppState>) -> Result<Json<InsightsResponse>, ApiError> {
    Ok(Json(st.core.insights()?))
}

async fn model_info(State(st): State<AppState>) -> Json<ModelInfoResponse> {
    Json(st.core.model_info())
}

async fn health(State(st): State<AppState>) -> Json<HealthResponse> {
    Json(st.core.health())
}

async fn metrics(State(st): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, st.prom.render())
}
