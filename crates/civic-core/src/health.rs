use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};

/// Handler for `GET /healthz`: liveness check.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Handler for `GET /api/health`: liveness with the JSON body browser clients poll for.
pub async fn health_json() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
