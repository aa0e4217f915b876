use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

pub const SERVICE_NAME: &str = "Year Review Mini App";

#[axum::debug_handler]
pub async fn health() -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
    });
    (StatusCode::OK, Json(body))
}
