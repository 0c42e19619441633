use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::{header, StatusCode};
use serde_json::json;
use tracing::error;

use crate::metrics::gather_metrics;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn metrics() -> Response {
    match gather_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to gather metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
