use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Returns a status object with the current time and service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "cvgen"
    }))
}
