use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use moodmeter_core::UtcDateTime;
use serde_json::{json, Value};

use crate::ProxyState;

pub fn router() -> Router<Arc<ProxyState>> {
    Router::new().route("/api/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": UtcDateTime::now() }))
}
