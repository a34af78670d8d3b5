use axum::response::Json;
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Instant;

static START: OnceLock<Instant> = OnceLock::new();

pub fn mark_start() {
    START.get_or_init(Instant::now);
}

pub async fn health() -> Json<Value> {
    let uptime_secs = START.get().map(|start| start.elapsed().as_secs()).unwrap_or(0);
    Json(json!({ "status": "ok", "uptime_seconds": uptime_secs }))
}
