use axum::{extract::State, Json};
use serde_json::{json, Value};
use storage::Db;

use crate::error::ApiError;

pub async fn health(State(db): State<Db>) -> Result<Json<Value>, ApiError> {
    db.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}
