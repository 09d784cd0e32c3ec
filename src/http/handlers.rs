//! Axum handlers translating requests into engine calls.
//!
//! The engine does blocking disk I/O (fsync on every write), so each call is
//! moved onto tokio's blocking pool.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::engine::{Engine, Entry};

use super::error::ApiError;

type Result<T> = std::result::Result<T, ApiError>;

/// `?key=...`
#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

/// `{"key": ..., "value": ...}`
#[derive(Debug, Deserialize)]
pub struct SetPayload {
    pub key: Option<String>,
    pub value: Option<String>,
}

/// GET /get?key=K
pub async fn get_value(
    State(engine): State<Arc<Engine>>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<Entry>> {
    let key = required_key(query.key)?;

    let lookup_key = key.clone();
    let value = blocking(engine, move |engine| engine.get(&lookup_key)).await?;

    match value {
        Some(value) => Ok(Json(Entry { key, value })),
        None => Err(ApiError::not_found("Key not found")),
    }
}

/// POST /set with a JSON body
pub async fn set_value(
    State(engine): State<Arc<Engine>>,
    payload: std::result::Result<Json<SetPayload>, JsonRejection>,
) -> Result<Json<Entry>> {
    let Json(payload) = payload.map_err(|e| {
        tracing::debug!("rejected set payload: {}", e);
        ApiError::bad_request("Invalid request payload")
    })?;

    let (Some(key), Some(value)) = (payload.key, payload.value) else {
        return Err(ApiError::bad_request(
            "Missing key or value in request payload",
        ));
    };

    let entry = blocking(engine, move |engine| engine.set(&key, &value)).await?;
    Ok(Json(entry))
}

/// DELETE /delete?key=K
pub async fn delete_value(
    State(engine): State<Arc<Engine>>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<Value>> {
    let key = required_key(query.key)?;

    let delete_key = key.clone();
    blocking(engine, move |engine| engine.delete(&delete_key)).await?;

    Ok(Json(json!({ "key": key })))
}

/// GET /health
pub async fn health(State(engine): State<Arc<Engine>>) -> Result<Json<Value>> {
    if engine.is_closed() {
        return Err(ApiError::unavailable("store closed"));
    }
    let keys = blocking(engine, |engine| Ok(engine.len())).await?;
    Ok(Json(json!({ "status": "ok", "keys": keys })))
}

// =============================================================================
// Helpers
// =============================================================================

fn required_key(key: Option<String>) -> Result<String> {
    match key {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(ApiError::bad_request("Key parameter is missing")),
    }
}

async fn blocking<T, F>(engine: Arc<Engine>, f: F) -> Result<T>
where
    F: FnOnce(&Engine) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&engine))
        .await
        .map_err(|e| ApiError::internal(format!("engine task failed: {}", e)))?
        .map_err(ApiError::from)
}
