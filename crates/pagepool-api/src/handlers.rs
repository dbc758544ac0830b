//! Route handlers. Each one resolves through `PoolAdmin`/`BrowserPool` and
//! lets `ApiError` do the status-code translation.

use axum::extract::{Path, Query, State};
use axum::Json;
use pagepool_types::{ActionRequest, PageAction, PoolConfig, PoolError, PoolId};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn service_info(State(state): State<AppState>) -> Json<Value> {
    let pools = state.admin.list_pools().await;
    Json(json!({
        "service": "pagepool-api",
        "pools": pools.iter().map(|p| json!({
            "pool_id": p.pool_id,
            "browser_count": p.browser_count,
            "active": p.active,
        })).collect::<Vec<_>>(),
    }))
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn create_pool(
    State(state): State<AppState>,
    Json(config): Json<PoolConfig>,
) -> ApiResult<(axum::http::StatusCode, Json<Value>)> {
    let pool_id = state.admin.create_pool(config).await.map_err(ApiError::from)?;
    Ok((axum::http::StatusCode::CREATED, Json(json!({ "pool_id": pool_id.to_string() }))))
}

pub async fn list_pools(State(state): State<AppState>) -> Json<Value> {
    let pools = state.admin.list_pools().await;
    Json(json!({
        "pools": pools.iter().map(|p| json!({
            "pool_id": p.pool_id,
            "browser_count": p.browser_count,
            "active": p.active,
        })).collect::<Vec<_>>(),
    }))
}

pub async fn get_pool(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let pool = state
        .admin
        .get_pool(&PoolId::from_raw(&id))
        .await
        .ok_or_else(|| ApiError::from(PoolError::pool_not_found(&id)))?;
    let descriptor = pool.descriptor().await;
    Ok(Json(json!({
        "pool_id": descriptor.pool_id,
        "browser_count": descriptor.browser_count,
        "active": descriptor.active,
    })))
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    force: bool,
}

pub async fn delete_pool(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<axum::http::StatusCode> {
    state
        .admin
        .delete_pool(&PoolId::from_raw(&id), query.force)
        .await
        .map_err(ApiError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

pub async fn scale_up(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let pool = state
        .admin
        .get_pool(&PoolId::from_raw(&id))
        .await
        .ok_or_else(|| ApiError::from(PoolError::pool_not_found(&id)))?;
    let browser = pool.create_browser().await.map_err(ApiError::from)?;
    Ok(Json(json!({ "browser_id": browser.id().to_string() })))
}

pub async fn scale_down(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let pool = state
        .admin
        .get_pool(&PoolId::from_raw(&id))
        .await
        .ok_or_else(|| ApiError::from(PoolError::pool_not_found(&id)))?;
    pool.auto_scale_down().await;
    Ok(Json(json!({ "pool_id": id })))
}

pub async fn list_actions() -> Json<Value> {
    Json(json!({ "actions": PageAction::ALL.iter().map(PageAction::as_str).collect::<Vec<_>>() }))
}

#[derive(Deserialize)]
pub struct NewSessionQuery {
    pool_id: String,
}

pub async fn new_session(
    State(state): State<AppState>,
    Query(query): Query<NewSessionQuery>,
) -> ApiResult<(axum::http::StatusCode, Json<Value>)> {
    let session_id = state.admin.new_session(&query.pool_id).await.map_err(ApiError::from)?;
    Ok((axum::http::StatusCode::CREATED, Json(json!({ "session_id": session_id }))))
}

pub async fn session_metrics(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let metrics = state.admin.session_metrics(&id).await.map_err(ApiError::from)?;
    Ok(Json(json!({
        "idle_for_ms": metrics.idle_for.as_millis() as u64,
        "is_idle": metrics.is_idle,
    })))
}

pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<axum::http::StatusCode> {
    state.admin.close_session(&id).await.map_err(ApiError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

pub async fn dispatch_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Json<Value>> {
    let (_, mut session) = state.admin.take_page_session(&id).await.map_err(ApiError::from)?;
    let timeout = state.config.default_timeout;

    let dispatched = tokio::time::timeout(timeout, session.perform_action(&id, &request)).await;

    let put_back = state.admin.put_page_session(&id, session).await;
    if let Err(e) = put_back {
        tracing::warn!(session_id = %id, error = %e, "failed to restore page session after action");
    }

    match dispatched {
        Ok(Ok(value)) => Ok(Json(value)),
        Ok(Err(e)) => Err(ApiError::from(e)),
        Err(_) => Err(ApiError::from(PoolError::Timeout {
            elapsed_ms: timeout.as_millis() as u64,
        })),
    }
}
