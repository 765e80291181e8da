use axum::{
    extract::{Path, State},
    routing::{post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiResult, AppError},
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/modules/{id}/cursor", put(set_cursor))
        .route("/v1/modules/{id}/cursor/reset", post(reset_cursor))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetCursorRequest {
    position: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CursorResponse {
    module_id: String,
    rotation_cursor: i32,
}

async fn set_cursor(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(payload): Json<SetCursorRequest>,
) -> ApiResult<Json<CursorResponse>> {
    adrotate_core::set_module_cursor(&*state.store, &id, payload.position)
        .await
        .map_err(|err| AppError::from(err).with_request_id(&request_id.0))?;

    Ok(Json(CursorResponse {
        module_id: id,
        rotation_cursor: payload.position,
    }))
}

async fn reset_cursor(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> ApiResult<Json<CursorResponse>> {
    adrotate_core::reset_module_cursor(&*state.store, &id)
        .await
        .map_err(|err| AppError::from(err).with_request_id(&request_id.0))?;

    Ok(Json(CursorResponse {
        module_id: id,
        rotation_cursor: 1,
    }))
}
