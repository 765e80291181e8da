use adrotate_core::types::{Selection, SelectionPolicy};
use adrotate_core::RotationStore;
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{
    error::{ApiResult, AppError},
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/issues/{id}/rotation", post(run_rotation))
        .route("/v1/issues/{id}/confirm", post(confirm_usage))
        .route("/v1/issues/{id}/selections", get(list_selections))
        .route(
            "/v1/issues/{issue_id}/modules/{module_id}/selection",
            put(assign_unit),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignUnitRequest {
    unit_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectionItem {
    id: String,
    module_id: String,
    sponsor_id: Option<String>,
    unit_id: Option<String>,
    policy: SelectionPolicy,
    reason: String,
    confirmed_at: Option<DateTime<Utc>>,
}

impl From<Selection> for SelectionItem {
    fn from(selection: Selection) -> Self {
        Self {
            id: selection.id,
            module_id: selection.module_id,
            sponsor_id: selection.sponsor_id,
            unit_id: selection.unit_id,
            policy: selection.policy,
            reason: selection.reason,
            confirmed_at: selection.confirmed_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureItem {
    module_id: String,
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RotationResponse {
    issue_id: String,
    skipped: bool,
    items: Vec<SelectionItem>,
    failures: Vec<FailureItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmResponse {
    issue_id: String,
    recorded_count: usize,
    attempted_count: usize,
    already_confirmed_count: usize,
    failures: Vec<FailureItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectionListResponse {
    items: Vec<SelectionItem>,
}

async fn run_rotation(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> ApiResult<Json<RotationResponse>> {
    let pass = adrotate_core::run_rotation_pass(&*state.store, &id)
        .await
        .map_err(|err| AppError::from(err).with_request_id(&request_id.0))?;

    Ok(Json(RotationResponse {
        issue_id: pass.issue_id,
        skipped: pass.skipped,
        items: pass
            .selections
            .into_iter()
            .map(|entry| entry.selection.into())
            .collect(),
        failures: pass
            .failures
            .into_iter()
            .map(|failure| FailureItem {
                module_id: failure.module_id,
                error: failure.error,
            })
            .collect(),
    }))
}

async fn confirm_usage(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> ApiResult<Json<ConfirmResponse>> {
    let issue = state
        .store
        .get_issue(&id)
        .await
        .map_err(|err| {
            error!(issue_id = %id, error = %err, "failed to load issue");
            AppError::Internal.with_request_id(&request_id.0)
        })?
        .ok_or_else(|| {
            AppError::NotFound("issue not found".to_string()).with_request_id(&request_id.0)
        })?;

    let report = adrotate_core::confirm_usage(&*state.store, &id, issue.issue_date)
        .await
        .map_err(|err| AppError::from(err).with_request_id(&request_id.0))?;

    Ok(Json(ConfirmResponse {
        issue_id: report.issue_id,
        recorded_count: report.recorded,
        attempted_count: report.attempted,
        already_confirmed_count: report.already_confirmed,
        failures: report
            .failures
            .into_iter()
            .map(|failure| FailureItem {
                module_id: failure.module_id,
                error: failure.error,
            })
            .collect(),
    }))
}

async fn list_selections(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> ApiResult<Json<SelectionListResponse>> {
    let selections = state
        .store
        .list_selections(&id)
        .await
        .map_err(|err| {
            error!(issue_id = %id, error = %err, "failed to list selections");
            AppError::Internal.with_request_id(&request_id.0)
        })?;

    Ok(Json(SelectionListResponse {
        items: selections.into_iter().map(Into::into).collect(),
    }))
}

async fn assign_unit(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((issue_id, module_id)): Path<(String, String)>,
    Json(payload): Json<AssignUnitRequest>,
) -> ApiResult<Json<SelectionItem>> {
    if payload.unit_id.trim().is_empty() {
        return Err(
            AppError::BadRequest("unitId required".to_string()).with_request_id(&request_id.0)
        );
    }

    let selection =
        adrotate_core::manually_assign_unit(&*state.store, &issue_id, &module_id, &payload.unit_id)
            .await
            .map_err(|err| AppError::from(err).with_request_id(&request_id.0))?;

    Ok(Json(selection.into()))
}
