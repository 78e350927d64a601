//! Action queue inspection

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};

use crane_api::ActionStatus;
use crane_api::requests::ActionListQuery;
use crane_api::responses::ActionListResponse;
use crane_core::CoreError;

use crate::api::error::{ApiError, AppError};
use crate::state::AppState;

/// List action records in id order
///
/// # Errors
/// Returns `AppError` on an unknown status filter or a store failure
#[utoipa::path(
    get,
    path = "/actions",
    tag = "actions",
    params(("status" = Option<ActionStatus>, Query, description = "Only records in this status")),
    responses(
        (status = 200, description = "Matching records", body = ActionListResponse),
        (status = 400, description = "Unknown status", body = ApiError),
        (status = 500, description = "Store failure", body = ApiError)
    )
)]
pub async fn list_actions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActionListQuery>,
) -> Result<Json<ActionListResponse>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ActionStatus>)
        .transpose()
        .map_err(CoreError::from)?;

    let actions = state
        .queue
        .list(status)
        .map_err(|e| AppError::internal(format!("failed to list actions: {e}")))?;

    Ok(Json(ActionListResponse {
        total: actions.len(),
        actions,
    }))
}
