//! Host management API endpoints

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};

use crane_api::requests::{HealthRequest, NEW_STATE_HEADER};
use crane_api::responses::HostListResponse;
use crane_api::{Host, HostHealth, HostState};
use crane_core::CoreError;

use crate::api::error::{ApiError, AppError};
use crate::state::AppState;

/// List all hosts in the catalog
///
/// # Errors
/// Returns `AppError` if the catalog cannot be read
#[utoipa::path(
    get,
    path = "/hosts",
    tag = "hosts",
    responses(
        (status = 200, description = "Every host, terminated ones included", body = HostListResponse),
        (status = 500, description = "Store failure", body = ApiError)
    )
)]
pub async fn list_hosts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HostListResponse>, AppError> {
    let hosts = state.catalog.list()?;
    Ok(Json(HostListResponse {
        total: hosts.len(),
        hosts,
    }))
}

/// Get a single host
///
/// # Errors
/// Returns `AppError` if the host is unknown or the catalog cannot be read
#[utoipa::path(
    get,
    path = "/hosts/{id}",
    tag = "hosts",
    params(("id" = String, Path, description = "Host id")),
    responses(
        (status = 200, description = "Host found", body = Host),
        (status = 404, description = "Unknown host", body = ApiError),
        (status = 500, description = "Store failure", body = ApiError)
    )
)]
pub async fn get_host(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Host>, AppError> {
    Ok(Json(state.catalog.get(&id)?))
}

/// Move a host to the state named in the `X-New-State` header
///
/// # Errors
/// Returns `AppError` on a missing or unknown state, an unknown host,
/// an illegal transition, or a store failure
#[utoipa::path(
    patch,
    path = "/hosts/{id}/state",
    tag = "hosts",
    params(
        ("id" = String, Path, description = "Host id"),
        ("X-New-State" = HostState, Header, description = "Requested state")
    ),
    responses(
        (status = 204, description = "State changed"),
        (status = 400, description = "Missing or unknown state", body = ApiError),
        (status = 404, description = "Unknown host", body = ApiError),
        (status = 409, description = "Transition not allowed", body = ApiError),
        (status = 500, description = "Store failure", body = ApiError)
    )
)]
pub async fn transition_state(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let raw = headers
        .get(NEW_STATE_HEADER)
        .ok_or_else(|| AppError::bad_request(format!("missing {NEW_STATE_HEADER} header")))?
        .to_str()
        .map_err(|_| AppError::bad_request(format!("{NEW_STATE_HEADER} is not valid text")))?
        .trim();
    if raw.is_empty() {
        return Err(AppError::bad_request(format!("{NEW_STATE_HEADER} is empty")));
    }

    let requested = raw.parse::<HostState>().map_err(CoreError::from)?;
    state.catalog.transition_state(&id, requested)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Overwrite a host's health
///
/// # Errors
/// Returns `AppError` on a malformed body, an empty or unknown health value,
/// an unknown host, or a store failure
#[utoipa::path(
    patch,
    path = "/hosts/{id}/health",
    tag = "hosts",
    params(("id" = String, Path, description = "Host id")),
    request_body = HealthRequest,
    responses(
        (status = 204, description = "Health updated"),
        (status = 400, description = "Malformed body or unknown health", body = ApiError),
        (status = 404, description = "Unknown host", body = ApiError),
        (status = 500, description = "Store failure", body = ApiError)
    )
)]
pub async fn transition_health(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<HealthRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(req) = body?;
    if req.health.trim().is_empty() {
        return Err(AppError::bad_request("health is required"));
    }

    let health = req.health.parse::<HostHealth>().map_err(CoreError::from)?;
    state.catalog.transition_health(&id, health)?;

    Ok(StatusCode::NO_CONTENT)
}
