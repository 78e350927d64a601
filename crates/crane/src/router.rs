//! HTTP router configuration

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, patch},
};
use utoipa::OpenApi;

use crate::api::{actions, hosts, system};
use crate::state::AppState;

/// OpenAPI document for the HTTP surface
#[derive(OpenApi)]
#[openapi(
    paths(
        system::health,
        hosts::list_hosts,
        hosts::get_host,
        hosts::transition_state,
        hosts::transition_health,
        actions::list_actions,
    ),
    components(schemas(
        crane_api::Host,
        crane_api::HostState,
        crane_api::HostHealth,
        crane_api::ActionRecord,
        crane_api::ActionStatus,
        crane_api::ActionType,
        crane_api::requests::HealthRequest,
        crane_api::responses::HealthResponse,
        crane_api::responses::HostListResponse,
        crane_api::responses::ActionListResponse,
        crate::api::ApiError,
    )),
    tags(
        (name = "system", description = "Daemon status"),
        (name = "hosts", description = "Host catalog"),
        (name = "actions", description = "Action queue"),
    )
)]
pub struct ApiDoc;

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // System endpoints
        .route("/health", get(system::health))
        .route("/api-docs/openapi.json", get(openapi))
        // Hosts
        .route("/hosts", get(hosts::list_hosts))
        .route("/hosts/{id}", get(hosts::get_host))
        .route("/hosts/{id}/state", patch(hosts::transition_state))
        .route("/hosts/{id}/health", patch(hosts::transition_health))
        // Actions
        .route("/actions", get(actions::list_actions))
        // State
        .with_state(state)
}
