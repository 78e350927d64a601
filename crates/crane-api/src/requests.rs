//! Request types for the API

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Header carrying the requested state on `PATCH /hosts/{id}/state`
pub const NEW_STATE_HEADER: &str = "X-New-State";

/// Body of `PATCH /hosts/{id}/health`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRequest {
    /// One of `healthy`, `unhealthy`, `unknown`
    #[serde(default)]
    pub health: String,
}

/// Query parameters for `GET /actions`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ActionListQuery {
    /// Only return records in this status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
