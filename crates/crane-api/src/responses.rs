//! Response types for the API

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::action::ActionRecord;
use crate::host::Host;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HostListResponse {
    pub hosts: Vec<Host>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActionListResponse {
    pub actions: Vec<ActionRecord>,
    pub total: usize,
}
