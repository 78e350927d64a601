//! Host catalog types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ParseEnumError;

/// Lifecycle phase of a managed host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostState {
    Provisioning,
    Ready,
    Draining,
    Unhealthy,
    Terminated,
}

impl HostState {
    /// All states, in lifecycle order
    pub const ALL: [HostState; 5] = [
        HostState::Provisioning,
        HostState::Ready,
        HostState::Draining,
        HostState::Unhealthy,
        HostState::Terminated,
    ];

    /// Wire name of the state
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HostState::Provisioning => "PROVISIONING",
            HostState::Ready => "READY",
            HostState::Draining => "DRAINING",
            HostState::Unhealthy => "UNHEALTHY",
            HostState::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        HostState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseEnumError::new("state", s))
    }
}

/// Externally reported health signal of a host
///
/// Unlike [`HostState`], health has no transition rules: any value may
/// follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HostHealth {
    Healthy,
    Unhealthy,
    Unknown,
}

impl HostHealth {
    pub const ALL: [HostHealth; 3] = [
        HostHealth::Healthy,
        HostHealth::Unhealthy,
        HostHealth::Unknown,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HostHealth::Healthy => "healthy",
            HostHealth::Unhealthy => "unhealthy",
            HostHealth::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HostHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostHealth {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        HostHealth::ALL
            .into_iter()
            .find(|health| health.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseEnumError::new("health", s))
    }
}

/// A managed compute host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Host {
    /// Opaque, immutable identifier
    pub id: String,
    /// Role the host serves in the fleet (e.g. `worker`)
    pub role: String,
    /// Availability zone
    pub zone: String,
    /// Machine image the host was provisioned from
    pub image_id: String,
    /// Lifecycle state, governed by the state machine
    pub state: HostState,
    /// Last reported health
    pub health: HostHealth,
    /// Provisioning timestamp
    pub created_at: DateTime<Utc>,
}

impl Host {
    /// Create a freshly provisioned host (`PROVISIONING`, health `unknown`)
    pub fn new(
        id: impl Into<String>,
        role: impl Into<String>,
        zone: impl Into<String>,
        image_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            zone: zone.into(),
            image_id: image_id.into(),
            state: HostState::Provisioning,
            health: HostHealth::Unknown,
            created_at: Utc::now(),
        }
    }

    /// Set the initial state
    #[must_use]
    pub fn with_state(mut self, state: HostState) -> Self {
        self.state = state;
        self
    }

    /// Set the initial health
    #[must_use]
    pub fn with_health(mut self, health: HostHealth) -> Self {
        self.health = health;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_parse_is_case_insensitive() {
        assert_eq!("READY".parse::<HostState>().unwrap(), HostState::Ready);
        assert_eq!("draining".parse::<HostState>().unwrap(), HostState::Draining);
        assert_eq!(
            " Terminated ".parse::<HostState>().unwrap(),
            HostState::Terminated
        );
    }

    #[test]
    fn test_state_parse_rejects_unknown() {
        let err = "running".parse::<HostState>().unwrap_err();
        assert_eq!(err.kind, "state");
        assert_eq!(err.value, "running");
    }

    #[test]
    fn test_health_parse() {
        assert_eq!("healthy".parse::<HostHealth>().unwrap(), HostHealth::Healthy);
        assert_eq!("UNKNOWN".parse::<HostHealth>().unwrap(), HostHealth::Unknown);
        assert!("sick".parse::<HostHealth>().is_err());
        assert!("".parse::<HostHealth>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let host = Host::new("h1", "worker", "us-west-2a", "ami-123")
            .with_state(HostState::Ready)
            .with_health(HostHealth::Healthy);
        let json = serde_json::to_value(&host).unwrap();

        assert_eq!(json["state"], "READY");
        assert_eq!(json["health"], "healthy");

        let back: Host = serde_json::from_value(json).unwrap();
        assert_eq!(back, host);
    }

    #[test]
    fn test_new_host_defaults() {
        let host = Host::new("h1", "worker", "zone-a", "img");
        assert_eq!(host.state, HostState::Provisioning);
        assert_eq!(host.health, HostHealth::Unknown);
    }
}
