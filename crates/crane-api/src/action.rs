//! Corrective action types and their queue records

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ParseEnumError;

/// Kind of corrective work performed against a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ActionType {
    #[serde(rename = "drain_host")]
    Drain,
    #[serde(rename = "replace_host")]
    Replace,
}

impl ActionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Drain => "drain_host",
            ActionType::Replace => "replace_host",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of corrective work for one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Action {
    /// Host the action targets (a reference, not ownership)
    pub host_id: String,
    /// What to do
    pub action_type: ActionType,
}

impl Action {
    pub fn new(host_id: impl Into<String>, action_type: ActionType) -> Self {
        Self {
            host_id: host_id.into(),
            action_type,
        }
    }
}

/// Queue status of an action record
///
/// Transitions: `Pending → Running → Done | Failed`. Terminal records are
/// never claimed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl ActionStatus {
    pub const ALL: [ActionStatus; 4] = [
        ActionStatus::Pending,
        ActionStatus::Running,
        ActionStatus::Done,
        ActionStatus::Failed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Running => "running",
            ActionStatus::Done => "done",
            ActionStatus::Failed => "failed",
        }
    }

    /// Whether the record has reached `Done` or `Failed`
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ActionStatus::Done | ActionStatus::Failed)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ActionStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseEnumError::new("action status", s))
    }
}

/// Durable, queue-tracked projection of an [`Action`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActionRecord {
    /// Store-assigned, monotonically increasing id
    pub id: u64,
    pub host_id: String,
    pub action_type: ActionType,
    pub status: ActionStatus,
    /// Number of times the record has been claimed
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActionRecord {
    /// Rebuild the action this record tracks
    #[must_use]
    pub fn action(&self) -> Action {
        Action::new(self.host_id.clone(), self.action_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_wire_names() {
        let json = serde_json::to_string(&ActionType::Drain).unwrap();
        assert_eq!(json, "\"drain_host\"");
        let json = serde_json::to_string(&ActionType::Replace).unwrap();
        assert_eq!(json, "\"replace_host\"");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!ActionStatus::Pending.is_terminal());
        assert!(!ActionStatus::Running.is_terminal());
        assert!(ActionStatus::Done.is_terminal());
        assert!(ActionStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Running".parse::<ActionStatus>().unwrap(), ActionStatus::Running);
        assert!("queued".parse::<ActionStatus>().is_err());
    }

    #[test]
    fn test_record_rebuilds_action() {
        let now = Utc::now();
        let record = ActionRecord {
            id: 7,
            host_id: "h1".to_string(),
            action_type: ActionType::Replace,
            status: ActionStatus::Running,
            attempts: 1,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(record.action(), Action::new("h1", ActionType::Replace));
    }
}
