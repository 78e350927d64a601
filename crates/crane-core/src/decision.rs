//! Decision policy: classify a host into a corrective action

use std::fmt;

use crane_api::{ActionType, Host, HostHealth, HostState};

/// Outcome of the decision policy for one host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Drain,
    Replace,
    NoAction,
}

impl Decision {
    /// Action to enqueue, if any
    #[must_use]
    pub fn action_type(self) -> Option<ActionType> {
        match self {
            Decision::Drain => Some(ActionType::Drain),
            Decision::Replace => Some(ActionType::Replace),
            Decision::NoAction => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Decision::Drain => "drain",
            Decision::Replace => "replace",
            Decision::NoAction => "none",
        })
    }
}

/// Decide what to do about `host` from its `(state, health)` pair
///
/// Serving hosts (`READY`/`DRAINING`) are drained when healthy and replaced
/// when unhealthy. Every other combination falls back to `Drain`; this
/// includes `PROVISIONING` and `TERMINATED` hosts, for which no action may
/// actually be wanted. `NoAction` is never produced by the current policy.
#[must_use]
pub fn decide(host: &Host) -> Decision {
    let serving = matches!(host.state, HostState::Ready | HostState::Draining);

    match host.health {
        HostHealth::Healthy if serving => Decision::Drain,
        HostHealth::Unhealthy if serving => Decision::Replace,
        _ => Decision::Drain,
    }
}
