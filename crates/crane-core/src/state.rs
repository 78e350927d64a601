//! Host state machine
//!
//! ```text
//! PROVISIONING -> READY
//! READY        -> DRAINING | UNHEALTHY
//! DRAINING     -> UNHEALTHY | TERMINATED
//! UNHEALTHY    -> READY | TERMINATED
//! TERMINATED   (terminal)
//! ```

use crane_api::HostState;

/// States reachable in one step from `current`
#[must_use]
pub fn valid_next_states(current: HostState) -> &'static [HostState] {
    match current {
        HostState::Provisioning => &[HostState::Ready],
        HostState::Ready => &[HostState::Draining, HostState::Unhealthy],
        HostState::Draining => &[HostState::Unhealthy, HostState::Terminated],
        HostState::Unhealthy => &[HostState::Ready, HostState::Terminated],
        HostState::Terminated => &[],
    }
}

/// Whether `from -> to` is an edge of the state machine
#[must_use]
pub fn can_transition(from: HostState, to: HostState) -> bool {
    valid_next_states(from).contains(&to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_self_loops() {
        for state in HostState::ALL {
            assert!(
                !valid_next_states(state).contains(&state),
                "{state} may transition to itself"
            );
        }
    }

    #[test]
    fn test_terminated_is_terminal() {
        assert!(valid_next_states(HostState::Terminated).is_empty());
        for state in HostState::ALL {
            assert!(!can_transition(HostState::Terminated, state));
        }
    }

    #[test]
    fn test_transition_table() {
        use HostState::*;

        let allowed = [
            (Provisioning, Ready),
            (Ready, Draining),
            (Ready, Unhealthy),
            (Draining, Unhealthy),
            (Draining, Terminated),
            (Unhealthy, Ready),
            (Unhealthy, Terminated),
        ];

        for from in HostState::ALL {
            for to in HostState::ALL {
                assert_eq!(
                    can_transition(from, to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_ready_cannot_terminate_directly() {
        assert!(!can_transition(HostState::Ready, HostState::Terminated));
    }

    #[test]
    fn test_next_states_have_no_duplicates() {
        for state in HostState::ALL {
            let next = valid_next_states(state);
            for (i, a) in next.iter().enumerate() {
                assert!(!next[i + 1..].contains(a));
            }
        }
    }
}
