//! # Boot
//!
//! [`BootSequencer`] runs every system's `init` concurrently and reports each
//! transition to a [`SequenceObserver`]. [`BootSession`] owns the boot status
//! and the per-system status table and answers lookups by kind; only the
//! orchestrator can feed it transitions.
//!
//! ## Status Transitions
//!
//! ```text
//! system:  Pending ──► Starting ──► Running
//!                          └──────► Failed
//!
//! boot:    NotStarted ──► Loading ──► Completed
//!                            └──────► Failed
//! ```
//!
//! `Running` and `Failed` are terminal. Nothing is retried. Any other
//! transition is refused and logged.

mod sequencer;
mod session;

pub use sequencer::{BootSequencer, SequenceObserver, SequenceOutcome};
pub use session::{BootReport, BootSession, LookupError, SystemReport};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a single system within a boot session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    /// Constructed and tracked, `init` not launched yet.
    Pending,
    /// `init` launched and not resolved.
    Starting,
    /// `init` returned successfully.
    Running,
    /// `init` failed, panicked or timed out.
    Failed,
}

impl SystemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Running | Self::Failed)
    }

    /// Whether a system in this status may move to `next`.
    pub fn can_become(self, next: SystemStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Starting) | (Self::Starting, Self::Running | Self::Failed)
        )
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Lifecycle of the boot as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootStatus {
    #[default]
    NotStarted,
    Loading,
    /// Every `init` resolved and wiring either succeeded or was skipped.
    Completed,
    /// Boot aborted before or during wiring.
    Failed,
}

impl BootStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for BootStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::Loading => "loading",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!SystemStatus::Pending.is_terminal());
        assert!(!SystemStatus::Starting.is_terminal());
        assert!(SystemStatus::Running.is_terminal());
        assert!(SystemStatus::Failed.is_terminal());

        assert!(!BootStatus::NotStarted.is_terminal());
        assert!(!BootStatus::Loading.is_terminal());
        assert!(BootStatus::Completed.is_terminal());
        assert!(BootStatus::Failed.is_terminal());
    }

    #[test]
    fn test_allowed_transitions() {
        use SystemStatus::*;
        let all = [Pending, Starting, Running, Failed];
        let allowed: Vec<_> = all
            .iter()
            .flat_map(|from| all.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_become(*to))
            .collect();
        assert_eq!(
            allowed,
            vec![(Pending, Starting), (Starting, Running), (Starting, Failed)]
        );
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&BootStatus::NotStarted).unwrap(), "\"not_started\"");
        assert_eq!(serde_json::to_string(&SystemStatus::Running).unwrap(), "\"running\"");
    }
}
