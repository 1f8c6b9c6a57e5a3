//! Worker lifecycle state machine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::SwError;

/// Unique identifier for a worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(u64);

impl WorkerId {
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Worker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Created, nothing run yet.
    #[default]
    Parsed,
    /// Install event in progress.
    Installing,
    /// Installed, eligible to activate.
    Installed,
    /// Activate event in progress.
    Activating,
    /// Controlling pages; receives fetch events.
    Activated,
    /// Install failed or superseded. Terminal.
    Redundant,
}

impl WorkerState {
    /// Whether fetch events reach a worker in this state.
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Redundant)
    }

    fn allows(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        match (self, next) {
            (Redundant, _) => false,
            (_, Redundant) => true,
            (Parsed, Installing) | (Parsed, Installed) => true,
            (Installing, Installed) => true,
            (Installed, Activating) => true,
            (Activating, Activated) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

/// Current state plus bookkeeping.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: WorkerState,
    skip_waiting: bool,
    changed_at: Instant,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: WorkerState::Parsed,
            skip_waiting: false,
            changed_at: Instant::now(),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Whether the installed worker asked to activate without waiting for old pages to close.
    pub fn skips_waiting(&self) -> bool {
        self.skip_waiting
    }

    pub fn skip_waiting(&mut self) {
        self.skip_waiting = true;
    }

    pub fn changed_at(&self) -> Instant {
        self.changed_at
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition(&mut self, next: WorkerState) -> Result<WorkerState, SwError> {
        if !self.state.allows(next) {
            return Err(SwError::StateError(format!(
                "cannot move from {} to {}",
                self.state, next
            )));
        }
        let previous = self.state;
        self.state = next;
        self.changed_at = Instant::now();
        Ok(previous)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.state(), WorkerState::Parsed);

        lc.transition(WorkerState::Installing).unwrap();
        lc.transition(WorkerState::Installed).unwrap();
        lc.skip_waiting();
        lc.transition(WorkerState::Activating).unwrap();
        let prev = lc.transition(WorkerState::Activated).unwrap();

        assert_eq!(prev, WorkerState::Activating);
        assert!(lc.state().can_intercept_fetch());
        assert!(lc.skips_waiting());
    }

    #[test]
    fn test_cannot_activate_before_install() {
        let mut lc = Lifecycle::new();
        assert!(matches!(
            lc.transition(WorkerState::Activating),
            Err(SwError::StateError(_))
        ));
        assert_eq!(lc.state(), WorkerState::Parsed);
    }

    #[test]
    fn test_redundant_is_terminal() {
        let mut lc = Lifecycle::new();
        lc.transition(WorkerState::Installing).unwrap();
        lc.transition(WorkerState::Redundant).unwrap();

        assert!(lc.state().is_terminal());
        assert!(lc.transition(WorkerState::Installing).is_err());
        assert!(lc.transition(WorkerState::Redundant).is_err());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(WorkerState::Activated.to_string(), "activated");
        assert_eq!(
            serde_json::to_string(&WorkerState::Installing).unwrap(),
            "\"installing\""
        );
    }

    #[test]
    fn test_worker_ids_unique() {
        assert_ne!(WorkerId::new(), WorkerId::new());
    }
}
