//! Lifecycle states exposed for introspection.

use std::fmt;

/// Where a wrapper instance's persistent process currently stands.
///
/// Exec-mode instances never leave `Idle`. In persistent mode the first call
/// moves `Idle → Starting → Connected` (or back to `Idle` if the process could
/// not be started); the exit notification moves `Connected → Terminated`; the
/// next call after that starts a fresh process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessState {
    #[default]
    Idle,
    Starting,
    Connected,
    Terminated,
}

impl ProcessState {
    /// True when a new call has to start a process rather than write to one.
    pub fn needs_start(self) -> bool {
        matches!(self, ProcessState::Idle | ProcessState::Terminated)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::Idle => "idle",
            ProcessState::Starting => "starting",
            ProcessState::Connected => "connected",
            ProcessState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Settlement status of one dispatched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallStatus {
    #[default]
    Pending,
    Resolved,
    Rejected,
}

impl CallStatus {
    pub fn is_settled(self) -> bool {
        self != CallStatus::Pending
    }
}
