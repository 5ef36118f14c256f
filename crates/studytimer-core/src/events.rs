use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TimerConfig};

/// Accounting request emitted by the engine for the session accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Credit {
    /// A study phase ran to zero.
    Full { minutes: f64 },
    /// A study phase was abandoned after `elapsed_minutes` of wall time.
    Partial {
        elapsed_minutes: f64,
        study_minutes: f64,
    },
}

/// Every state change of the engine produces one or more events.
/// The controller applies credits, raises alerts, and logs the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PhaseStarted {
        phase: Phase,
        remaining_secs: u64,
    },
    Paused {
        phase: Phase,
        remaining_secs: u64,
    },
    Stopped {
        phase: Phase,
        remaining_secs: u64,
    },
    Reset {
        remaining_secs: u64,
    },
    PhaseSwitched {
        from: Phase,
        to: Phase,
    },
    /// The countdown reached zero; `next` is loaded and waiting.
    PhaseCompleted {
        phase: Phase,
        next: Phase,
    },
    SessionCredited {
        credit: Credit,
    },
    ConfigChanged {
        config: TimerConfig,
    },
}

impl Event {
    pub fn credit(&self) -> Option<Credit> {
        match self {
            Event::SessionCredited { credit } => Some(*credit),
            _ => None,
        }
    }

    pub fn is_phase_completed(&self) -> bool {
        matches!(self, Event::PhaseCompleted { .. })
    }
}
