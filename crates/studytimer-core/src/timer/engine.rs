//! Timer engine implementation.
//!
//! The timer engine is a pure state machine. It owns no threads and reads no
//! clock: every command takes the caller's monotonic `now_ms` and returns the
//! events it produced. The controller drives `tick()` once per second while
//! the engine is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> Completed -> (switch) -> Running
//!   any -> Stopped (partial credit flushed)
//!   any -> Idle    (reset, phase forced to Study)
//! ```
//!
//! Phase (`Study` / `Break`) is orthogonal to the run state.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerConfig::default());
//! engine.start(clock.now_ms());
//! // Once per second:
//! for event in engine.tick(clock.now_ms()) { /* apply credit, raise alert */ }
//! ```

use serde::{Deserialize, Serialize};

use super::preset::{Phase, TimerConfig};
use crate::error::EngineError;
use crate::events::{Credit, Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Paused,
    /// Countdown hit zero; the next phase is loaded and awaits the user.
    Completed,
    /// Abandoned by the user; remaining time is kept but credit was flushed.
    Stopped,
}

/// Core timer engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    config: TimerConfig,
    phase: Phase,
    run_state: RunState,
    /// Whole seconds left in the current phase.
    remaining_secs: u64,
    /// Monotonic ms at which the current study phase first started counting.
    /// Cleared once that phase's credit has been handed out.
    #[serde(default)]
    session_started_at_ms: Option<u64>,
}

impl TimerEngine {
    /// Create a new engine in `Idle` with a full study phase loaded.
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            phase: Phase::Study,
            run_state: RunState::Idle,
            remaining_secs: config.duration_secs(Phase::Study),
            session_started_at_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn session_started_at_ms(&self) -> Option<u64> {
        self.session_started_at_ms
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin or resume counting down the loaded phase. No-op while running.
    pub fn start(&mut self, now_ms: u64) -> Vec<Event> {
        if self.run_state == RunState::Running {
            return Vec::new();
        }
        if self.remaining_secs == 0 {
            self.remaining_secs = self.config.duration_secs(self.phase);
        }
        if self.phase == Phase::Study && self.session_started_at_ms.is_none() {
            self.session_started_at_ms = Some(now_ms);
        }
        self.run_state = RunState::Running;
        vec![Event::PhaseStarted {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
        }]
    }

    /// Suspend the countdown. Partial credit is kept provisionally.
    pub fn pause(&mut self) -> Vec<Event> {
        if self.run_state != RunState::Running {
            return Vec::new();
        }
        self.run_state = RunState::Paused;
        vec![Event::Paused {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
        }]
    }

    /// Abandon the current phase without advancing it.
    pub fn stop(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        self.flush_partial(now_ms, &mut events);
        self.run_state = RunState::Stopped;
        events.push(Event::Stopped {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
        });
        events
    }

    /// Back to a full, idle study phase.
    pub fn reset(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        self.flush_partial(now_ms, &mut events);
        self.phase = Phase::Study;
        self.remaining_secs = self.config.duration_secs(Phase::Study);
        self.run_state = RunState::Idle;
        events.push(Event::Reset {
            remaining_secs: self.remaining_secs,
        });
        events
    }

    pub fn switch_to_break(&mut self, now_ms: u64) -> Vec<Event> {
        self.switch_to(Phase::Break, now_ms)
    }

    pub fn switch_to_study(&mut self, now_ms: u64) -> Vec<Event> {
        self.switch_to(Phase::Study, now_ms)
    }

    /// Load `target` at full length and start it immediately.
    pub fn switch_to(&mut self, target: Phase, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        self.flush_partial(now_ms, &mut events);
        let from = self.phase;
        self.phase = target;
        self.remaining_secs = self.config.duration_secs(target);
        self.run_state = RunState::Idle;
        events.push(Event::PhaseSwitched { from, to: target });
        events.extend(self.start(now_ms));
        events
    }

    /// Replace the durations. Rejected while running; otherwise resets.
    pub fn set_config(&mut self, config: TimerConfig, now_ms: u64) -> Result<Vec<Event>, EngineError> {
        if self.run_state == RunState::Running {
            return Err(EngineError::Busy);
        }
        // Flush with the old duration before it is replaced.
        let mut events = Vec::new();
        self.flush_partial(now_ms, &mut events);
        self.config = config;
        events.push(Event::ConfigChanged { config });
        events.extend(self.reset(now_ms));
        Ok(events)
    }

    /// Advance the countdown by one second. Call once per tick while running.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        if self.run_state != RunState::Running {
            return Vec::new();
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return Vec::new();
        }
        self.complete(now_ms)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self, now_ms: u64) -> Vec<Event> {
        let finished = self.phase;
        let next = finished.other();
        let mut events = vec![Event::PhaseCompleted {
            phase: finished,
            next,
        }];

        if finished == Phase::Study {
            self.session_started_at_ms = None;
            events.push(Event::SessionCredited {
                credit: Credit::Full {
                    minutes: self.config.study_minutes(),
                },
            });
        }

        self.phase = next;
        self.remaining_secs = self.config.duration_secs(next);
        self.run_state = RunState::Completed;

        if self.config.auto_advance() {
            events.extend(self.start(now_ms));
        }
        events
    }

    /// Hand out credit for an abandoned study phase, at most once.
    fn flush_partial(&mut self, now_ms: u64, events: &mut Vec<Event>) {
        if self.phase != Phase::Study {
            return;
        }
        let Some(started) = self.session_started_at_ms.take() else {
            return;
        };
        let elapsed_ms = now_ms.saturating_sub(started);
        events.push(Event::SessionCredited {
            credit: Credit::Partial {
                elapsed_minutes: elapsed_ms as f64 / 60_000.0,
                study_minutes: self.config.study_minutes(),
            },
        });
    }
}
