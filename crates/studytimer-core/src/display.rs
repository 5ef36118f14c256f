//! Display sink contract.
//!
//! The controller pushes a [`Snapshot`] on every tick and every transition.
//! Sinks only observe; they never reach back into timer state.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::storage::DailyRecord;
use crate::timer::{Phase, RunState, TimerEngine};

/// Everything a presentation layer needs to render the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub run_state: RunState,
    pub remaining_secs: u64,
    pub running: bool,
    pub completed_sessions: f64,
    pub total_study_minutes: f64,
}

impl Snapshot {
    pub fn capture(engine: &TimerEngine, record: &DailyRecord) -> Self {
        Self {
            phase: engine.phase(),
            run_state: engine.run_state(),
            remaining_secs: engine.remaining_secs(),
            running: engine.is_running(),
            completed_sessions: record.completed_sessions,
            total_study_minutes: record.total_study_minutes,
        }
    }

    /// `MM:SS` of the remaining time.
    pub fn clock_face(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_secs / 60,
            self.remaining_secs % 60
        )
    }
}

/// Push-only receiver of snapshots.
pub trait DisplaySink: Send + Sync {
    fn publish(&self, snapshot: &Snapshot);
}

/// Discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn publish(&self, _snapshot: &Snapshot) {}
}

/// Keeps the latest snapshot in a `watch` channel for any number of readers.
#[derive(Debug)]
pub struct WatchSink {
    tx: watch::Sender<Option<Snapshot>>,
}

impl WatchSink {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot>> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> Option<Snapshot> {
        self.tx.borrow().clone()
    }
}

impl Default for WatchSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for WatchSink {
    fn publish(&self, snapshot: &Snapshot) {
        self.tx.send_replace(Some(snapshot.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerConfig;

    #[test]
    fn clock_face_pads_minutes_and_seconds() {
        let engine = TimerEngine::new(TimerConfig::default());
        let mut snap = Snapshot::capture(&engine, &DailyRecord::default());
        assert_eq!(snap.clock_face(), "25:00");
        snap.remaining_secs = 65;
        assert_eq!(snap.clock_face(), "01:05");
    }

    #[test]
    fn watch_sink_keeps_latest_without_subscribers() {
        let sink = WatchSink::new();
        assert!(sink.latest().is_none());
        let engine = TimerEngine::new(TimerConfig::default());
        let snap = Snapshot::capture(&engine, &DailyRecord::default());
        sink.publish(&snap);
        assert_eq!(sink.latest(), Some(snap));
    }
}
