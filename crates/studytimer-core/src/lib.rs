//! # Studytimer Core Library
//!
//! Business logic for a two-phase study/break countdown timer. The CLI binary
//! is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a pure state machine. Every operation takes the current
//!   monotonic time and returns the [`Event`]s it caused; nothing here sleeps.
//! - **Controller**: drives the engine from a single tokio countdown task and
//!   routes credits, alerts and display snapshots.
//! - **Storage**: one JSON ledger keyed by calendar date, plus TOML configuration.
//! - **Notify**: a repeating, cancelable audible alert with pluggable backends.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`TimerController`]: async owner of the countdown and alert tasks
//! - [`SessionAccumulator`]: today's counters and their persistence
//! - [`DailyStore`]: date-keyed record file
//! - [`Config`]: application configuration management

pub mod accumulator;
pub mod clock;
pub mod controller;
pub mod display;
pub mod error;
pub mod events;
pub mod notify;
pub mod storage;
pub mod timer;

pub use accumulator::SessionAccumulator;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use controller::TimerController;
pub use display::{DisplaySink, NullSink, Snapshot, WatchSink};
pub use error::{ConfigError, CoreError, EngineError, NotifyError, StorageError};
pub use events::{Credit, Event};
pub use notify::{build_notifier, notifier_factory, AlertSignal, Notifier, NotifierFactory};
pub use storage::{Config, DailyRecord, DailyStore};
pub use timer::{Phase, Preset, RunState, TimerConfig, TimerEngine};
