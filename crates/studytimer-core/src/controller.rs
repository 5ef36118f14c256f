//! Async driver around the pure [`TimerEngine`].
//!
//! The controller owns the single countdown task and the alert signal. Every
//! user operation runs through the same sequence:
//!
//! 1. take the ticker slot (serialises operations),
//! 2. cancel the running countdown task and wait, bounded, for it to exit,
//! 3. mutate the engine under the state lock and apply its events,
//! 4. spawn a fresh countdown task if the engine is running.
//!
//! The countdown task re-checks its token after acquiring the state lock, so
//! a cancelled task never decrements the remaining time even when the bounded
//! wait gives up on it.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::accumulator::SessionAccumulator;
use crate::clock::{Clock, MonotonicClock};
use crate::display::{DisplaySink, Snapshot};
use crate::error::{EngineError, Result};
use crate::events::Event;
use crate::notify::{notifier_factory, AlertSignal, NotifierFactory};
use crate::storage::{Config, DailyRecord, DailyStore};
use crate::timer::{Phase, TimerConfig, TimerEngine};

const TICK_INTERVAL: Duration = Duration::from_secs(1);
/// How long an operation waits for the previous countdown task to exit.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

struct TimerCore {
    engine: TimerEngine,
    accumulator: SessionAccumulator,
}

struct Shared {
    core: Mutex<TimerCore>,
    alert: AlertSignal,
    sink: Arc<dyn DisplaySink>,
    clock: Arc<dyn Clock>,
}

impl Shared {
    fn apply(&self, core: &mut TimerCore, events: Vec<Event>) {
        for event in events {
            debug!("{event:?}");
            match event {
                Event::SessionCredited { credit } => core.accumulator.apply(credit),
                Event::PhaseCompleted { phase, next } => {
                    info!("{} phase completed; {} is next", phase.label(), next.label());
                    self.alert.raise();
                }
                Event::PhaseStarted {
                    phase,
                    remaining_secs,
                } => info!("{} phase running, {remaining_secs}s left", phase.label()),
                _ => {}
            }
        }
    }

    fn publish(&self, core: &TimerCore) -> Snapshot {
        let snapshot = Snapshot::capture(&core.engine, core.accumulator.record());
        self.sink.publish(&snapshot);
        snapshot
    }
}

struct Ticker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Cloneable handle; clones drive the same timer.
#[derive(Clone)]
pub struct TimerController {
    shared: Arc<Shared>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    /// Rebuilds the alert's notifier after a duration change.
    retune: Option<NotifierFactory>,
}

impl TimerController {
    pub fn new(
        config: TimerConfig,
        accumulator: SessionAccumulator,
        alert: AlertSignal,
        sink: Arc<dyn DisplaySink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let core = TimerCore {
            engine: TimerEngine::new(config),
            accumulator,
        };
        sink.publish(&Snapshot::capture(&core.engine, core.accumulator.record()));

        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(core),
                alert,
                sink,
                clock,
            }),
            ticker: Arc::new(Mutex::new(None)),
            retune: None,
        }
    }

    /// Swap in a notifier from `factory` whenever [`set_config`](Self::set_config)
    /// changes the durations.
    pub fn with_notifier_factory(mut self, factory: NotifierFactory) -> Self {
        self.retune = Some(factory);
        self
    }

    /// Wire a controller from user configuration: preset durations, alert
    /// backend and the ledger entry for `date`.
    ///
    /// A ledger location that cannot be resolved degrades to in-memory totals.
    pub fn from_config(config: &Config, date: NaiveDate, sink: Arc<dyn DisplaySink>) -> Result<Self> {
        let timer_config = config.timer_config()?;
        let accumulator = match config.data_file() {
            Ok(path) => SessionAccumulator::open(DailyStore::new(path), date),
            Err(err) => {
                warn!("No ledger location ({err}); totals will not be saved");
                SessionAccumulator::in_memory(date)
            }
        };
        let factory = notifier_factory(&config.notifications);
        let alert = AlertSignal::new(factory(&timer_config), config.notifications.repeat_interval());
        Ok(Self::new(
            timer_config,
            accumulator,
            alert,
            sink,
            Arc::new(MonotonicClock::new()),
        )
        .with_notifier_factory(factory))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn snapshot(&self) -> Snapshot {
        let core = self.shared.core.lock().await;
        Snapshot::capture(&core.engine, core.accumulator.record())
    }

    pub async fn record(&self) -> DailyRecord {
        self.shared.core.lock().await.accumulator.record().clone()
    }

    pub async fn config(&self) -> TimerConfig {
        *self.shared.core.lock().await.engine.config()
    }

    pub fn alert_active(&self) -> bool {
        self.shared.alert.is_active()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or resume the loaded phase. No-op while already running.
    pub async fn start(&self) -> Snapshot {
        if self.shared.core.lock().await.engine.is_running() {
            return self.snapshot().await;
        }
        self.transition(|engine, now| Ok(engine.start(now)))
            .await
            .unwrap_or_else(|(_, snapshot)| snapshot)
    }

    pub async fn pause(&self) -> Snapshot {
        self.transition(|engine, _| Ok(engine.pause()))
            .await
            .unwrap_or_else(|(_, snapshot)| snapshot)
    }

    pub async fn stop(&self) -> Snapshot {
        self.transition(|engine, now| Ok(engine.stop(now)))
            .await
            .unwrap_or_else(|(_, snapshot)| snapshot)
    }

    pub async fn reset(&self) -> Snapshot {
        self.transition(|engine, now| Ok(engine.reset(now)))
            .await
            .unwrap_or_else(|(_, snapshot)| snapshot)
    }

    pub async fn switch_to_break(&self) -> Snapshot {
        self.switch_to(Phase::Break).await
    }

    pub async fn switch_to_study(&self) -> Snapshot {
        self.switch_to(Phase::Study).await
    }

    async fn switch_to(&self, phase: Phase) -> Snapshot {
        self.transition(|engine, now| Ok(engine.switch_to(phase, now)))
            .await
            .unwrap_or_else(|(_, snapshot)| snapshot)
    }

    /// Change durations. Rejected while the countdown is running.
    pub async fn set_config(&self, config: TimerConfig) -> Result<Snapshot, EngineError> {
        if self.shared.core.lock().await.engine.is_running() {
            return Err(EngineError::Busy);
        }
        let snapshot = self
            .transition(|engine, now| engine.set_config(config, now))
            .await
            .map_err(|(err, _)| err)?;
        if let Some(factory) = &self.retune {
            self.shared.alert.set_notifier(factory(&config));
        }
        Ok(snapshot)
    }

    /// Stop both background tasks, credit the open session, and save.
    pub async fn shutdown(&self) {
        let mut ticker = self.ticker.lock().await;
        retire(&mut ticker).await;
        self.shared.alert.cancel();
        let mut core = self.shared.core.lock().await;
        let now = self.shared.clock.now_ms();
        let events = core.engine.stop(now);
        self.shared.apply(&mut core, events);
        core.accumulator.flush();
        self.shared.publish(&core);
        info!("Timer shut down");
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn transition<F>(&self, op: F) -> Result<Snapshot, (EngineError, Snapshot)>
    where
        F: FnOnce(&mut TimerEngine, u64) -> Result<Vec<Event>, EngineError>,
    {
        let mut ticker = self.ticker.lock().await;
        retire(&mut ticker).await;

        let (result, snapshot, running) = {
            let mut core = self.shared.core.lock().await;
            let now = self.shared.clock.now_ms();
            match op(&mut core.engine, now) {
                Ok(events) => {
                    self.shared.alert.cancel();
                    self.shared.apply(&mut core, events);
                    (Ok(()), self.shared.publish(&core), core.engine.is_running())
                }
                Err(err) => {
                    let snapshot = Snapshot::capture(&core.engine, core.accumulator.record());
                    (Err(err), snapshot, core.engine.is_running())
                }
            }
        };

        if running {
            *ticker = Some(self.spawn_ticker());
        }
        match result {
            Ok(()) => Ok(snapshot),
            Err(err) => Err((err, snapshot)),
        }
    }

    fn spawn_ticker(&self) -> Ticker {
        let token = CancellationToken::new();
        let handle = tokio::spawn(countdown_loop(Arc::clone(&self.shared), token.clone()));
        Ticker { token, handle }
    }
}

/// Cancel the countdown task in `slot` and wait for it, at most `DRAIN_TIMEOUT`.
async fn retire(slot: &mut Option<Ticker>) {
    let Some(ticker) = slot.take() else {
        return;
    };
    ticker.token.cancel();
    match time::timeout(DRAIN_TIMEOUT, ticker.handle).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!("Countdown task ended abnormally: {err}"),
        Err(_) => warn!("Countdown task still draining after {DRAIN_TIMEOUT:?}; continuing"),
    }
}

async fn countdown_loop(shared: Arc<Shared>, token: CancellationToken) {
    let mut interval = time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }

        let mut core = shared.core.lock().await;
        if token.is_cancelled() {
            break;
        }
        let now = shared.clock.now_ms();
        let events = core.engine.tick(now);
        shared.apply(&mut core, events);
        shared.publish(&core);
        if !core.engine.is_running() {
            break;
        }
    }
    debug!("Countdown loop exited");
}
