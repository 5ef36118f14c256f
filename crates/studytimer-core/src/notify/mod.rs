//! Repeating audible alert raised when a phase completes.
//!
//! [`AlertSignal`] owns at most one background task that calls
//! [`Notifier::pulse`] every `repeat_interval` until cancelled. What a pulse
//! sounds like is entirely up to the [`Notifier`] implementation.

mod sound;
#[cfg(feature = "tone")]
mod tone;

pub use sound::{Fallback, Silent, SystemSound, TerminalBell};
#[cfg(feature = "tone")]
pub use tone::Tone;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::NotifyError;
use crate::storage::{AlertBackend, NotificationsConfig};
use crate::timer::TimerConfig;

/// One audible cue. `pulse` may block for the length of the sound.
pub trait Notifier: Send + Sync {
    fn pulse(&self) -> Result<(), NotifyError>;

    /// Called once when the alert is cancelled.
    fn silence(&self) {}
}

struct AlertTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
    notifier: Arc<dyn Notifier>,
}

impl AlertTask {
    fn is_live(&self) -> bool {
        !self.token.is_cancelled() && !self.handle.is_finished()
    }
}

/// Builds the notifier that suits a set of durations.
pub type NotifierFactory = Arc<dyn Fn(&TimerConfig) -> Arc<dyn Notifier> + Send + Sync>;

/// Cancelable repeat-until-acknowledged alert.
pub struct AlertSignal {
    notifier: Mutex<Arc<dyn Notifier>>,
    repeat_interval: Duration,
    active: Mutex<Option<AlertTask>>,
}

impl AlertSignal {
    pub fn new(notifier: Arc<dyn Notifier>, repeat_interval: Duration) -> Self {
        Self {
            notifier: Mutex::new(notifier),
            repeat_interval,
            active: Mutex::new(None),
        }
    }

    /// Use `notifier` from the next [`raise`](Self::raise) on. A running
    /// alert keeps the notifier it was raised with.
    pub fn set_notifier(&self, notifier: Arc<dyn Notifier>) {
        *lock(&self.notifier) = notifier;
    }

    fn notifier(&self) -> Arc<dyn Notifier> {
        lock(&self.notifier).clone()
    }

    /// Start repeating the alert. No-op while an alert is already active.
    ///
    /// Must be called from within a tokio runtime.
    pub fn raise(&self) {
        let mut active = self.lock();
        if active.as_ref().is_some_and(AlertTask::is_live) {
            return;
        }
        let token = CancellationToken::new();
        let notifier = self.notifier();
        let handle = tokio::spawn(alert_loop(
            Arc::clone(&notifier),
            self.repeat_interval,
            token.clone(),
        ));
        *active = Some(AlertTask {
            token,
            handle,
            notifier,
        });
        info!("Alert raised");
    }

    /// Stop repeating. Takes effect at the next pulse boundary at the latest.
    pub fn cancel(&self) {
        let Some(task) = self.lock().take() else {
            return;
        };
        task.token.cancel();
        task.notifier.silence();
        info!("Alert cancelled");
    }

    pub fn is_active(&self) -> bool {
        self.lock().as_ref().is_some_and(AlertTask::is_live)
    }

    fn lock(&self) -> MutexGuard<'_, Option<AlertTask>> {
        lock(&self.active)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Drop for AlertSignal {
    fn drop(&mut self) {
        if let Some(task) = self.lock().take() {
            task.token.cancel();
        }
    }
}

async fn alert_loop(notifier: Arc<dyn Notifier>, repeat_interval: Duration, token: CancellationToken) {
    loop {
        let pulse = tokio::task::spawn_blocking({
            let notifier = Arc::clone(&notifier);
            move || notifier.pulse()
        });

        tokio::select! {
            _ = token.cancelled() => break,
            result = pulse => match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!("Alert pulse failed: {err}"),
                Err(err) => warn!("Alert pulse worker failed: {err}"),
            },
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(repeat_interval) => {}
        }
    }
    debug!("Alert loop exited");
}

/// Build the notifier described by `config`.
///
/// `study_minutes` picks the platform sound, so rebuild it when durations change
/// (see [`notifier_factory`]).
pub fn build_notifier(config: &NotificationsConfig, study_minutes: f64) -> Arc<dyn Notifier> {
    if !config.enabled {
        return Arc::new(Silent);
    }
    match config.backend {
        AlertBackend::None => Arc::new(Silent),
        AlertBackend::Bell => Arc::new(TerminalBell),
        AlertBackend::Auto => match SystemSound::for_platform(study_minutes) {
            Some(sound) => Arc::new(Fallback::new(sound, TerminalBell)),
            None => Arc::new(TerminalBell),
        },
        AlertBackend::Tone => tone_notifier(),
    }
}

/// [`build_notifier`] bound to `config`, for callers that change durations.
pub fn notifier_factory(config: &NotificationsConfig) -> NotifierFactory {
    let config = config.clone();
    Arc::new(move |timer: &TimerConfig| build_notifier(&config, timer.study_minutes()))
}

#[cfg(feature = "tone")]
fn tone_notifier() -> Arc<dyn Notifier> {
    Arc::new(Fallback::new(Tone::default(), TerminalBell))
}

#[cfg(not(feature = "tone"))]
fn tone_notifier() -> Arc<dyn Notifier> {
    warn!("Built without the `tone` feature; using the terminal bell");
    Arc::new(TerminalBell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        pulses: AtomicUsize,
        silenced: AtomicUsize,
    }

    impl Notifier for Counting {
        fn pulse(&self) -> Result<(), NotifyError> {
            self.pulses.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn silence(&self) {
            self.silenced.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Broken;

    impl Notifier for Broken {
        fn pulse(&self) -> Result<(), NotifyError> {
            Err(NotifyError::Unavailable("no speakers".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn raise_repeats_until_cancelled() {
        let counting = Arc::new(Counting::default());
        let signal = AlertSignal::new(counting.clone(), Duration::from_millis(2500));

        signal.raise();
        assert!(signal.is_active());
        tokio::time::sleep(Duration::from_secs(6)).await;
        let pulses = counting.pulses.load(Ordering::SeqCst);
        assert!(pulses >= 1, "expected at least one pulse, got {pulses}");

        signal.cancel();
        assert!(!signal.is_active());
        assert_eq!(counting.silenced.load(Ordering::SeqCst), 1);
        let after_cancel = counting.pulses.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counting.pulses.load(Ordering::SeqCst), after_cancel);
    }

    #[tokio::test(start_paused = true)]
    async fn raise_while_active_is_noop() {
        let counting = Arc::new(Counting::default());
        let signal = AlertSignal::new(counting.clone(), Duration::from_millis(2500));
        signal.raise();
        signal.raise();
        signal.raise();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        // One loop means one immediate pulse, not three.
        assert_eq!(counting.pulses.load(Ordering::SeqCst), 1);
        signal.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_without_raise_is_noop() {
        let counting = Arc::new(Counting::default());
        let signal = AlertSignal::new(counting.clone(), Duration::from_millis(2500));
        signal.cancel();
        assert_eq!(counting.silenced.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_notifier_keeps_signal_alive() {
        let signal = AlertSignal::new(Arc::new(Broken), Duration::from_millis(2500));
        signal.raise();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(signal.is_active());
        signal.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn replaced_notifier_sounds_from_next_raise() {
        let first = Arc::new(Counting::default());
        let second = Arc::new(Counting::default());
        let signal = AlertSignal::new(first.clone(), Duration::from_millis(2500));

        signal.raise();
        tokio::time::sleep(Duration::from_millis(100)).await;
        signal.set_notifier(second.clone());
        signal.cancel();
        assert_eq!(first.silenced.load(Ordering::SeqCst), 1);
        assert_eq!(second.silenced.load(Ordering::SeqCst), 0);

        signal.raise();
        tokio::time::sleep(Duration::from_millis(100)).await;
        signal.cancel();
        assert_eq!(first.pulses.load(Ordering::SeqCst), 1);
        assert_eq!(second.pulses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disabled_notifications_are_silent() {
        let config = NotificationsConfig {
            enabled: false,
            ..NotificationsConfig::default()
        };
        assert!(build_notifier(&config, 25.0).pulse().is_ok());
    }
}
