//! Today's study ledger.
//!
//! The accumulator owns the [`DailyRecord`] for the date fixed at startup and
//! turns engine credits into counter updates. Every update is saved right
//! away; a failed save drops to in-memory bookkeeping for the rest of the
//! process so the timer keeps working.

use chrono::NaiveDate;
use log::{info, warn};

use crate::events::Credit;
use crate::storage::daily::date_key;
use crate::storage::{DailyRecord, DailyStore};

#[derive(Debug)]
pub struct SessionAccumulator {
    date: NaiveDate,
    record: DailyRecord,
    store: Option<DailyStore>,
}

impl SessionAccumulator {
    /// Load `date`'s record from `store`.
    pub fn open(store: DailyStore, date: NaiveDate) -> Self {
        let record = store.load(date);
        Self {
            date,
            record,
            store: Some(store),
        }
    }

    /// Accumulator that never touches disk.
    pub fn in_memory(date: NaiveDate) -> Self {
        Self {
            date,
            record: DailyRecord::default(),
            store: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn record(&self) -> &DailyRecord {
        &self.record
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    pub fn apply(&mut self, credit: Credit) {
        match credit {
            Credit::Full { minutes } => self.credit_full_session(minutes),
            Credit::Partial {
                elapsed_minutes,
                study_minutes,
            } => {
                self.credit_partial_session(elapsed_minutes, study_minutes);
            }
        }
    }

    /// A study phase ran to zero.
    pub fn credit_full_session(&mut self, duration_minutes: f64) {
        self.record.completed_sessions += 1.0;
        self.record.total_study_minutes += duration_minutes;
        info!(
            "Session completed: {:.2} sessions, {:.2} minutes today",
            self.record.completed_sessions, self.record.total_study_minutes
        );
        self.persist();
    }

    /// A study phase was abandoned. Elapsed time is clamped to the study
    /// duration; returns the fractional session credit applied.
    pub fn credit_partial_session(&mut self, elapsed_minutes: f64, study_minutes: f64) -> f64 {
        let elapsed = elapsed_minutes.clamp(0.0, study_minutes);
        let fraction = if study_minutes > 0.0 {
            elapsed / study_minutes
        } else {
            0.0
        };
        self.record.total_study_minutes += elapsed;
        self.record.completed_sessions += fraction;
        info!("Added {elapsed:.2} minutes and {fraction:.2} session credit");
        self.persist();
        fraction
    }

    /// Final save, e.g. on shutdown.
    pub fn flush(&mut self) {
        self.persist();
    }

    fn persist(&mut self) {
        self.record.touch();
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if let Err(err) = store.save(self.date, &self.record) {
            warn!(
                "Could not save {} ({err}); keeping today's record in memory only",
                date_key(self.date)
            );
            self.store = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn full_session_adds_one_and_duration() {
        let mut acc = SessionAccumulator::in_memory(today());
        acc.credit_full_session(25.0);
        assert_eq!(acc.record().completed_sessions, 1.0);
        assert_eq!(acc.record().total_study_minutes, 25.0);
        assert!(acc.record().last_updated.is_some());
    }

    #[test]
    fn partial_credit_is_proportional() {
        let mut acc = SessionAccumulator::in_memory(today());
        let fraction = acc.credit_partial_session(5.0, 25.0);
        assert!((fraction - 0.2).abs() < 1e-9);
        assert!((acc.record().completed_sessions - 0.2).abs() < 1e-9);
        assert!((acc.record().total_study_minutes - 5.0).abs() < 1e-9);
    }

    #[test]
    fn partial_credit_is_clamped() {
        let mut acc = SessionAccumulator::in_memory(today());
        assert_eq!(acc.credit_partial_session(40.0, 25.0), 1.0);
        assert_eq!(acc.record().total_study_minutes, 25.0);
        assert_eq!(acc.credit_partial_session(-3.0, 25.0), 0.0);
        assert_eq!(acc.record().completed_sessions, 1.0);
    }

    #[test]
    fn credits_are_saved_and_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let store = DailyStore::new(dir.path().join("data.json"));
        let mut acc = SessionAccumulator::open(store.clone(), today());
        acc.apply(Credit::Full { minutes: 25.0 });
        acc.apply(Credit::Partial {
            elapsed_minutes: 12.5,
            study_minutes: 25.0,
        });

        let reopened = SessionAccumulator::open(store, today());
        assert_eq!(reopened.record().completed_sessions, 1.5);
        assert_eq!(reopened.record().total_study_minutes, 37.5);
    }

    #[test]
    fn failed_save_degrades_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes every write fail.
        let path = dir.path().join("data.json");
        std::fs::create_dir(&path).unwrap();

        let mut acc = SessionAccumulator::open(DailyStore::new(&path), today());
        assert!(acc.is_persistent());
        acc.credit_full_session(25.0);
        assert!(!acc.is_persistent());
        acc.credit_full_session(25.0);
        assert_eq!(acc.record().completed_sessions, 2.0);
    }
}
