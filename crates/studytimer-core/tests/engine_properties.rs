//! Property tests for the pure engine and the daily ledger.

use chrono::NaiveDate;
use proptest::prelude::*;
use studytimer_core::{
    Credit, DailyRecord, DailyStore, Phase, SessionAccumulator, TimerConfig, TimerEngine,
};
use tempfile::TempDir;

/// Apply every credit in `events` to `acc`.
fn settle(acc: &mut SessionAccumulator, events: Vec<studytimer_core::Event>) {
    for credit in events.iter().filter_map(studytimer_core::Event::credit) {
        acc.apply(credit);
    }
}

fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Days::new(offset as u64)
}

/// Multiples of 0.25; these survive a JSON text round trip exactly.
fn quarters(max: u32) -> impl Strategy<Value = f64> {
    (0..max).prop_map(|n| f64::from(n) / 4.0)
}

proptest! {
    #[test]
    fn reset_loads_whole_study_seconds(study_secs in 1u64..100_000, brk in 0.02f64..60.0) {
        // `n / 60` minutes often lands a hair under `n` seconds in f64.
        let config = TimerConfig::new(study_secs as f64 / 60.0, brk).unwrap();
        let mut engine = TimerEngine::new(config);
        engine.start(0);
        engine.tick(1000);
        engine.reset(2000);
        prop_assert_eq!(engine.phase(), Phase::Study);
        prop_assert_eq!(engine.remaining_secs(), study_secs);
    }

    #[test]
    fn sub_second_remainders_are_dropped(whole in 1u64..10_000, frac in 0.01f64..0.99) {
        let config = TimerConfig::new((whole as f64 + frac) / 60.0, 1.0).unwrap();
        prop_assert_eq!(config.duration_secs(Phase::Study), whole);
    }

    #[test]
    fn natural_completion_credits_exactly_one_session(study in 0.02f64..30.0) {
        let config = TimerConfig::new(study, 1.0).unwrap();
        let mut engine = TimerEngine::new(config);
        let mut acc = SessionAccumulator::in_memory(day(0));

        let mut now = 0;
        settle(&mut acc, engine.start(now));
        while engine.is_running() {
            now += 1000;
            settle(&mut acc, engine.tick(now));
        }
        // Abandoning the loaded break afterwards must not add anything.
        settle(&mut acc, engine.stop(now + 5000));

        prop_assert_eq!(acc.record().completed_sessions, 1.0);
        prop_assert_eq!(acc.record().total_study_minutes, study);
    }

    #[test]
    fn stop_after_k_seconds_credits_k_over_sixty(k in 1u64..1500) {
        let mut engine = TimerEngine::new(TimerConfig::default());
        let mut acc = SessionAccumulator::in_memory(day(0));

        settle(&mut acc, engine.start(0));
        for s in 1..=k {
            settle(&mut acc, engine.tick(s * 1000));
        }
        settle(&mut acc, engine.stop(k * 1000));
        settle(&mut acc, engine.stop(k * 1000 + 1000));

        let minutes = k as f64 / 60.0;
        prop_assert!((acc.record().total_study_minutes - minutes).abs() < 1e-9);
        prop_assert!((acc.record().completed_sessions - minutes / 25.0).abs() < 1e-9);
    }

    #[test]
    fn partial_fraction_stays_within_unit_interval(
        elapsed in -10.0f64..500.0,
        study in 0.1f64..120.0,
    ) {
        let mut acc = SessionAccumulator::in_memory(day(0));
        let fraction = acc.credit_partial_session(elapsed, study);
        prop_assert!((0.0..=1.0).contains(&fraction));
        prop_assert!(acc.record().total_study_minutes <= study);
    }

    #[test]
    fn saving_one_date_leaves_others_untouched(
        a_sessions in quarters(80),
        a_minutes in quarters(2400),
        b_sessions in quarters(80),
        b_minutes in quarters(2400),
        gap in 1u32..400,
    ) {
        let dir = TempDir::new().unwrap();
        let store = DailyStore::new(dir.path().join("data.json"));
        let first = DailyRecord {
            completed_sessions: a_sessions,
            total_study_minutes: a_minutes,
            last_updated: None,
        };
        let second = DailyRecord {
            completed_sessions: b_sessions,
            total_study_minutes: b_minutes,
            last_updated: None,
        };

        store.save(day(0), &first).unwrap();
        store.save(day(gap), &second).unwrap();

        prop_assert_eq!(store.load(day(0)), first);
        prop_assert_eq!(store.load(day(gap)), second);
    }
}

#[test]
fn partial_credit_is_never_taken_from_break() {
    let mut engine = TimerEngine::new(TimerConfig::default());
    engine.switch_to_break(0);
    let events = engine.stop(120_000);
    assert!(events.iter().filter_map(studytimer_core::Event::credit).next().is_none());
}

#[test]
fn full_credit_carries_study_minutes() {
    let config = TimerConfig::new(50.0, 10.0).unwrap();
    let mut engine = TimerEngine::new(config);
    engine.start(0);
    let mut credits = Vec::new();
    let mut now = 0;
    while engine.is_running() {
        now += 1000;
        credits.extend(engine.tick(now).iter().filter_map(studytimer_core::Event::credit));
    }
    assert_eq!(credits, vec![Credit::Full { minutes: 50.0 }]);
}
