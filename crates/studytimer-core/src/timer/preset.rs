use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Study,
    Break,
}

impl Phase {
    pub fn other(self) -> Phase {
        match self {
            Phase::Study => Phase::Break,
            Phase::Break => Phase::Study,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Study => "Study",
            Phase::Break => "Break",
        }
    }
}

/// Study/break durations for the engine.
///
/// Built only through [`TimerConfig::new`] or a [`Preset`], so the engine can
/// assume both durations are at least one whole second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    study_minutes: f64,
    break_minutes: f64,
    /// Start the next phase as soon as the current one completes.
    #[serde(default)]
    auto_advance: bool,
}

impl TimerConfig {
    pub fn new(study_minutes: f64, break_minutes: f64) -> Result<Self, ConfigError> {
        validate_minutes("timer.study_minutes", study_minutes)?;
        validate_minutes("timer.break_minutes", break_minutes)?;
        Ok(Self {
            study_minutes,
            break_minutes,
            auto_advance: false,
        })
    }

    pub fn with_auto_advance(mut self, auto_advance: bool) -> Self {
        self.auto_advance = auto_advance;
        self
    }

    pub fn study_minutes(&self) -> f64 {
        self.study_minutes
    }

    pub fn break_minutes(&self) -> f64 {
        self.break_minutes
    }

    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    pub fn minutes(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Study => self.study_minutes,
            Phase::Break => self.break_minutes,
        }
    }

    /// Full countdown for `phase`, floored to whole seconds.
    pub fn duration_secs(&self, phase: Phase) -> u64 {
        minutes_to_secs(self.minutes(phase))
    }
}

impl TimerConfig {
    /// Durations known to be valid at compile time.
    const fn fixed(study_minutes: f64, break_minutes: f64) -> Self {
        Self {
            study_minutes,
            break_minutes,
            auto_advance: false,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        CLASSIC
    }
}

const CLASSIC: TimerConfig = TimerConfig::fixed(25.0, 5.0);
const EXTENDED: TimerConfig = TimerConfig::fixed(50.0, 10.0);
const TEST: TimerConfig = TimerConfig::fixed(5.0 / 60.0, 5.0 / 60.0);

/// Slack for products like `4.1 * 60.0` that land just under a whole second.
const SECOND_EPSILON: f64 = 1e-6;

fn minutes_to_secs(minutes: f64) -> u64 {
    (minutes * 60.0 + SECOND_EPSILON).floor() as u64
}

fn validate_minutes(key: &str, minutes: f64) -> Result<(), ConfigError> {
    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("{minutes} must be a positive number of minutes"),
        });
    }
    if minutes_to_secs(minutes) == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("{minutes} minutes is shorter than one second"),
        });
    }
    Ok(())
}

/// Named duration pairs offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// 25 minutes of study, 5 minutes of break.
    #[default]
    Classic,
    /// 50 minutes of study, 10 minutes of break.
    Extended,
    /// 5 seconds each, for trying the flow quickly.
    Test,
    /// Durations taken from `timer.study_minutes` / `timer.break_minutes`.
    Custom,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Classic, Preset::Extended, Preset::Test, Preset::Custom];

    /// Durations of a fixed preset, or `None` for `Custom`, whose durations
    /// live in the user's config (see [`crate::storage::Config::timer_config`]).
    pub fn config(self) -> Option<TimerConfig> {
        match self {
            Preset::Classic => Some(CLASSIC),
            Preset::Extended => Some(EXTENDED),
            Preset::Test => Some(TEST),
            Preset::Custom => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Classic => "classic",
            Preset::Extended => "extended",
            Preset::Test => "test",
            Preset::Custom => "custom",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Preset::Classic => "25 min study / 5 min break",
            Preset::Extended => "50 min study / 10 min break",
            Preset::Test => "5 sec study / 5 sec break",
            Preset::Custom => "durations from timer.study_minutes / timer.break_minutes",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" | "25/5" => Ok(Preset::Classic),
            "extended" | "50/10" => Ok(Preset::Extended),
            "test" => Ok(Preset::Test),
            "custom" => Ok(Preset::Custom),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_preset_durations() {
        let cfg = Preset::Classic.config().unwrap();
        assert_eq!(cfg.duration_secs(Phase::Study), 1500);
        assert_eq!(cfg.duration_secs(Phase::Break), 300);
        assert!(!cfg.auto_advance());
    }

    #[test]
    fn test_preset_is_five_seconds() {
        let cfg = Preset::Test.config().unwrap();
        assert_eq!(cfg.duration_secs(Phase::Study), 5);
        assert_eq!(cfg.duration_secs(Phase::Break), 5);
    }

    #[test]
    fn fractional_minutes_floor_to_seconds() {
        let cfg = TimerConfig::new(1.0 / 6.0, 0.0251).unwrap();
        assert_eq!(cfg.duration_secs(Phase::Study), 10);
        assert_eq!(cfg.duration_secs(Phase::Break), 1);
    }

    #[test]
    fn decimal_minutes_keep_their_whole_seconds() {
        let cfg = TimerConfig::new(4.1, 8.2).unwrap();
        assert_eq!(cfg.duration_secs(Phase::Study), 246);
        assert_eq!(cfg.duration_secs(Phase::Break), 492);
        for secs in [7u64, 41, 83, 1234, 99_999] {
            let cfg = TimerConfig::new(secs as f64 / 60.0, 1.0).unwrap();
            assert_eq!(cfg.duration_secs(Phase::Study), secs);
        }
    }

    #[test]
    fn custom_preset_has_no_fixed_durations() {
        assert!(Preset::Custom.config().is_none());
        for preset in [Preset::Classic, Preset::Extended, Preset::Test] {
            assert!(preset.config().is_some(), "{preset} should be fixed");
        }
        assert_eq!(TimerConfig::default(), Preset::Classic.config().unwrap());
    }

    #[test]
    fn rejects_non_positive_and_sub_second_durations() {
        assert!(TimerConfig::new(0.0, 5.0).is_err());
        assert!(TimerConfig::new(25.0, -1.0).is_err());
        assert!(TimerConfig::new(f64::NAN, 5.0).is_err());
        assert!(TimerConfig::new(f64::INFINITY, 5.0).is_err());
        assert!(TimerConfig::new(0.001, 5.0).is_err());
    }

    #[test]
    fn preset_parsing() {
        assert_eq!("25/5".parse::<Preset>().unwrap(), Preset::Classic);
        assert_eq!(" Extended ".parse::<Preset>().unwrap(), Preset::Extended);
        assert_eq!("test".parse::<Preset>().unwrap(), Preset::Test);
        assert!(matches!(
            "90/30".parse::<Preset>(),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn phase_other_flips() {
        assert_eq!(Phase::Study.other(), Phase::Break);
        assert_eq!(Phase::Break.other(), Phase::Study);
    }
}
