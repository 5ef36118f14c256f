mod engine;
mod preset;

pub use engine::{RunState, TimerEngine};
pub use preset::{Phase, Preset, TimerConfig};
