use std::time::Duration;

use rodio::source::{SineWave, Source};
use rodio::{OutputStream, Sink};

use super::Notifier;
use crate::error::NotifyError;

/// Short synthesised beep on the default output device.
///
/// The output stream is opened per pulse because it is not `Send`.
#[derive(Debug, Clone)]
pub struct Tone {
    frequency: f32,
    length: Duration,
    volume: f32,
}

impl Tone {
    pub fn new(frequency: f32, length: Duration, volume: f32) -> Self {
        Self {
            frequency,
            length,
            volume: volume.clamp(0.0, 1.0),
        }
    }
}

impl Default for Tone {
    fn default() -> Self {
        Self::new(1000.0, Duration::from_millis(200), 0.3)
    }
}

impl Notifier for Tone {
    fn pulse(&self) -> Result<(), NotifyError> {
        let (_stream, handle) = OutputStream::try_default()
            .map_err(|e| NotifyError::Unavailable(format!("audio output stream: {e}")))?;
        let sink = Sink::try_new(&handle)
            .map_err(|e| NotifyError::Unavailable(format!("audio sink: {e}")))?;
        sink.append(
            SineWave::new(self.frequency)
                .take_duration(self.length)
                .amplify(self.volume),
        );
        sink.sleep_until_end();
        Ok(())
    }
}
