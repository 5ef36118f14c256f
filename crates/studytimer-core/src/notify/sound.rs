use std::io::Write;
use std::process::{Command, Stdio};

use log::debug;

use super::Notifier;
use crate::error::NotifyError;

/// Writes BEL to stderr; works in any terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl Notifier for TerminalBell {
    fn pulse(&self) -> Result<(), NotifyError> {
        let mut stderr = std::io::stderr();
        stderr.write_all(b"\x07")?;
        stderr.flush()?;
        Ok(())
    }
}

/// Plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Notifier for Silent {
    fn pulse(&self) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Runs an external player once per pulse.
#[derive(Debug, Clone)]
pub struct SystemSound {
    program: String,
    args: Vec<String>,
}

impl SystemSound {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The stock player for this OS, if there is one.
    ///
    /// On macOS short and 25-minute sessions use "Glass", longer ones "Ping".
    pub fn for_platform(study_minutes: f64) -> Option<Self> {
        if cfg!(target_os = "macos") {
            let sound = if study_minutes <= 0.1 || study_minutes == 25.0 {
                "Glass"
            } else {
                "Ping"
            };
            Some(Self::new(
                "afplay",
                vec![format!("/System/Library/Sounds/{sound}.aiff")],
            ))
        } else if cfg!(target_os = "windows") {
            Some(Self::new(
                "powershell",
                vec![
                    "-NoProfile".into(),
                    "-Command".into(),
                    "[console]::beep(1000,200)".into(),
                ],
            ))
        } else if cfg!(target_os = "linux") {
            Some(Self::new(
                "paplay",
                vec!["/usr/share/sounds/alsa/Front_Left.wav".into()],
            ))
        } else {
            None
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Notifier for SystemSound {
    fn pulse(&self) -> Result<(), NotifyError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| NotifyError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(NotifyError::CommandFailed {
                program: self.program.clone(),
                status: status.to_string(),
            })
        }
    }
}

/// Tries `primary`, and `secondary` when that fails.
#[derive(Debug, Clone)]
pub struct Fallback<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> Fallback<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: Notifier, S: Notifier> Notifier for Fallback<P, S> {
    fn pulse(&self) -> Result<(), NotifyError> {
        match self.primary.pulse() {
            Ok(()) => Ok(()),
            Err(err) => {
                debug!("Primary alert failed ({err}); falling back");
                self.secondary.pulse()
            }
        }
    }

    fn silence(&self) {
        self.primary.silence();
        self.secondary.silence();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_reports_spawn_error() {
        let sound = SystemSound::new("studytimer-no-such-player", Vec::new());
        assert!(matches!(sound.pulse(), Err(NotifyError::Spawn { .. })));
    }

    #[test]
    fn fallback_uses_secondary_on_failure() {
        let chain = Fallback::new(SystemSound::new("studytimer-no-such-player", Vec::new()), Silent);
        assert!(chain.pulse().is_ok());
    }

    #[test]
    fn macos_sound_choice_follows_study_length() {
        if cfg!(target_os = "macos") {
            let short = SystemSound::for_platform(25.0).unwrap();
            assert_eq!(short.args, vec!["/System/Library/Sounds/Glass.aiff"]);
            let long = SystemSound::for_platform(50.0).unwrap();
            assert_eq!(long.args, vec!["/System/Library/Sounds/Ping.aiff"]);
        }
    }
}
