//! Interactive terminal session.
//!
//! Commands are read line by line from stdin while a renderer task redraws
//! the status line from the controller's snapshots.

use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::Args;
use log::{info, warn};
use studytimer_core::{
    Config, EngineError, Phase, Preset, RunState, Snapshot, TimerController, WatchSink,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

#[derive(Args)]
pub struct RunArgs {
    /// Preset to load (classic, extended, test, custom, 25/5, 50/10)
    #[arg(long)]
    preset: Option<Preset>,
    /// Five-second phases; same as --preset test
    #[arg(long, conflicts_with = "preset")]
    test: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Start,
    Pause,
    Stop,
    Reset,
    Break,
    Study,
    Preset(Preset),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default().to_ascii_lowercase();
        let command = match verb.as_str() {
            "s" | "start" | "resume" => Command::Start,
            "p" | "pause" => Command::Pause,
            "x" | "stop" => Command::Stop,
            "r" | "reset" => Command::Reset,
            "b" | "break" => Command::Break,
            "u" | "study" => Command::Study,
            "i" | "status" => Command::Status,
            "h" | "?" | "help" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            "preset" => {
                let name = words
                    .next()
                    .ok_or_else(|| "usage: preset <classic|extended|test|custom>".to_string())?;
                Command::Preset(name.parse().map_err(|e| format!("{e}"))?)
            }
            "" => return Err(String::new()),
            other => return Err(format!("unknown command '{other}'; type 'help'")),
        };
        Ok(command)
    }
}

const HELP: &str = "\
commands:
  s, start      start or resume the loaded phase
  p, pause      pause the countdown
  x, stop       stop and credit the elapsed study time
  r, reset      back to a full study phase
  b, break      start the break
  u, study      start a study phase
  preset NAME   switch preset (classic, extended, test, custom)
  i, status     print the current state
  q, quit       save and exit";

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(session(args));
    // A pending stdin read would otherwise keep the runtime alive.
    runtime.shutdown_timeout(Duration::from_millis(200));
    result
}

async fn session(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            warn!("Using default configuration: {err}");
            Config::default()
        }
    };
    if args.test {
        config.timer.preset = Preset::Test;
    } else if let Some(preset) = args.preset {
        config.timer.preset = preset;
    }
    let sink = Arc::new(WatchSink::new());
    let controller = TimerController::from_config(&config, Local::now().date_naive(), sink.clone())?;

    println!(
        "studytimer: {} ({}). Type 'help' for commands.",
        config.timer.preset,
        config.timer.preset.description()
    );
    let renderer = tokio::spawn(render(sink.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let line = tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => execute(&controller, &config, command).await,
            Err(message) if message.is_empty() => {}
            Err(message) => eprintln!("{message}"),
        }
    }

    controller.shutdown().await;
    renderer.abort();
    let record = controller.record().await;
    println!(
        "\nToday: {:.2} sessions, {:.1} minutes of study",
        record.completed_sessions, record.total_study_minutes
    );
    Ok(())
}

async fn execute(controller: &TimerController, config: &Config, command: Command) {
    match command {
        Command::Start => {
            controller.start().await;
        }
        Command::Pause => {
            controller.pause().await;
        }
        Command::Stop => {
            controller.stop().await;
        }
        Command::Reset => {
            controller.reset().await;
        }
        Command::Break => {
            controller.switch_to_break().await;
        }
        Command::Study => {
            controller.switch_to_study().await;
        }
        Command::Preset(preset) => {
            let mut config = config.clone();
            config.timer.preset = preset;
            let timer_config = match config.timer_config() {
                Ok(timer_config) => timer_config,
                Err(err) => {
                    eprintln!("{err}");
                    return;
                }
            };
            match controller.set_config(timer_config).await {
                Ok(_) => println!("\npreset: {preset} ({})", preset.description()),
                Err(EngineError::Busy) => eprintln!("\nstop or pause the timer before changing presets"),
            }
        }
        Command::Status => {
            let snapshot = controller.snapshot().await;
            let alert = if controller.alert_active() { "  [alert]" } else { "" };
            println!("\n{}{alert}", status_line(&snapshot));
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

async fn render(mut rx: watch::Receiver<Option<Snapshot>>) {
    let mut last_state = None;
    while rx.changed().await.is_ok() {
        let Some(snapshot) = rx.borrow_and_update().clone() else {
            continue;
        };
        if snapshot.run_state == RunState::Completed && last_state != Some(RunState::Completed) {
            println!("\n{}", completion_message(snapshot.phase));
        }
        last_state = Some(snapshot.run_state);
        print!("\r{}   ", status_line(&snapshot));
        let _ = std::io::stdout().flush();
    }
}

fn status_line(snapshot: &Snapshot) -> String {
    let state = match snapshot.run_state {
        RunState::Idle => "ready",
        RunState::Running => "running",
        RunState::Paused => "paused",
        RunState::Completed => "done",
        RunState::Stopped => "stopped",
    };
    format!(
        "[{}] {} {:<7} | sessions {:.2} | study {:.1} min",
        snapshot.phase.label(),
        snapshot.clock_face(),
        state,
        snapshot.completed_sessions,
        snapshot.total_study_minutes
    )
}

/// `next` is the phase already loaded after the completion.
fn completion_message(next: Phase) -> &'static str {
    match next {
        Phase::Break => "Study session complete! Type 'break' to start your break.",
        Phase::Study => "Break over! Type 'study' to start the next session.",
    }
}
