use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "studytimer", version, about = "Study/break focus timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive timer
    Run(commands::run::RunArgs),
    /// Daily study totals
    Stats(commands::stats::StatsArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// List duration presets
    Presets,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Presets => commands::presets::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
