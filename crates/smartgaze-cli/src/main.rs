use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "smartgaze-cli", version, about = "Smartgaze CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compatibility scoring and ranking
    Score {
        #[command(subcommand)]
        action: commands::score::ScoreAction,
    },
    /// Experiment session control
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Gaze attention analysis
    Analyze {
        #[command(subcommand)]
        action: commands::analyze::AnalyzeAction,
    },
    /// Results assembly
    Results {
        #[command(subcommand)]
        action: commands::results::ResultsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Score { action } => commands::score::run(action),
        Commands::Session { action } => commands::session::run(action),
        Commands::Analyze { action } => commands::analyze::run(action),
        Commands::Results { action } => commands::results::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
