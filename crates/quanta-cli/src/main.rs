use clap::{Parser, Subcommand};
use quanta_core::Config;

mod commands;

#[derive(Parser)]
#[command(name = "quanta-cli", version, about = "Quanta habit tracker CLI")]
struct Cli {
    /// Reference date (YYYY-MM-DD) instead of the local calendar day
    #[arg(long, global = true)]
    today: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit management
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Record check-ins
    Checkin {
        #[command(subcommand)]
        action: commands::checkin::CheckinAction,
    },
    /// Streaks, insurance and comebacks
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Progress reports and planned nudges
    Report {
        #[command(subcommand)]
        action: commands::report::ReportAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quanta_core={log_level},quanta_cli={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let log_level = Config::load()
        .map(|c| c.log_level)
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(&log_level);

    let today = cli.today.as_deref();
    let result = match cli.command {
        Commands::Habit { action } => commands::habit::run(action, today),
        Commands::Checkin { action } => commands::checkin::run(action, today),
        Commands::Streak { action } => commands::streak::run(action, today),
        Commands::Report { action } => commands::report::run(action, today),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
