use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cadence", version, about = "Cadence: recurring rhythms, smoothly scheduled")]
struct Cli {
    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rhythm catalog management
    Rhythm {
        #[command(subcommand)]
        action: commands::rhythm::RhythmAction,
    },
    /// Record and list completions and deferrals
    Event {
        #[command(subcommand)]
        action: commands::event::EventAction,
    },
    /// Per-day capacity ("spoons")
    Spoons {
        #[command(subcommand)]
        action: commands::spoons::SpoonsAction,
    },
    /// Show the schedule for a window of days
    Schedule(commands::schedule::ScheduleArgs),
    /// Convergence, delinquency and health reports
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

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("CADENCE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let today = cli.today;
    let result = match cli.command {
        Commands::Rhythm { action } => commands::rhythm::run(action, today),
        Commands::Event { action } => commands::event::run(action, today),
        Commands::Spoons { action } => commands::spoons::run(action, today),
        Commands::Schedule(args) => commands::schedule::run(args, today),
        Commands::Report { action } => commands::report::run(action, today),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
