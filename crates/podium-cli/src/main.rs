//! Podium CLI - debate practice against a streaming AI opponent
//!
//! # Usage
//!
//! ```bash
//! # Practice a 30 minute debate with 3 minute turns
//! podium practice --topic "AI Ethics" --preset standard --turn 3
//!
//! # Practice without a backend
//! podium practice --topic 1 --preset quick --offline
//!
//! # Browse the topic catalog
//! podium topics --search climate
//!
//! # Show the scores of a finished debate
//! podium scores 65f0c2a1
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;

use commands::{info, practice, presets, scores, stats, topics};

/// Podium - debate practice
///
/// Argue against an AI opponent in timed turns and get scored on logic,
/// persuasion and structure.
#[derive(Parser)]
#[command(
    name = "podium",
    version,
    about = "Podium CLI - Debate Practice",
    long_about = "Podium pits you against an AI opponent in a timed, turn-based debate.\n\n\
                  Each turn has a fixed length; when the session clock runs out the\n\
                  debate is scored on logic, persuasion and structure."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive debate
    #[command(name = "practice")]
    Practice(practice::PracticeArgs),

    /// List suggested debate topics
    #[command(name = "topics")]
    Topics(topics::TopicsArgs),

    /// List session lengths and their turn options
    #[command(name = "presets")]
    Presets(presets::PresetsArgs),

    /// Show scores and feedback for a debate
    #[command(name = "scores")]
    Scores(scores::ScoresArgs),

    /// Show your debate statistics
    #[command(name = "stats")]
    Stats(stats::StatsArgs),

    /// Show version and configuration
    #[command(name = "info")]
    Info(info::InfoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Practice(args) => practice::run(args).await,
        Commands::Topics(args) => topics::run(args),
        Commands::Presets(args) => presets::run(args),
        Commands::Scores(args) => scores::run(args).await,
        Commands::Stats(args) => stats::run(args).await,
        Commands::Info(args) => info::run(args),
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Logs go to stderr so they do not interleave with the transcript
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

/// Print a success message with a checkmark
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message with an X
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}

/// Print an info message
pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}
