//! Conclave CLI - multi-agent debate and hypothesis validation
//!
//! # Usage
//!
//! ```bash
//! # Debate a question with the default panel
//! conclave debate "Should we expand to Europe this year?"
//!
//! # Validate a hypothesis and print a markdown report
//! conclave validate "SMBs will pay $50/month" --category pricing --impact high --report
//!
//! # Show version and configuration
//! conclave info
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;

use commands::{debate, info, validate};

/// Conclave - a panel of LLM agents that debate until they agree
#[derive(Parser)]
#[command(
    name = "conclave",
    version,
    about = "Conclave CLI - Multi-agent debate and hypothesis validation",
    long_about = "Conclave asks a panel of LLM agents the same question, shows each\n\
                  agent the others' answers, and repeats until the panel reaches\n\
                  strong consensus or the round limit."
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
    /// Debate a question
    #[command(name = "debate")]
    Debate(debate::DebateArgs),

    /// Validate a hypothesis through debate
    #[command(name = "validate")]
    Validate(validate::ValidateArgs),

    /// Show system information
    #[command(name = "info")]
    Info(info::InfoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Debate(args) => debate::run(args).await,
        Commands::Validate(args) => validate::run(args).await,
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

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
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
