//! CLI application for renaming slide scans from their label images.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{apply, batch, config, rename, scan};

/// labelmv - Rename slide scans from the text on their label images
#[derive(Parser)]
#[command(name = "labelmv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename one scan from its label image
    Rename(rename::RenameArgs),

    /// Rename every scan in a directory, writing an audit log
    Batch(batch::BatchArgs),

    /// Show recognized text and the suggested name without renaming
    Scan(scan::ScanArgs),

    /// Rename scans from a CSV rename sheet
    Apply(apply::ApplyArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Rename(args) => rename::run(args, cli.config.as_deref()),
        Commands::Batch(args) => batch::run(args, cli.config.as_deref()),
        Commands::Scan(args) => scan::run(args, cli.config.as_deref()),
        Commands::Apply(args) => apply::run(args, cli.config.as_deref()),
        Commands::Config(args) => config::run(args, cli.config.as_deref()),
    }
}
