//! schedsync CLI
//!
//! Command-line tools for syncing schedule grids with remote tables.
//!
//! # Commands
//!
//! - `schedules` - List the schedules in a document
//! - `export` - Replace a remote tab with a schedule grid
//! - `import` - Diff a remote tab against a document, optionally applying it

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// schedsync command-line tools.
#[derive(Parser)]
#[command(name = "schedsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the schedules in a document
    Schedules {
        /// Document file (JSON)
        #[arg(short, long)]
        document: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Replace the remote tab with a schedule grid
    Export {
        /// Document file (JSON)
        #[arg(short, long)]
        document: PathBuf,

        /// Sync profile file (JSON)
        #[arg(short, long)]
        profile: PathBuf,

        /// Remote table file (JSON)
        #[arg(short, long)]
        remote: PathBuf,

        /// Schedule to export (defaults to the first one)
        #[arg(short, long)]
        schedule: Option<String>,

        /// Also export rows without an anchor
        #[arg(long)]
        include_errors: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Diff the remote tab against the document
    Import {
        /// Document file (JSON)
        #[arg(short, long)]
        document: PathBuf,

        /// Sync profile file (JSON)
        #[arg(short, long)]
        profile: PathBuf,

        /// Remote table file (JSON)
        #[arg(short, long)]
        remote: PathBuf,

        /// Apply the changes and save the document
        #[arg(short, long)]
        apply: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(default_log_level(true))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_log_level(false)))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Schedules { document, format } => {
            commands::schedules::run(&document, &format)?;
        }
        Commands::Export {
            document,
            profile,
            remote,
            schedule,
            include_errors,
            format,
        } => {
            let paths = commands::SyncPaths::new(document, profile, remote);
            commands::export::run(&paths, schedule.as_deref(), include_errors, &format)?;
        }
        Commands::Import {
            document,
            profile,
            remote,
            apply,
            format,
        } => {
            let paths = commands::SyncPaths::new(document, profile, remote);
            commands::import::run(&paths, apply, &format)?;
        }
        Commands::Version => {
            println!("schedsync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("schedsync Core v{}", schedsync_core::VERSION);
        }
    }

    Ok(())
}

/// Log level used when `RUST_LOG` is not set.
fn default_log_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_summaries_are_logged_by_default() {
        assert_eq!(default_log_level(false), "info");
        assert_eq!(default_log_level(true), "debug");
    }

    #[test]
    fn cli_parses_import_flags() {
        let cli = Cli::try_parse_from([
            "schedsync", "import", "-d", "doc.json", "-p", "profile.json", "-r", "remote.json",
            "--apply",
        ])
        .unwrap();
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Import { apply: true, .. }));
    }
}
