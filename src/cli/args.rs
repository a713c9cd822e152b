//! CLI argument parsing

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Extract Django models and URL routes from a codebase
#[derive(Parser, Debug)]
#[command(name = "djangoscope")]
#[command(about = "Extract Django models and URL routes from a codebase")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a project and print its models and routes
    Analyze {
        /// Project root to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Config file path (defaults to ./djangoscope.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_parser = ["text", "json"])]
        format: Option<String>,

        /// Extra directory names to skip (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Increase log verbosity (-v info, -vv debug, -vvv trace)
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,
    },

    /// Show version information
    Version,
}
