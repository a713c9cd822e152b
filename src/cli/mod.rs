//! CLI module for Djangoscope

mod args;

pub use args::{Args, Command};

use crate::analysis::ProjectAnalyzer;
use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::error::Result;
use crate::output;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr log subscriber; `RUST_LOG` overrides `-v`
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Analyze {
            path,
            config,
            format,
            exclude,
            verbose,
        } => {
            init_logging(verbose);

            let mut cfg = match &config {
                Some(config_path) => Config::load(config_path)?,
                None => Config::load_or_default(Path::new(DEFAULT_CONFIG_FILE))?,
            };
            cfg.merge_cli(exclude, format);
            cfg.validate()?;

            tracing::info!(
                path = %path.display(),
                model_file = %cfg.discovery.model_file,
                route_file = %cfg.discovery.route_file,
                exclude = ?cfg.discovery.exclude_dirs,
                "analyzing"
            );

            let analyzer = ProjectAnalyzer::new(cfg.clone())?.with_verbose(verbose > 0);
            let report = analyzer.analyze(&path)?;

            let rendered = output::render(&report, cfg.output.format)?;
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(rendered.as_bytes())?;
            handle.flush()?;

            Ok(())
        }

        Command::Version => {
            println!("djangoscope {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
