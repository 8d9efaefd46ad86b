mod cli;
mod commands;
mod config;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use drive::ErrorCategory;
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Relocate(args) => commands::relocate::run(&ctx, args),
        Command::Purge(args) => commands::purge::run(&ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "quotashift", &mut io::stdout());
            Ok(())
        }
    };

    if let Some(category) = result.as_ref().err().and_then(drive_failure) {
        ui::dim(&format!("{category}: {}", category.advice()));
    }
    result
}

/// Category of the Drive error behind a failed run, if there is one.
fn drive_failure(err: &anyhow::Error) -> Option<ErrorCategory> {
    err.chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<quota::Error>()
                .and_then(quota::Error::drive_error)
                .or_else(|| cause.downcast_ref::<drive::Error>())
        })
        .map(drive::Error::category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    #[test]
    fn test_drive_failure_behind_context() {
        let err = Err::<(), _>(quota::Error::listing(
            "root folder",
            drive::Error::PermissionDenied {
                message: "no access".to_string(),
            },
        ))
        .context("Purge stopped")
        .unwrap_err();
        assert_eq!(drive_failure(&err), Some(ErrorCategory::Permission));

        let err = Err::<(), _>(drive::Error::MissingCredentials)
            .context("Could not connect to Drive")
            .unwrap_err();
        assert_eq!(drive_failure(&err), Some(ErrorCategory::Auth));
    }

    #[test]
    fn test_no_drive_failure() {
        let err = anyhow::anyhow!("Missing capacity");
        assert_eq!(drive_failure(&err), None);

        let err = anyhow::Error::new(quota::Error::Config("bad folder".to_string()));
        assert_eq!(drive_failure(&err), None);
    }
}
