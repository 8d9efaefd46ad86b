use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quotashift")]
#[command(version)]
#[command(about = "Spread Drive files across service-account quotas", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/quotashift/config.toml)
    #[arg(long, global = true, env = "QUOTASHIFT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Copy files from a shared folder into this account until its quota is used up
    ///
    /// Each copied original is then moved from SOURCE into TRASH.
    Relocate(RelocateArgs),

    /// Permanently delete root-level files whose name starts with the marker
    Purge(PurgeArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Settings shared by both runs
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Base64-encoded service-account key
    #[arg(env = "QUOTASHIFT_CREDENTIALS", hide_env_values = true)]
    pub credentials: String,

    /// Records requested per listing page (1-1000)
    #[arg(long, env = "QUOTASHIFT_PAGE_SIZE")]
    pub page_size: Option<u32>,

    /// Show what would happen without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RelocateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Folder to take files from
    #[arg(env = "QUOTASHIFT_SOURCE")]
    pub source: String,

    /// Folder to place copies in
    #[arg(env = "QUOTASHIFT_DESTINATION")]
    pub destination: String,

    /// Folder originals are moved to after copying
    #[arg(env = "QUOTASHIFT_TRASH")]
    pub trash: String,

    /// Label printed in progress output
    #[arg(env = "QUOTASHIFT_LABEL")]
    pub label: Option<String>,

    /// Total quota of the account (e.g. "15GB")
    #[arg(long, env = "QUOTASHIFT_CAPACITY")]
    pub capacity: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct PurgeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Label printed in progress output
    #[arg(env = "QUOTASHIFT_LABEL")]
    pub label: Option<String>,

    /// Name prefix of files to delete
    #[arg(long, env = "QUOTASHIFT_MARKER")]
    pub marker: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_relocate_positionals() {
        let cli = Cli::try_parse_from([
            "quotashift",
            "relocate",
            "Y3JlZHM=",
            "src",
            "dst",
            "trash",
            "7",
            "--capacity",
            "15GB",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Command::Relocate(args) => {
                assert_eq!(args.common.credentials, "Y3JlZHM=");
                assert_eq!(args.source, "src");
                assert_eq!(args.destination, "dst");
                assert_eq!(args.trash, "trash");
                assert_eq!(args.label.as_deref(), Some("7"));
                assert_eq!(args.capacity.as_deref(), Some("15GB"));
                assert!(args.common.dry_run);
            }
            _ => panic!("Expected relocate"),
        }
    }

    #[test]
    fn test_purge_label_optional() {
        let cli =
            Cli::try_parse_from(["quotashift", "purge", "Y3JlZHM=", "--marker", "#@__"]).unwrap();

        match cli.command {
            Command::Purge(args) => {
                assert!(args.label.is_none());
                assert_eq!(args.marker.as_deref(), Some("#@__"));
                assert!(!args.common.dry_run);
            }
            _ => panic!("Expected purge"),
        }
    }

    #[test]
    fn test_verbosity_is_global() {
        let cli = Cli::try_parse_from(["quotashift", "purge", "c", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
