// Command-line interface

pub mod commands;

use crate::github::Stream;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// `issuedump owner/repo` is shorthand for `issuedump sync owner/repo`
#[derive(Parser, Debug)]
#[command(name = "issuedump")]
#[command(about = "Mirror GitHub issues and comments into SQLite and dump them as text", long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub sync: SyncArgs,
}

impl Cli {
    /// The chosen subcommand, falling back to `sync` with the bare arguments
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Sync(self.sync))
    }
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Repositories as owner/repo or GitHub URLs
    #[arg(required = true)]
    pub repos: Vec<String>,

    /// Start from this page instead of the stored checkpoint
    #[arg(short, long)]
    pub page: Option<u32>,

    /// Which streams to sync
    #[arg(long, value_enum, default_value_t = StreamSelection::All)]
    pub stream: StreamSelection,

    /// Repositories synced at the same time
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Write transcripts once the sync finishes
    #[arg(long)]
    pub dump: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download issues and comments, resuming from the last stored page
    Sync(SyncArgs),

    /// Write the stored issues of repositories as text transcripts
    Dump {
        /// Repositories as owner/repo or GitHub URLs
        #[arg(required = true)]
        repos: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show stored checkpoints and row counts for a repository
    Status {
        /// Repository as owner/repo or GitHub URL
        repo: String,
    },

    /// Show the remaining GitHub API quota
    Limits,

    /// Create the database schema
    Migrate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StreamSelection {
    Issues,
    Comments,
    /// Issues first, then comments
    All,
}

impl StreamSelection {
    pub fn streams(self) -> Vec<Stream> {
        match self {
            StreamSelection::Issues => vec![Stream::Issues],
            StreamSelection::Comments => vec![Stream::Comments],
            StreamSelection::All => vec![Stream::Issues, Stream::Comments],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_defaults_to_both_streams() {
        let cli = Cli::try_parse_from(["issuedump", "sync", "dfm/emcee"]).unwrap();
        match cli.into_command() {
            Commands::Sync(args) => {
                assert_eq!(args.repos, vec!["dfm/emcee"]);
                assert_eq!(args.page, None);
                assert_eq!(args.stream.streams(), vec![Stream::Issues, Stream::Comments]);
                assert!(!args.dump);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_bare_repository_runs_sync() {
        let cli = Cli::try_parse_from(["issuedump", "dfm/emcee", "--jobs", "2"]).unwrap();
        match cli.into_command() {
            Commands::Sync(args) => {
                assert_eq!(args.repos, vec!["dfm/emcee"]);
                assert_eq!(args.jobs, Some(2));
                assert_eq!(args.stream, StreamSelection::All);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_subcommands_still_parse() {
        let cli = Cli::try_parse_from(["issuedump", "status", "dfm/emcee"]).unwrap();
        match cli.into_command() {
            Commands::Status { repo } => assert_eq!(repo, "dfm/emcee"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_sync_page_override() {
        let cli =
            Cli::try_parse_from(["issuedump", "sync", "dfm/emcee", "--page", "7", "--stream", "comments"])
                .unwrap();
        match cli.into_command() {
            Commands::Sync(args) => {
                assert_eq!(args.page, Some(7));
                assert_eq!(args.stream, StreamSelection::Comments);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_sync_requires_a_repository() {
        assert!(Cli::try_parse_from(["issuedump", "sync"]).is_err());
        assert!(Cli::try_parse_from(["issuedump"]).is_err());
    }
}
