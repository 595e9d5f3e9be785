//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "luxi", version, about = "Self-hosted comic and manga library")]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON) layered over the defaults.
    #[arg(long, short, global = true, env = "LUXI_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage libraries.
    #[command(subcommand)]
    Library(LibraryCommand),
    /// Scan a library and wait for it to finish.
    Scan {
        library: i64,
    },
    /// Print the scan flag: 1 while a scan is running, 0 otherwise.
    Status,
    /// Clear a scan flag left set by a process that died mid-scan. Only run
    /// this when no other luxi process is scanning.
    Recover,
    /// Inspect and manage series.
    #[command(subcommand)]
    Series(SeriesCommand),
    /// Reading progress and removal of single issues.
    #[command(subcommand)]
    Issue(IssueCommand),
    /// Write an issue to a directory exactly as a reader would receive it.
    Stream {
        series: i64,
        issue: i64,
        /// Directory to write into (created if missing).
        #[arg(long, short, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum LibraryCommand {
    /// Register a library root and scan it.
    Add {
        name: String,
        /// Absolute path of the library root.
        path: PathBuf,
    },
    List,
    /// Show a library and its series.
    Show {
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum SeriesCommand {
    /// Show a series, its metadata and its issues.
    Show {
        id: i64,
    },
    /// Mark every issue of a series read.
    Read {
        id: i64,
    },
    /// Save the downloaded cover image.
    Cover {
        id: i64,
        #[arg(long, short)]
        out: PathBuf,
    },
    Delete {
        id: i64,
        #[command(flatten)]
        removal: Removal,
    },
}

#[derive(Subcommand)]
pub enum IssueCommand {
    /// Set the current page; the last page marks the issue read.
    Page {
        id: i64,
        page: u64,
    },
    Read {
        id: i64,
    },
    /// Save the first-page thumbnail.
    Preview {
        id: i64,
        #[arg(long, short)]
        out: PathBuf,
    },
    Delete {
        id: i64,
        #[command(flatten)]
        removal: Removal,
    },
}

#[derive(Args)]
pub struct Removal {
    /// Also delete the files from disk.
    #[arg(long)]
    pub remove_files: bool,
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
    fn test_parse_delete_with_files() {
        let cli = Cli::try_parse_from(["luxi", "series", "delete", "3", "--remove-files"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Series(SeriesCommand::Delete { id: 3, removal: Removal { remove_files: true } })
        ));
    }

    #[test]
    fn test_parse_recover_and_preview() {
        let cli = Cli::try_parse_from(["luxi", "recover"]).unwrap();
        assert!(matches!(cli.command, Command::Recover));
        let cli = Cli::try_parse_from(["luxi", "issue", "preview", "9", "-o", "9.jpg"]).unwrap();
        assert!(matches!(cli.command, Command::Issue(IssueCommand::Preview { id: 9, .. })));
    }

    #[test]
    fn test_parse_stream() {
        let cli = Cli::try_parse_from(["luxi", "--config", "luxi.yaml", "stream", "1", "2", "--out", "/tmp"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("luxi.yaml")));
        assert!(matches!(cli.command, Command::Stream { series: 1, issue: 2, .. }));
    }
}
