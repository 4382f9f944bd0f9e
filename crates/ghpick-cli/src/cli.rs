use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ghpick",
    about = "Browse a GitHub repository tree and pick files to download",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Explorer configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// File holding settings and recent repositories
    #[arg(long, global = true, default_value = ".ghpick-state.json")]
    pub state: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a repository URL
    Parse(ParseArgs),
    /// Print the tree of a repository snapshot
    Tree(TreeArgs),
    /// Select paths and print the resolved selection
    Select(SelectArgs),
    /// Write the selected paths into a directory
    Download(DownloadArgs),
    /// Show or edit recent repositories
    Recent(RecentArgs),
}

#[derive(Args)]
pub struct ParseArgs {
    pub url: String,
}

/// Where the listing comes from.
#[derive(Args)]
pub struct SnapshotArgs {
    /// GitHub Contents or Git Trees API response saved as JSON
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Repository the snapshot was taken from
    #[arg(long)]
    pub repo: Option<String>,

    /// Override the depth of the initial root listing
    #[arg(long)]
    pub depth: Option<usize>,
}

#[derive(Args)]
pub struct TreeArgs {
    #[command(flatten)]
    pub source: SnapshotArgs,
}

#[derive(Args)]
pub struct SelectArgs {
    #[command(flatten)]
    pub source: SnapshotArgs,

    /// Paths to toggle; an empty string stands for the repository root
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Toggle directories together with everything loaded below them
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Args)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub source: SnapshotArgs,

    #[arg(required = true)]
    pub paths: Vec<String>,

    #[arg(short, long)]
    pub recursive: bool,

    /// Destination directory
    #[arg(long)]
    pub dest: PathBuf,
}

#[derive(Args)]
pub struct RecentArgs {
    /// Record a repository URL as the most recent one
    #[arg(long)]
    pub add: Option<String>,

    /// Forget every stored repository and setting
    #[arg(long, conflicts_with = "add")]
    pub clear: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_select_with_globals() {
        let cli = Cli::try_parse_from([
            "ghpick", "select", "--snapshot", "s.json", "-r", "dir1", "file1.txt", "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.state, PathBuf::from(".ghpick-state.json"));
        match cli.command {
            Command::Select(args) => {
                assert!(args.recursive);
                assert_eq!(args.paths, vec!["dir1", "file1.txt"]);
                assert_eq!(args.source.snapshot, PathBuf::from("s.json"));
            }
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn recent_add_and_clear_conflict() {
        assert!(Cli::try_parse_from(["ghpick", "recent", "--add", "github.com/o/r", "--clear"]).is_err());
    }

    #[test]
    fn download_requires_dest() {
        assert!(Cli::try_parse_from(["ghpick", "download", "--snapshot", "s.json", "a"]).is_err());
    }
}
