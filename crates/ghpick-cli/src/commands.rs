use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use ghpick_download::{DownloadSummary, LocalDownloader};
use ghpick_fetch::{parse_snapshot, InMemoryFetcher};
use ghpick_storage::{JsonStorage, SettingsStore};
use ghpick_tree::{CheckState, Explorer, ExplorerConfig, TreeItem};
use ghpick_types::RepositoryId;
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ExplorerConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ExplorerConfig::default(),
    };
    match cli.command {
        Command::Parse(args) => cmd_parse(args),
        Command::Tree(args) => cmd_tree(args, config, &cli.state).await,
        Command::Select(args) => cmd_select(args, config, &cli.state).await,
        Command::Download(args) => cmd_download(args, config, &cli.state).await,
        Command::Recent(args) => cmd_recent(args, &cli.state),
    }
}

fn cmd_parse(args: ParseArgs) -> anyhow::Result<()> {
    let repo = RepositoryId::parse_url(&args.url)?;
    println!("{} {}", "✓".green().bold(), repo.to_string().bold());
    println!("  Owner: {}", repo.owner.cyan());
    println!("  Name: {}", repo.name.cyan());
    println!("  Branch: {}", repo.branch.as_deref().unwrap_or("(default)").yellow());
    println!("  URL: {}", repo.html_url());
    Ok(())
}

async fn cmd_tree(args: TreeArgs, config: ExplorerConfig, state: &Path) -> anyhow::Result<()> {
    let explorer = open_snapshot(&args.source, config).await?;
    remember(&explorer, &args.source, state)?;
    for line in tree_lines(&explorer).await {
        println!("{line}");
    }
    Ok(())
}

async fn cmd_select(args: SelectArgs, config: ExplorerConfig, state: &Path) -> anyhow::Result<()> {
    let explorer = open_snapshot(&args.source, config).await?;
    remember(&explorer, &args.source, state)?;
    apply_selection(&explorer, &args.paths, args.recursive);
    for line in selection_lines(&explorer) {
        println!("{line}");
    }
    Ok(())
}

async fn cmd_download(args: DownloadArgs, config: ExplorerConfig, state: &Path) -> anyhow::Result<()> {
    let explorer = open_snapshot(&args.source, config).await?;
    remember(&explorer, &args.source, state)?;
    apply_selection(&explorer, &args.paths, args.recursive);

    let settings = JsonStorage::open(state)?.settings();
    let downloader = LocalDownloader::new().with_max_concurrent(settings.max_concurrent_downloads);
    let outcomes = explorer.download_selected(&downloader, &args.dest).await?;

    for outcome in &outcomes {
        match &outcome.error {
            None => println!("  {} {}", "✓".green(), outcome.entry.path),
            Some(err) => println!("  {} {} ({})", "✗".red(), outcome.entry.path, err.red()),
        }
    }
    let summary = DownloadSummary::from_outcomes(&outcomes);
    println!(
        "{} downloaded, {} failed into {}",
        summary.succeeded.to_string().green().bold(),
        summary.failed.to_string().red(),
        args.dest.display()
    );
    if !summary.is_clean() {
        anyhow::bail!("{} entries failed to download", summary.failed);
    }
    Ok(())
}

fn cmd_recent(args: RecentArgs, state: &Path) -> anyhow::Result<()> {
    let storage = JsonStorage::open(state)?;
    if args.clear {
        storage.clear()?;
        println!("{} Cleared stored repositories and settings.", "✓".green());
        return Ok(());
    }
    if let Some(url) = &args.add {
        let repo = RepositoryId::parse_url(url)?;
        storage.add_recent_repository(repo.clone())?;
        println!("{} Added {}", "✓".green(), repo.to_string().bold());
    }
    for line in recent_lines(&storage) {
        println!("{line}");
    }
    Ok(())
}

/// Build an explorer serving the snapshot file and wait for the root listing.
async fn open_snapshot(source: &SnapshotArgs, mut config: ExplorerConfig) -> anyhow::Result<Explorer> {
    if let Some(depth) = source.depth {
        config.initial_load_depth = depth;
    }
    let body = std::fs::read_to_string(&source.snapshot)
        .with_context(|| format!("reading snapshot {}", source.snapshot.display()))?;
    let entries = parse_snapshot(&body)?;
    let repo = match &source.repo {
        Some(url) => RepositoryId::parse_url(url)?,
        None => {
            let stem = source
                .snapshot
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("snapshot");
            RepositoryId::new("local", stem)
        }
    };
    debug!(%repo, entries = entries.len(), "snapshot loaded");

    let fetcher = Arc::new(InMemoryFetcher::with_repository(repo.clone(), entries));
    let explorer = Explorer::new(fetcher, config);
    explorer.set_repository(repo);
    explorer.load_root().await;
    Ok(explorer)
}

/// Record the snapshot's repository as recent when it was named explicitly.
fn remember(explorer: &Explorer, source: &SnapshotArgs, state: &Path) -> anyhow::Result<()> {
    if source.repo.is_none() {
        return Ok(());
    }
    if let Some(repo) = explorer.repository() {
        JsonStorage::open(state)?.add_recent_repository(repo)?;
    }
    Ok(())
}

fn apply_selection(explorer: &Explorer, paths: &[String], recursive: bool) {
    for path in paths {
        let path = path.trim_matches('/');
        if recursive {
            explorer.toggle_recursive(path);
        } else {
            explorer.toggle(path);
        }
    }
}

/// Depth-first rendering of every row, expanding each directory.
async fn tree_lines(explorer: &Explorer) -> Vec<String> {
    let mut lines = Vec::new();
    let mut stack: Vec<(TreeItem, usize)> = explorer
        .load_root()
        .await
        .into_iter()
        .rev()
        .map(|item| (item, 0))
        .collect();

    while let Some((item, depth)) = stack.pop() {
        lines.push(format_row(explorer, &item, depth));
        if let TreeItem::Node(node) = &item {
            if node.is_dir() {
                let children = explorer.get_children(Some(node)).await;
                stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
            }
        }
    }
    lines
}

fn format_row(explorer: &Explorer, item: &TreeItem, depth: usize) -> String {
    let decoration = explorer.decorate(item);
    let indent = "  ".repeat(depth);
    let check = match decoration.checkbox {
        Some(CheckState::Checked) => "[x]".green().to_string(),
        Some(CheckState::Unchecked) => "[ ]".to_string(),
        None => "   ".to_string(),
    };
    let label = match item {
        TreeItem::Node(node) if node.is_dir() => format!("{}/", decoration.label).blue().bold(),
        TreeItem::Node(_) => decoration.label.normal(),
        TreeItem::Loading => decoration.label.dimmed(),
        TreeItem::Error(_) => decoration.label.red(),
    };
    match decoration.description {
        Some(size) => format!("{indent}{check} {label} {}", size.dimmed()),
        None => format!("{indent}{check} {label}"),
    }
}

fn selection_lines(explorer: &Explorer) -> Vec<String> {
    let selected = explorer.selected();
    if selected.is_empty() {
        return vec!["Nothing selected.".to_string()];
    }
    let mut lines = vec![format!("{} selected:", selected.len().to_string().bold())];
    for path in &selected {
        match explorer.item(path) {
            Some(node) if node.is_dir() => lines.push(format!("  {} {}/", "✓".green(), path)),
            Some(_) => lines.push(format!("  {} {}", "✓".green(), path)),
            None => lines.push(format!("  {} {} {}", "?".yellow(), path, "(not loaded)".dimmed())),
        }
    }
    lines
}

fn recent_lines(storage: &dyn SettingsStore) -> Vec<String> {
    let recents = storage.recent_repositories();
    if recents.is_empty() {
        return vec!["No recent repositories.".to_string()];
    }
    let last = storage.last_repository();
    recents
        .iter()
        .map(|repo| {
            if Some(repo) == last.as_ref() {
                format!("* {}", repo.to_string().green().bold())
            } else {
                format!("  {repo}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SNAPSHOT: &str = r#"[
        {"name": "file1.txt", "path": "file1.txt", "sha": "a", "size": 5,
         "type": "file", "download_url": null, "content": "aGVsbG8=", "encoding": "base64"},
        {"name": "dir1", "path": "dir1", "sha": "b", "size": 0, "type": "dir", "download_url": null},
        {"name": "file2.ts", "path": "dir1/file2.ts", "sha": "c", "size": 9,
         "type": "file", "download_url": null, "content": "let x = 1"}
    ]"#;

    fn source(dir: &Path, repo: Option<&str>) -> SnapshotArgs {
        let snapshot = dir.join("snap.json");
        std::fs::write(&snapshot, SNAPSHOT).unwrap();
        SnapshotArgs {
            snapshot,
            repo: repo.map(str::to_string),
            depth: None,
        }
    }

    #[tokio::test]
    async fn tree_lists_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let explorer = open_snapshot(&source(dir.path(), None), ExplorerConfig::default())
            .await
            .unwrap();
        assert_eq!(explorer.repository(), Some(RepositoryId::new("local", "snap")));

        let lines = tree_lines(&explorer).await;
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("file1.txt"));
        assert!(lines[0].contains("5 B"));
        assert!(lines[1].contains("dir1"));
        assert!(lines[2].starts_with("  "));
        assert!(lines[2].contains("file2.ts"));
    }

    #[tokio::test]
    async fn shallow_depth_still_renders_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = source(dir.path(), None);
        args.depth = Some(1);
        let explorer = open_snapshot(&args, ExplorerConfig::default()).await.unwrap();
        assert!(explorer.item("dir1/file2.ts").is_none());
        assert_eq!(tree_lines(&explorer).await.len(), 3);
    }

    #[tokio::test]
    async fn recursive_selection_lines() {
        let dir = tempfile::tempdir().unwrap();
        let explorer = open_snapshot(&source(dir.path(), None), ExplorerConfig::default())
            .await
            .unwrap();
        apply_selection(&explorer, &["dir1/".to_string(), "ghost".to_string()], true);

        let lines = selection_lines(&explorer);
        assert!(lines[0].contains('3'));
        assert!(lines.iter().any(|l| l.contains("dir1/file2.ts")));
        assert!(lines.iter().any(|l| l.contains("not loaded")));
    }

    #[tokio::test]
    async fn download_writes_selected_files() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        let state = dir.path().join("state.json");
        let args = DownloadArgs {
            source: source(dir.path(), Some("https://github.com/test-owner/test-repo")),
            paths: vec!["".to_string()],
            recursive: true,
            dest: dest.clone(),
        };
        cmd_download(args, ExplorerConfig::default(), &state).await.unwrap();

        assert_eq!(std::fs::read(dest.join("file1.txt")).unwrap(), b"hello");
        assert_eq!(std::fs::read_to_string(dest.join("dir1/file2.ts")).unwrap(), "let x = 1");
        let storage = JsonStorage::open(&state).unwrap();
        assert_eq!(
            storage.last_repository(),
            Some(RepositoryId::new("test-owner", "test-repo"))
        );
    }

    #[test]
    fn recent_add_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let state: PathBuf = dir.path().join("state.json");
        cmd_recent(
            RecentArgs {
                add: Some("github.com/o/a".into()),
                clear: false,
            },
            &state,
        )
        .unwrap();
        let storage = JsonStorage::open(&state).unwrap();
        let lines = recent_lines(&storage);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with('*'));

        cmd_recent(RecentArgs { add: None, clear: true }, &state).unwrap();
        let storage = JsonStorage::open(&state).unwrap();
        assert_eq!(recent_lines(&storage), vec!["No recent repositories."]);
    }

    #[test]
    fn parse_rejects_non_github() {
        assert!(cmd_parse(ParseArgs { url: "https://example.com/o/r".into() }).is_err());
        assert!(cmd_parse(ParseArgs { url: "github.com/o/r/tree/dev".into() }).is_ok());
    }
}
