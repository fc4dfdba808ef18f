//! repomap CLI.
//!
//! Discovers source files (gitignore-aware), runs the ranked-map pipeline
//! and prints the outline. Chat files and mentions can be supplied to bias
//! ranking the way an editor integration would.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use repomap::discovery;
use repomap::{MapConfig, RefreshPolicy, RepoMap};

/// Ranked, token-budgeted map of a source repository.
///
/// Examples:
///   repomap .                          # Map the whole repository
///   repomap --chat src/lib.rs .        # Bias toward an in-focus file
///   repomap --mention-ident connect .  # Boost a named symbol
#[derive(Parser, Debug)]
#[command(name = "repomap")]
#[command(version)]
#[command(about, long_about = None)]
struct Cli {
    /// Files or directories to map (background "repo" set)
    #[arg(value_name = "PATHS", default_value = ".")]
    paths: Vec<PathBuf>,

    /// Files already in focus; skipped in the outline but used to bias
    /// ranking toward what they reference
    #[arg(long, value_name = "FILE")]
    chat: Vec<PathBuf>,

    /// Root-relative file names to boost in ranking
    #[arg(long = "mention-file", value_name = "FILE")]
    mention_files: Vec<String>,

    /// Identifiers to boost in ranking
    #[arg(long = "mention-ident", value_name = "IDENT")]
    mention_idents: Vec<String>,

    /// Token budget for the outline
    #[arg(short = 't', long)]
    tokens: Option<usize>,

    /// Bypass the outline cache
    #[arg(long)]
    refresh: bool,

    /// Recompute the outline on every call
    #[arg(long)]
    always_refresh: bool,

    /// Repository root; defaults to the first path's directory
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Print the discovered file tree before the map
    #[arg(long)]
    tree: bool,

    /// Verbose progress output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => {
            let first = cli.paths.first().expect("paths has a default");
            if first.is_dir() {
                first.clone()
            } else {
                first.parent().unwrap_or(std::path::Path::new(".")).to_path_buf()
            }
        }
    };
    let root = root
        .canonicalize()
        .with_context(|| format!("cannot resolve root {}", root.display()))?;

    let mut config = MapConfig::new(&root).load_overrides().with_verbose(cli.verbose);
    if let Some(tokens) = cli.tokens {
        config = config.with_max_map_tokens(tokens);
    }
    if cli.always_refresh {
        config = config.with_refresh(RefreshPolicy::Always);
    }

    let mut other_files = Vec::new();
    for path in &cli.paths {
        let path = path
            .canonicalize()
            .with_context(|| format!("cannot resolve {}", path.display()))?;
        other_files.extend(discovery::find_source_files(&path)?);
    }

    let chat_files: Vec<PathBuf> = cli
        .chat
        .iter()
        .map(|p| p.canonicalize().with_context(|| format!("cannot resolve {}", p.display())))
        .collect::<Result<_>>()?;

    if cli.tree {
        print!("{}", discovery::file_tree(&root, &other_files));
    }

    let mentioned_files: HashSet<String> = cli.mention_files.iter().cloned().collect();
    let mentioned_idents: HashSet<String> = cli.mention_idents.iter().cloned().collect();

    let repo_map = RepoMap::new(config);
    let output = repo_map.generate(
        &chat_files,
        &other_files,
        &mentioned_files,
        &mentioned_idents,
        cli.refresh,
    )?;

    if output.is_empty() {
        eprintln!("repomap: no supported source files produced any tags");
    } else {
        print!("{output}");
    }

    Ok(())
}
