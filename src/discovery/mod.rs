//! File discovery for the CLI.
//!
//! The core pipeline takes explicit file lists; this module produces them.
//! Traversal respects .gitignore via the `ignore` crate and returns sorted
//! results so repeated runs hit the tag cache identically. Also renders
//! the discovered set as a connector-style directory tree for display.

use std::path::{Path, PathBuf};

use anyhow::Result;
use ignore::WalkBuilder;

/// Extensions that never contain extractable symbols; skipping them saves
/// parse attempts and keeps the graph free of noise.
const EXCLUDED_EXTENSIONS: &[&str] = &[
    // images and media
    "png", "jpg", "jpeg", "gif", "ico", "svg", "webp", "mp3", "mp4", "wav", "ogg",
    // archives
    "zip", "tar", "gz", "rar", "7z", "bz2", "xz",
    // documents
    "pdf", "doc", "docx", "xls", "xlsx",
    // compiled artifacts
    "pyc", "pyo", "so", "dylib", "dll", "exe", "o", "a", "class", "jar", "wasm",
    // generated
    "lock", "sum",
];

/// Find source files under `path`, honoring gitignore rules. A file input
/// is returned as-is.
pub fn find_source_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        anyhow::bail!("path does not exist: {}", path.display());
    }

    let walker = WalkBuilder::new(path)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .require_git(false)
        .follow_links(false)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let Ok(entry) = entry else { continue };
        let p = entry.path();
        if p.is_file() && !is_excluded_by_extension(p) {
            files.push(p.to_path_buf());
        }
    }

    // Sorted for reproducibility; the tag cache and outline cache both key
    // on the file list.
    files.sort();
    Ok(files)
}

fn is_excluded_by_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| EXCLUDED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Render root-relative paths as a `├──`/`└──` directory tree.
pub fn file_tree(root: &Path, files: &[PathBuf]) -> String {
    #[derive(Default)]
    struct Node {
        children: std::collections::BTreeMap<String, Node>,
    }

    let mut tree = Node::default();
    for file in files {
        let rel = file.strip_prefix(root).unwrap_or(file);
        let mut node = &mut tree;
        for part in rel.components() {
            let name = part.as_os_str().to_string_lossy().into_owned();
            node = node.children.entry(name).or_default();
        }
    }

    fn render(node: &Node, prefix: &str, out: &mut String) {
        let last = node.children.len().saturating_sub(1);
        for (i, (name, child)) in node.children.iter().enumerate() {
            let (connector, sub_prefix) = if i == last {
                ("└──", format!("{prefix}    "))
            } else {
                ("├──", format!("{prefix}│   "))
            };
            out.push_str(&format!("{prefix}{connector} {name}\n"));
            render(child, &sub_prefix, out);
        }
    }

    let mut out = String::new();
    render(&tree, "", &mut out);
    out
}
