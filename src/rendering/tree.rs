//! Streaming outline assembly.
//!
//! Tags are sorted by (file, line) and walked once, accumulating lines of
//! interest per file; a sentinel tag triggers the final flush. Each file
//! contributes a `\n<file>:\n` header followed by its rendered snippet.
//! Output lines are truncated to 100 characters to keep minified files
//! from blowing up the outline.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::warn;

use super::context::{ContextRenderer, RenderOptions};
use crate::types::Tag;

/// Hard cap on outline line width.
const MAX_LINE_CHARS: usize = 100;

/// File name no real tag can carry; its arrival flushes the last group.
const SENTINEL: &str = "\u{0}sentinel\u{0}";

/// Render the ranked tag slice into the outline string.
///
/// A file whose bytes cannot be read or whose snippet fails to render has
/// its block omitted; both are non-fatal.
pub fn to_tree(tags: &[Tag], renderer: &dyn ContextRenderer, options: &RenderOptions) -> String {
    if tags.is_empty() {
        return String::new();
    }

    let mut sorted: Vec<&Tag> = tags.iter().collect();
    sorted.sort_by(|a, b| {
        a.rel_fname
            .cmp(&b.rel_fname)
            .then_with(|| a.line.cmp(&b.line))
    });

    let sentinel = Tag::new(SENTINEL, SENTINEL, 0, SENTINEL, crate::types::TagKind::Def);

    let mut output = String::new();
    let mut cur_rel: Option<&Tag> = None;
    let mut lines_of_interest: BTreeSet<usize> = BTreeSet::new();

    for tag in sorted.into_iter().chain(std::iter::once(&sentinel)) {
        let file_changed = cur_rel
            .map(|cur| cur.rel_fname != tag.rel_fname)
            .unwrap_or(true);

        if file_changed {
            if let Some(cur) = cur_rel {
                flush_file(&mut output, cur, &lines_of_interest, renderer, options);
            }
            if tag.rel_fname.as_ref() == SENTINEL {
                break;
            }
            cur_rel = Some(tag);
            lines_of_interest.clear();
        }

        lines_of_interest.insert(tag.line as usize);
    }

    truncate_lines(&output)
}

/// Append one file's header and snippet; skip the block entirely when the
/// file cannot be read or rendered.
fn flush_file(
    output: &mut String,
    tag: &Tag,
    lines_of_interest: &BTreeSet<usize>,
    renderer: &dyn ContextRenderer,
    options: &RenderOptions,
) {
    let code = match std::fs::read(Path::new(tag.fname.as_ref())) {
        Ok(code) => code,
        Err(e) => {
            warn!(file = %tag.fname, error = %e, "failed to read file for rendering");
            return;
        }
    };

    match renderer.render(&tag.rel_fname, &code, lines_of_interest, options) {
        Ok(snippet) => {
            output.push('\n');
            output.push_str(&tag.rel_fname);
            output.push_str(":\n");
            output.push_str(&snippet);
        }
        Err(e) => {
            warn!(file = %tag.rel_fname, error = %e, "failed to render snippet");
        }
    }
}

/// Clamp every line to [`MAX_LINE_CHARS`] characters and normalize to a
/// trailing newline.
fn truncate_lines(output: &str) -> String {
    let truncated: Vec<String> = output
        .split('\n')
        .map(|line| {
            if line.chars().count() > MAX_LINE_CHARS {
                line.chars().take(MAX_LINE_CHARS).collect()
            } else {
                line.to_string()
            }
        })
        .collect();
    let mut joined = truncated.join("\n");
    if !joined.ends_with('\n') {
        joined.push('\n');
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::context::PlainRenderer;
    use crate::types::TagKind;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_groups_by_file_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.go", "func Alpha() {}\nfunc Beta() {}\n");
        let b = write_file(dir.path(), "b.go", "func Gamma() {}\n");

        let tags = vec![
            Tag::new("a.go", &a.to_string_lossy(), 0, "Alpha", TagKind::Def),
            Tag::new("b.go", &b.to_string_lossy(), 0, "Gamma", TagKind::Def),
            Tag::new("a.go", &a.to_string_lossy(), 1, "Beta", TagKind::Def),
        ];

        let out = to_tree(&tags, &PlainRenderer, &RenderOptions::outline());

        assert!(out.contains("\na.go:\n"));
        assert!(out.contains("\nb.go:\n"));
        assert!(out.contains("Alpha"));
        assert!(out.contains("Gamma"));
        // Files appear once each, grouped.
        assert_eq!(out.matches("a.go:").count(), 1);
        let a_pos = out.find("a.go:").unwrap();
        let b_pos = out.find("b.go:").unwrap();
        assert!(a_pos < b_pos);
    }

    #[test]
    fn test_empty_tags() {
        assert_eq!(
            to_tree(&[], &PlainRenderer, &RenderOptions::outline()),
            ""
        );
    }

    #[test]
    fn test_unreadable_file_block_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.go", "func Alpha() {}\n");

        let tags = vec![
            Tag::new("gone.go", "/nonexistent/gone.go", 0, "Ghost", TagKind::Def),
            Tag::new("a.go", &a.to_string_lossy(), 0, "Alpha", TagKind::Def),
        ];
        let out = to_tree(&tags, &PlainRenderer, &RenderOptions::outline());
        assert!(!out.contains("gone.go"));
        assert!(out.contains("a.go:"));
    }

    #[test]
    fn test_long_lines_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let long_line = format!("var data = \"{}\";", "x".repeat(400));
        let a = write_file(dir.path(), "minified.js", &long_line);

        let tags = vec![Tag::new(
            "minified.js",
            &a.to_string_lossy(),
            0,
            "data",
            TagKind::Def,
        )];
        let out = to_tree(&tags, &PlainRenderer, &RenderOptions::outline());
        assert!(out.lines().all(|l| l.chars().count() <= 100));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_tags_sorted_by_line_within_file() {
        let dir = tempfile::tempdir().unwrap();
        let content = (0..20).map(|i| format!("fn f{i}() {{}}")).collect::<Vec<_>>().join("\n");
        let a = write_file(dir.path(), "many.rs", &content);
        let abs = a.to_string_lossy();

        // Deliberately unsorted input.
        let tags = vec![
            Tag::new("many.rs", &abs, 15, "f15", TagKind::Def),
            Tag::new("many.rs", &abs, 3, "f3", TagKind::Def),
        ];
        let out = to_tree(&tags, &PlainRenderer, &RenderOptions::outline());
        let p3 = out.find("f3").unwrap();
        let p15 = out.find("f15").unwrap();
        assert!(p3 < p15);
    }
}
