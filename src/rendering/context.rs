//! Per-file snippet rendering.
//!
//! The outline assembler hands a file's bytes and a set of 0-based lines
//! of interest to a [`ContextRenderer`] and splices whatever comes back
//! under the file's header. The trait mirrors the external tree-context
//! renderer's surface; the bundled [`PlainRenderer`] implements the subset
//! the outline needs (padding windows, elision markers) without a grammar.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::{MapError, Result};

/// Rendering knobs forwarded to the context renderer.
///
/// The outline assembler always uses [`RenderOptions::outline`], which
/// biases the output toward dense symbol tables rather than verbose
/// context.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub color: bool,
    pub show_last_line: bool,
    pub child_context: bool,
    pub top_margin: usize,
    pub mark_lines_of_interest: bool,
    pub lines_of_interest_padding: usize,
    pub top_of_file_parent_scope: bool,
}

impl RenderOptions {
    /// The option set used for outline blocks.
    pub fn outline() -> Self {
        Self {
            color: false,
            show_last_line: false,
            child_context: false,
            top_margin: 0,
            mark_lines_of_interest: false,
            lines_of_interest_padding: 2,
            top_of_file_parent_scope: false,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::outline()
    }
}

/// Expands a set of lines of interest into a formatted snippet.
pub trait ContextRenderer: Send + Sync {
    /// Render `code` showing `lines_of_interest` (0-based rows) plus
    /// whatever context the renderer chooses. A file the renderer cannot
    /// handle yields `Ok("")`; real failures are `MapError::Render` and
    /// cause the file's block to be omitted.
    fn render(
        &self,
        rel_fname: &str,
        code: &[u8],
        lines_of_interest: &BTreeSet<usize>,
        options: &RenderOptions,
    ) -> Result<String>;
}

/// Grammar-less renderer: lines of interest padded by a fixed window, gaps
/// elided with a marker line.
#[derive(Debug, Default)]
pub struct PlainRenderer;

impl PlainRenderer {
    const GAP_MARKER: &'static str = "⋮...";

    fn visible_lines(
        total: usize,
        lois: &BTreeSet<usize>,
        options: &RenderOptions,
    ) -> BTreeSet<usize> {
        let pad = options.lines_of_interest_padding;
        let mut visible = BTreeSet::new();
        for line in 0..options.top_margin.min(total) {
            visible.insert(line);
        }
        for &loi in lois {
            if loi >= total {
                continue;
            }
            let lo = loi.saturating_sub(pad);
            let hi = (loi + pad).min(total.saturating_sub(1));
            visible.extend(lo..=hi);
        }
        if options.show_last_line && total > 0 {
            visible.insert(total - 1);
        }
        visible
    }
}

impl ContextRenderer for PlainRenderer {
    fn render(
        &self,
        rel_fname: &str,
        code: &[u8],
        lines_of_interest: &BTreeSet<usize>,
        options: &RenderOptions,
    ) -> Result<String> {
        if lines_of_interest.is_empty() {
            return Ok(String::new());
        }
        let text = std::str::from_utf8(code)
            .map_err(|_| MapError::Render(PathBuf::from(rel_fname)))?;
        let lines: Vec<&str> = text.split('\n').collect();

        let visible = Self::visible_lines(lines.len(), lines_of_interest, options);
        if visible.is_empty() {
            return Ok(String::new());
        }

        let mut out = String::new();
        let mut previous: Option<usize> = None;
        for &line in &visible {
            let gap = match previous {
                Some(p) => line > p + 1,
                None => line > 0,
            };
            if gap {
                out.push_str(Self::GAP_MARKER);
                out.push('\n');
            }
            let marker = if options.mark_lines_of_interest && lines_of_interest.contains(&line) {
                '█'
            } else {
                '│'
            };
            out.push(marker);
            out.push_str(lines[line]);
            out.push('\n');
            previous = Some(line);
        }
        if visible.last().is_some_and(|&last| last + 1 < lines.len()) {
            out.push_str(Self::GAP_MARKER);
            out.push('\n');
        }

        Ok(out)
    }
}
