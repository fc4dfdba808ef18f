//! Top-level orchestrator.
//!
//! `RepoMap` composes the pipeline: extraction (through the tag cache),
//! reference maps, the file graph, personalized ranking, and the budgeted
//! outline. One instance is meant to live as long as the repository view
//! it serves; the tag cache and the per-input outline cache carry state
//! across invocations.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use dashmap::{DashMap, DashSet};
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::cache::{MemoryCache, TagCache};
use crate::cancel::CancelToken;
use crate::config::{MapConfig, RefreshPolicy, CONTEXT_WINDOW_PADDING};
use crate::error::Result;
use crate::extraction::TagExtractor;
use crate::ranking::{rank_tags, ReferenceMaps};
use crate::rendering::{
    best_tree_for_budget, CharEstimator, ContextRenderer, PlainRenderer, RenderOptions,
    TokenEstimator,
};
use crate::types::Tag;

/// Outline cache key: the deduplicated input lists plus the effective
/// budget. Sorted so the caller's ordering does not defeat the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OutlineKey {
    chat: Vec<String>,
    other: Vec<String>,
    budget: usize,
}

impl OutlineKey {
    fn new(chat_files: &[PathBuf], other_files: &[PathBuf], budget: usize) -> Self {
        let mut chat: Vec<String> = chat_files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let mut other: Vec<String> = other_files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        chat.sort();
        other.sort();
        Self {
            chat,
            other,
            budget,
        }
    }
}

/// The ranked-map generator.
pub struct RepoMap {
    config: MapConfig,
    cache: Arc<dyn TagCache>,
    estimator: Arc<dyn TokenEstimator>,
    renderer: Arc<dyn ContextRenderer>,
    /// Paths already warned about; each path warns at most once.
    warned_files: DashSet<String>,
    /// Finished outlines per input key.
    outline_cache: DashMap<OutlineKey, String>,
    last_map: RwLock<String>,
    total_processing_time: RwLock<f64>,
}

impl RepoMap {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            cache: Arc::new(MemoryCache::new()),
            estimator: Arc::new(CharEstimator),
            renderer: Arc::new(PlainRenderer),
            warned_files: DashSet::new(),
            outline_cache: DashMap::new(),
            last_map: RwLock::new(String::new()),
            total_processing_time: RwLock::new(0.0),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn TagCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ContextRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// The most recently generated outline.
    pub fn last_map(&self) -> String {
        self.last_map.read().expect("last_map lock").clone()
    }

    /// Seconds spent in the last generation.
    pub fn total_processing_time(&self) -> f64 {
        *self.total_processing_time.read().expect("timing lock")
    }

    /// Generate the repository map.
    ///
    /// `mentioned_files` are root-relative paths and `mentioned_idents`
    /// identifier names the caller considers conversationally salient;
    /// both bias ranking. Only cancellation surfaces as an error; per-file
    /// problems are skipped and an unrankable input yields `Ok("")`.
    pub fn generate(
        &self,
        chat_files: &[PathBuf],
        other_files: &[PathBuf],
        mentioned_files: &HashSet<String>,
        mentioned_idents: &HashSet<String>,
        force_refresh: bool,
    ) -> Result<String> {
        self.generate_cancellable(
            chat_files,
            other_files,
            mentioned_files,
            mentioned_idents,
            force_refresh,
            &CancelToken::new(),
        )
    }

    /// [`RepoMap::generate`] with an external cancellation token.
    pub fn generate_cancellable(
        &self,
        chat_files: &[PathBuf],
        other_files: &[PathBuf],
        mentioned_files: &HashSet<String>,
        mentioned_idents: &HashSet<String>,
        force_refresh: bool,
        cancel: &CancelToken,
    ) -> Result<String> {
        if self.config.max_map_tokens == 0 {
            debug!("repo map disabled by zero token budget");
            return Ok(String::new());
        }

        let started = Instant::now();

        // With no chat files the outline is all the consumer sees; give it
        // a larger share of the context window.
        let mut max_map_tokens = self.config.max_map_tokens;
        if chat_files.is_empty() && self.config.max_context_window > 0 {
            let target = (max_map_tokens * self.config.map_mul_no_files)
                .min(self.config.max_context_window.saturating_sub(CONTEXT_WINDOW_PADDING));
            if target > 0 {
                max_map_tokens = target;
            }
        }

        let key = OutlineKey::new(chat_files, other_files, max_map_tokens);
        let bypass_cache = force_refresh || self.config.refresh == RefreshPolicy::Always;
        if !bypass_cache {
            if let Some(cached) = self.outline_cache.get(&key) {
                trace!("outline cache hit");
                return Ok(cached.clone());
            }
        }

        let listing = self.ranked_tags_map(
            chat_files,
            other_files,
            max_map_tokens,
            mentioned_files,
            mentioned_idents,
            cancel,
        )?;

        let elapsed = started.elapsed().as_secs_f64();
        *self.total_processing_time.write().expect("timing lock") = elapsed;

        if listing.is_empty() {
            return Ok(String::new());
        }

        if self.config.verbose {
            let tokens = crate::rendering::sampled_token_count(self.estimator.as_ref(), &listing);
            debug!(tokens, elapsed, "repo map generated");
        }

        let mut content = String::new();
        if let Some(prefix) = &self.config.content_prefix {
            let other = if chat_files.is_empty() { "" } else { "other " };
            content.push_str(&prefix.replace("{other}", other));
        }
        content.push_str(&listing);

        self.outline_cache.insert(key, content.clone());
        *self.last_map.write().expect("last_map lock") = content.clone();

        Ok(content)
    }

    /// Run the pipeline for one deduplicated input set.
    fn ranked_tags_map(
        &self,
        chat_files: &[PathBuf],
        other_files: &[PathBuf],
        max_map_tokens: usize,
        mentioned_files: &HashSet<String>,
        mentioned_idents: &HashSet<String>,
        cancel: &CancelToken,
    ) -> Result<String> {
        let all_files = unique_files(chat_files, other_files);
        let tags = self.tags_for_files(&all_files, cancel)?;
        if tags.is_empty() {
            return Ok(String::new());
        }
        debug!(files = all_files.len(), tags = tags.len(), "tags collected");

        let chat_rel: HashSet<String> = chat_files
            .iter()
            .map(|f| self.config.rel_fname(f))
            .collect();

        // Chat files join the mentioned set so the walk teleports toward
        // the files the conversation is already anchored on.
        let mut personalized: HashSet<String> = mentioned_files.clone();
        personalized.extend(chat_rel.iter().cloned());

        let maps = ReferenceMaps::build(&tags);
        let ranked = rank_tags(&maps, &personalized, mentioned_idents, &chat_rel, cancel)?;

        best_tree_for_budget(
            &ranked,
            max_map_tokens,
            self.estimator.as_ref(),
            self.renderer.as_ref(),
            &RenderOptions::outline(),
            cancel,
        )
    }

    /// Extract tags for every file, fanning out over the worker pool.
    /// Input order is restored afterwards so downstream output is stable.
    fn tags_for_files(&self, files: &[PathBuf], cancel: &CancelToken) -> Result<Vec<Tag>> {
        let mut indexed: Vec<(usize, Vec<Tag>)> = files
            .par_iter()
            .enumerate()
            .map_init(TagExtractor::new, |extractor, (index, fname)| {
                if cancel.is_cancelled() {
                    return (index, Vec::new());
                }
                let tags = self.tags_for_file(extractor, fname);
                (index, tags)
            })
            .collect();
        cancel.check()?;

        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().flat_map(|(_, tags)| tags).collect())
    }

    /// One file's tags, through the cache. Failures are logged (once per
    /// path for warnings) and yield no tags.
    fn tags_for_file(&self, extractor: &mut TagExtractor, fname: &Path) -> Vec<Tag> {
        let rel = self.config.rel_fname(fname);
        let abs = fname.to_string_lossy();

        if let Ok(metadata) = std::fs::metadata(fname) {
            if let Ok(mtime) = metadata.modified() {
                if let Some(tags) = self.cache.get(&abs, mtime) {
                    trace!(file = %rel, "tag cache hit");
                    return tags;
                }
            }
        }

        match extractor.extract(fname, &rel) {
            Ok(extraction) => {
                self.cache
                    .set(&abs, extraction.mtime, extraction.tags.clone());
                extraction.tags
            }
            Err(e) if e.is_unsupported() => {
                trace!(file = %rel, "skipping unsupported file");
                Vec::new()
            }
            Err(e) => {
                if self.warned_files.insert(abs.into_owned()) {
                    warn!(file = %rel, error = %e, "failed to extract tags");
                }
                Vec::new()
            }
        }
    }
}

/// Chat and other files combined, deduplicated, input order preserved.
fn unique_files(chat_files: &[PathBuf], other_files: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    chat_files
        .iter()
        .chain(other_files.iter())
        .filter(|p| seen.insert((*p).clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;

    #[test]
    fn test_unique_files_preserves_order() {
        let chat = vec![PathBuf::from("/r/a.go"), PathBuf::from("/r/b.go")];
        let other = vec![
            PathBuf::from("/r/b.go"),
            PathBuf::from("/r/c.go"),
            PathBuf::from("/r/a.go"),
        ];
        let all = unique_files(&chat, &other);
        assert_eq!(
            all,
            vec![
                PathBuf::from("/r/a.go"),
                PathBuf::from("/r/b.go"),
                PathBuf::from("/r/c.go"),
            ]
        );
    }

    #[test]
    fn test_zero_budget_returns_empty() {
        let config = MapConfig::new("/tmp").with_max_map_tokens(0);
        let rm = RepoMap::new(config);
        let out = rm
            .generate(
                &[],
                &[PathBuf::from("/tmp/a.go")],
                &HashSet::new(),
                &HashSet::new(),
                false,
            )
            .unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_outline_key_order_insensitive() {
        let a = OutlineKey::new(
            &[PathBuf::from("x.go"), PathBuf::from("y.go")],
            &[PathBuf::from("z.go")],
            100,
        );
        let b = OutlineKey::new(
            &[PathBuf::from("y.go"), PathBuf::from("x.go")],
            &[PathBuf::from("z.go")],
            100,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_cancelled_generate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.go"), "package main\nfunc Foo() {}\n").unwrap();

        let rm = RepoMap::new(MapConfig::new(dir.path()));
        let token = CancelToken::new();
        token.cancel();

        let result = rm.generate_cancellable(
            &[],
            &[dir.path().join("a.go")],
            &HashSet::new(),
            &HashSet::new(),
            false,
            &token,
        );
        assert!(matches!(result, Err(MapError::Cancelled)));
    }
}
