//! Reference maps: the fold from a flat tag list to per-symbol indexes.
//!
//! Four views over the same tags feed graph construction and, later, the
//! outline assembler:
//! - `defines`: symbol -> files containing a definition
//! - `references`: symbol -> one entry per reference occurrence
//! - `definitions`: (file, symbol) -> the original definition tags
//! - `identifiers`: symbols that are both defined and referenced
//!
//! Reference multiplicity matters: a file referencing the same symbol five
//! times appears five times in its list, which feeds the sqrt damping in
//! edge weighting.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::Tag;

/// Key into `definitions`: (relative file, symbol).
pub type DefKey = (String, String);

/// Per-symbol indexes over one invocation's tags. Built once per map
/// build, discarded after ranking.
#[derive(Debug, Default)]
pub struct ReferenceMaps {
    /// symbol -> set of relative files defining it
    pub defines: BTreeMap<String, BTreeSet<String>>,
    /// symbol -> relative file per reference occurrence, duplicates kept
    pub references: BTreeMap<String, Vec<String>>,
    /// (relative file, symbol) -> definition tags in source order
    pub definitions: BTreeMap<DefKey, Vec<Tag>>,
    /// symbols appearing in both `defines` and `references`
    pub identifiers: BTreeSet<String>,
}

impl ReferenceMaps {
    /// Fold `tags` into the four maps.
    ///
    /// When the corpus contains no references at all, `references` is
    /// populated from `defines` (one self-reference per defining file) so
    /// the centrality computation stays well-defined.
    pub fn build(tags: &[Tag]) -> Self {
        let mut maps = Self::default();

        for tag in tags {
            let rel = tag.rel_fname.to_string();
            let name = tag.name.to_string();

            if tag.is_def() {
                maps.defines.entry(name.clone()).or_default().insert(rel.clone());
                maps.definitions
                    .entry((rel, name))
                    .or_default()
                    .push(tag.clone());
            } else {
                maps.references.entry(name).or_default().push(rel);
            }
        }

        if maps.references.is_empty() {
            for (symbol, def_files) in &maps.defines {
                maps.references
                    .insert(symbol.clone(), def_files.iter().cloned().collect());
            }
        }

        maps.identifiers = maps
            .defines
            .keys()
            .filter(|symbol| maps.references.contains_key(*symbol))
            .cloned()
            .collect();

        maps
    }

    /// All files appearing in either map; these become the graph nodes.
    pub fn file_set(&self) -> BTreeSet<String> {
        let mut files = BTreeSet::new();
        for def_files in self.defines.values() {
            files.extend(def_files.iter().cloned());
        }
        for ref_files in self.references.values() {
            files.extend(ref_files.iter().cloned());
        }
        files
    }
}
