//! Ranking pipeline: from reference maps to an ordered definition list.
//!
//! 1. Build the weighted file graph.
//! 2. Run personalized PageRank biased toward mentioned files.
//! 3. Redistribute each file's rank across its outgoing edges to get
//!    per-(definer, symbol) ranks.
//! 4. Sort and expand through the stored definition tags, skipping files
//!    already fully visible in the chat set.

mod graph;
mod pagerank;
mod refmap;

pub use graph::{mention_multiplier, EdgeData, FileGraph};
pub use pagerank::personalized_pagerank;
pub use refmap::{DefKey, ReferenceMaps};

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::types::{RankedDefinition, Tag};

/// Teleport boost for files the caller has flagged as salient.
const MENTIONED_FILE_WEIGHT: f64 = 100.0;

/// Teleport distribution: every node gets base mass `1/N`; mentioned files
/// get `100/N`. Normalization happens inside the PageRank iteration.
fn personalization_vector(
    file_graph: &FileGraph,
    mentioned_files: &HashSet<String>,
) -> HashMap<NodeIndex, f64> {
    let n = file_graph.graph.node_count() as f64;
    file_graph
        .node_of
        .iter()
        .map(|(file, &idx)| {
            let weight = if mentioned_files.contains(file) {
                MENTIONED_FILE_WEIGHT / n
            } else {
                1.0 / n
            };
            (idx, weight)
        })
        .collect()
}

/// Distribute file ranks onto (definer, symbol) pairs.
///
/// Each node's rank is split once across all of its outgoing edges in
/// proportion to edge weight; every portion is attributed to the target
/// file under the identifier that created the edge. Summed over a graph
/// where every node has an out-edge this conserves the total rank.
fn distribute_rank(
    file_graph: &FileGraph,
    ranks: &HashMap<NodeIndex, f64>,
) -> BTreeMap<DefKey, f64> {
    let mut edge_ranks: BTreeMap<DefKey, f64> = BTreeMap::new();

    for src in file_graph.graph.node_indices() {
        let total_weight: f64 = file_graph
            .graph
            .edges(src)
            .map(|e| e.weight().weight)
            .sum();
        if total_weight <= 0.0 {
            continue;
        }
        let src_rank = ranks.get(&src).copied().unwrap_or(0.0);

        for edge in file_graph.graph.edges(src) {
            let portion = src_rank * edge.weight().weight / total_weight;
            let def_file = &file_graph.file_of[&edge.target()];
            *edge_ranks
                .entry((def_file.clone(), edge.weight().symbol.clone()))
                .or_default() += portion;
        }
    }

    edge_ranks
}

/// Ranked (file, symbol) pairs, best first; ties broken by file then
/// symbol so the order is stable.
pub fn ranked_definitions(
    maps: &ReferenceMaps,
    mentioned_files: &HashSet<String>,
    mentioned_idents: &HashSet<String>,
    cancel: &CancelToken,
) -> Result<Vec<RankedDefinition>> {
    let file_graph = FileGraph::build(maps, mentioned_idents);
    if file_graph.graph.node_count() == 0 {
        return Ok(Vec::new());
    }
    debug!(
        nodes = file_graph.graph.node_count(),
        edges = file_graph.graph.edge_count(),
        "file graph built"
    );

    let personalization = personalization_vector(&file_graph, mentioned_files);
    let ranks = personalized_pagerank(&file_graph.graph, &personalization, cancel)?;
    let edge_ranks = distribute_rank(&file_graph, &ranks);

    let mut ranked: Vec<RankedDefinition> = edge_ranks
        .into_iter()
        .map(|((file, symbol), rank)| RankedDefinition::new(file, symbol, rank))
        .collect();
    ranked.sort();
    Ok(ranked)
}

/// The final tag list for the outline assembler: each ranked definition
/// expanded through its stored tags, in rank order, with chat files
/// skipped (they are already fully visible to the consumer).
pub fn rank_tags(
    maps: &ReferenceMaps,
    mentioned_files: &HashSet<String>,
    mentioned_idents: &HashSet<String>,
    chat_rel_fnames: &HashSet<String>,
    cancel: &CancelToken,
) -> Result<Vec<Tag>> {
    let ranked = ranked_definitions(maps, mentioned_files, mentioned_idents, cancel)?;

    let mut tags = Vec::new();
    for def in &ranked {
        if chat_rel_fnames.contains(&def.rel_fname) {
            continue;
        }
        if let Some(defs) = maps
            .definitions
            .get(&(def.rel_fname.clone(), def.symbol.clone()))
        {
            tags.extend(defs.iter().cloned());
        }
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagKind;

    fn tag(rel: &str, name: &str, kind: TagKind) -> Tag {
        Tag::new(rel, &format!("/repo/{rel}"), 0, name, kind)
    }

    fn rank(
        tags: &[Tag],
        mentioned_files: &[&str],
        mentioned_idents: &[&str],
    ) -> Vec<RankedDefinition> {
        let maps = ReferenceMaps::build(tags);
        let files: HashSet<String> = mentioned_files.iter().map(|s| s.to_string()).collect();
        let idents: HashSet<String> = mentioned_idents.iter().map(|s| s.to_string()).collect();
        ranked_definitions(&maps, &files, &idents, &CancelToken::new()).unwrap()
    }

    fn rank_of(ranked: &[RankedDefinition], symbol: &str) -> f64 {
        ranked
            .iter()
            .find(|d| d.symbol == symbol)
            .map(|d| d.rank)
            .unwrap()
    }

    #[test]
    fn test_single_reference_ranks_definer_first() {
        let tags = vec![
            tag("file_a.go", "compute", TagKind::Def),
            tag("file_b.go", "compute", TagKind::Ref),
        ];
        let ranked = rank(&tags, &[], &[]);
        assert!(!ranked.is_empty());
        assert_eq!(ranked[0].rel_fname, "file_a.go");
        assert_eq!(ranked[0].symbol, "compute");
        assert!(ranked[0].rank > 0.0);
    }

    #[test]
    fn test_no_references_fallback_still_ranks() {
        let tags = vec![
            tag("file_a.go", "alpha", TagKind::Def),
            tag("file_b.go", "beta", TagKind::Def),
        ];
        let ranked = rank(&tags, &[], &[]);
        // Fallback self-references keep both definitions rankable.
        assert_eq!(ranked.len(), 2);
        for def in &ranked {
            assert!(def.rank > 0.0);
        }
    }

    #[test]
    fn test_mention_boost_raises_rank() {
        // One file references two otherwise-identical symbols; mentioning
        // one of them gives its edge the larger share of the referencer's
        // rank.
        let base = vec![
            tag("def_a.go", "alpha", TagKind::Def),
            tag("def_b.go", "beta", TagKind::Def),
            tag("user.go", "alpha", TagKind::Ref),
            tag("user.go", "beta", TagKind::Ref),
        ];
        let plain = rank(&base, &[], &[]);
        let boosted = rank(&base, &[], &["alpha"]);

        // Unmentioned: the split is even.
        assert!((rank_of(&plain, "alpha") - rank_of(&plain, "beta")).abs() < 1e-12);
        // Mentioned: strictly ahead.
        assert!(rank_of(&boosted, "alpha") > rank_of(&boosted, "beta"));
        assert_eq!(boosted[0].symbol, "alpha");
    }

    #[test]
    fn test_rank_conservation() {
        // Every node has an out-edge (cycle), so distributed rank equals
        // the summed PageRank up to floating tolerance.
        let tags = vec![
            tag("file_a.go", "from_a", TagKind::Def),
            tag("file_b.go", "from_b", TagKind::Def),
            tag("file_a.go", "from_b", TagKind::Ref),
            tag("file_b.go", "from_a", TagKind::Ref),
        ];
        let ranked = rank(&tags, &[], &[]);

        let distributed: f64 = ranked.iter().map(|d| d.rank).sum();
        assert!((distributed - 1.0).abs() < 1e-6, "distributed {distributed}");
    }

    #[test]
    fn test_distribution_never_exceeds_pagerank_mass() {
        // file_b references two symbols, file_a references nothing back;
        // dangling nodes keep some of the mass, so the distributed total
        // stays at or below 1.
        let tags = vec![
            tag("file_a.go", "alpha", TagKind::Def),
            tag("file_c.go", "gamma", TagKind::Def),
            tag("file_b.go", "alpha", TagKind::Ref),
            tag("file_b.go", "alpha", TagKind::Ref),
            tag("file_b.go", "gamma", TagKind::Ref),
        ];
        let ranked = rank(&tags, &[], &[]);
        let distributed: f64 = ranked.iter().map(|d| d.rank).sum();
        assert!(distributed <= 1.0 + 1e-9, "distributed {distributed}");
    }

    #[test]
    fn test_mentioned_file_biases_ranking() {
        // Two independent def/ref pairs; mentioning the file that
        // references `target_sym` pulls that definer up.
        let tags = vec![
            tag("def_target.go", "target_sym", TagKind::Def),
            tag("def_other.go", "other_sym", TagKind::Def),
            tag("caller_a.go", "target_sym", TagKind::Ref),
            tag("caller_b.go", "other_sym", TagKind::Ref),
        ];
        let plain = rank(&tags, &[], &[]);
        let biased = rank(&tags, &["caller_a.go"], &[]);

        let plain_ratio = rank_of(&plain, "target_sym") / rank_of(&plain, "other_sym");
        let biased_ratio = rank_of(&biased, "target_sym") / rank_of(&biased, "other_sym");
        assert!(biased_ratio > plain_ratio);
    }

    #[test]
    fn test_rank_tags_skips_chat_files() {
        let tags = vec![
            tag("visible.go", "shown", TagKind::Def),
            tag("chat.go", "hidden", TagKind::Def),
            tag("user.go", "shown", TagKind::Ref),
            tag("user.go", "hidden", TagKind::Ref),
        ];
        let maps = ReferenceMaps::build(&tags);
        let chat: HashSet<String> = ["chat.go".to_string()].into_iter().collect();
        let out = rank_tags(
            &maps,
            &HashSet::new(),
            &HashSet::new(),
            &chat,
            &CancelToken::new(),
        )
        .unwrap();

        assert!(out.iter().any(|t| t.rel_fname.as_ref() == "visible.go"));
        assert!(out.iter().all(|t| t.rel_fname.as_ref() != "chat.go"));
    }

    #[test]
    fn test_deterministic_output() {
        let tags = vec![
            tag("file_a.go", "alpha", TagKind::Def),
            tag("file_b.go", "beta", TagKind::Def),
            tag("file_c.go", "alpha", TagKind::Ref),
            tag("file_c.go", "beta", TagKind::Ref),
        ];
        let first = rank(&tags, &[], &[]);
        let second = rank(&tags, &[], &[]);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.rel_fname, b.rel_fname);
            assert_eq!(a.symbol, b.symbol);
            assert_eq!(a.rank.to_bits(), b.rank.to_bits());
        }
    }

    #[test]
    fn test_empty_input() {
        let ranked = rank(&[], &[], &[]);
        assert!(ranked.is_empty());
    }
}
