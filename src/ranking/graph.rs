//! Weighted file-reference graph.
//!
//! Nodes are files; an edge referencer -> definer is added per identifier
//! and per reference occurrence, so parallel edges between the same pair
//! accumulate naturally. Each edge remembers the identifier that created
//! it; rank distribution later attributes the edge's share of the
//! referencer's rank to `(definer, identifier)`.
//!
//! Edge weight is `mu(symbol) * sqrt(|references|)`: the square root damps
//! very widely referenced utility symbols, while the multiplier elevates
//! symbols the user has named and de-emphasizes underscore-private ones.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};

use super::refmap::ReferenceMaps;

/// Weight multiplier for a symbol.
pub fn mention_multiplier(symbol: &str, mentioned_idents: &HashSet<String>) -> f64 {
    if mentioned_idents.contains(symbol) {
        10.0
    } else if symbol.starts_with('_') {
        0.1
    } else {
        1.0
    }
}

/// Edge payload: the weight of this reference link and the identifier
/// that produced it.
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub weight: f64,
    pub symbol: String,
}

/// The file graph plus its stable file <-> node index.
pub struct FileGraph {
    pub graph: DiGraph<(), EdgeData>,
    pub node_of: HashMap<String, NodeIndex>,
    pub file_of: HashMap<NodeIndex, String>,
}

impl FileGraph {
    /// Build the graph from the reference maps.
    ///
    /// Node creation iterates the sorted file set and edge creation the
    /// sorted identifier set, so node and edge order is deterministic for
    /// identical inputs.
    pub fn build(maps: &ReferenceMaps, mentioned_idents: &HashSet<String>) -> Self {
        let mut graph = DiGraph::new();
        let mut node_of = HashMap::new();
        let mut file_of = HashMap::new();

        for file in maps.file_set() {
            let idx = graph.add_node(());
            node_of.insert(file.clone(), idx);
            file_of.insert(idx, file);
        }

        for ident in &maps.identifiers {
            let Some(def_files) = maps.defines.get(ident) else {
                continue;
            };
            if def_files.is_empty() {
                continue;
            }
            let refs = &maps.references[ident];
            let weight = mention_multiplier(ident, mentioned_idents) * (refs.len() as f64).sqrt();

            for ref_file in refs {
                let ref_node = node_of[ref_file];
                for def_file in def_files {
                    // Self-edges are intentional: a file referencing its own
                    // definition still contributes rank to it.
                    graph.add_edge(
                        ref_node,
                        node_of[def_file],
                        EdgeData {
                            weight,
                            symbol: ident.clone(),
                        },
                    );
                }
            }
        }

        Self {
            graph,
            node_of,
            file_of,
        }
    }
}
