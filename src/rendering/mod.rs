//! Outline rendering: from ranked tags to the final budgeted string.
//!
//! `to_tree` streams tags into per-file blocks; `best_tree_for_budget`
//! binary-searches the prefix length that best fits the token budget. The
//! per-file snippet and the token estimate are both delegated to injected
//! collaborators.

mod budget;
mod context;
mod tokens;
mod tree;

pub use budget::best_tree_for_budget;
pub use context::{ContextRenderer, PlainRenderer, RenderOptions};
pub use tokens::{sampled_token_count, CharEstimator, TokenEstimator};
pub use tree::to_tree;
