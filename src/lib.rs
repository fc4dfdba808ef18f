//! repomap - ranked textual maps of source repositories.
//!
//! Produces a compact, token-budgeted outline of the most relevant symbol
//! definitions in a repository, for seeding an LLM's context window.
//!
//! # Pipeline
//!
//! ```text
//! paths → Tag Extraction → Reference Maps → File Graph → PageRank → Outline
//!   ↓       (cached)           ↓              ↓            ↓          ↓
//! ignore   tree-sitter     per-symbol      petgraph    personalized  budgeted
//! crate     + .scm           indexes        DiGraph    power method  snippets
//! ```
//!
//! Extraction fans out over a rayon worker pool; the tag cache is shared
//! mutable state with reader/writer exclusion; everything else is owned by
//! a single invocation. Long-running stages honor a cooperative
//! [`CancelToken`].

pub mod cache;
pub mod cancel;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extraction;
pub mod map;
pub mod ranking;
pub mod rendering;
pub mod types;

pub use cache::{MemoryCache, NoopCache, TagCache};
pub use cancel::CancelToken;
pub use config::{MapConfig, RefreshPolicy};
pub use error::{MapError, Result};
pub use map::RepoMap;
pub use rendering::{CharEstimator, ContextRenderer, PlainRenderer, RenderOptions, TokenEstimator};
pub use types::{RankedDefinition, Tag, TagKind};
