//! Tag extraction from source files.
//!
//! One file in, one tag list out: resolve the grammar from the file name,
//! parse, run the bundled tag query, and emit `Def`/`Ref` tags in source
//! order. Names are screened by the stopword filter before emission.

mod filter;
mod treesitter;

pub use filter::{TagFilter, STOPWORDS};
pub use treesitter::{
    extension_to_language, language_for, query_source_for, Extraction, TagExtractor,
};
