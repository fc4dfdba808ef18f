//! Tag name filtering.
//!
//! Very short names and keyword-like identifiers show up in every file of a
//! repository; linking on them would flood the reference graph with edges
//! that carry no signal. The extractor drops them before tags are emitted.
//!
//! The stoplist is a static, language-agnostic union of keywords across the
//! supported grammars. It is a tunable asset; its exact membership is pinned
//! by a test so ranking output stays reproducible.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Names of one or two characters are rejected regardless of the stoplist.
const MIN_NAME_LEN: usize = 3;

/// Keywords and ubiquitous identifiers across the supported languages.
/// Entries shorter than [`MIN_NAME_LEN`] are intentionally absent; the
/// length rule already covers them.
pub static STOPWORDS: &[&str] = &[
    "abstract", "alias", "and", "any", "args", "array", "assert", "async", "await", "base",
    "begin", "bool", "boolean", "break", "byte", "case", "catch", "chan", "char", "class",
    "const", "continue", "debugger", "decimal", "def", "default", "defer", "delegate", "delete",
    "double", "elif", "else", "elsif", "end", "ensure", "enum", "except", "explicit", "export",
    "extends", "extern", "false", "final", "finally", "float", "for", "foreach", "friend",
    "from", "func", "function", "global", "goto", "impl", "implements", "implicit", "import",
    "inline", "instanceof", "int", "interface", "internal", "lambda", "let", "lock", "long",
    "loop", "macro", "match", "module", "mut", "mutable", "namespace", "new", "nil", "none",
    "not", "null", "object", "operator", "out", "override", "package", "params", "pass",
    "print", "private", "protected", "public", "raise", "range", "readonly", "record", "redo",
    "ref", "require", "rescue", "retry", "return", "sbyte", "sealed", "select", "self",
    "short", "signed", "sizeof", "static", "string", "struct", "super", "switch", "template",
    "then", "this", "throw", "throws", "trait", "true", "try", "type", "typedef", "typeof",
    "uint", "ulong", "union", "unless", "unsafe", "unsigned", "until", "use", "using", "var",
    "virtual", "void", "volatile", "when", "where", "while", "with", "yield",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOPWORDS.iter().copied().collect());

/// Predicate applied to candidate tag names before emission.
#[derive(Debug, Clone, Copy, Default)]
pub enum TagFilter {
    /// Length rule plus the stoplist; the extractor's default.
    #[default]
    Standard,
    /// Accept every non-empty name (used by tests and diagnostics).
    Permissive,
}

impl TagFilter {
    /// Whether a tag with this name should be emitted.
    pub fn accepts(&self, name: &str) -> bool {
        match self {
            TagFilter::Permissive => !name.is_empty(),
            TagFilter::Standard => {
                name.len() >= MIN_NAME_LEN && !STOPWORD_SET.contains(name.to_lowercase().as_str())
            }
        }
    }
}
