//! Core types for the repository map pipeline.
//!
//! Tags are the atoms everything else is built from: extraction produces
//! them, the reference maps fold them, and the outline assembler renders
//! them. They are frozen after creation and cheap to clone (`Arc<str>`
//! for the interned string fields) so they can be shared across the
//! extraction worker pool and the cache without copying.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serde helpers for `Arc<str>` fields.
mod arc_str_serde {
    use super::*;

    pub fn serialize<S>(arc: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(arc.as_ref())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Arc<str>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.into())
    }
}

/// A positioned symbol occurrence in a source file.
///
/// `line` is the 0-based row of the captured node's start position, so it
/// indexes directly into the file's `split('\n')` lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Path relative to the repository root (display form, e.g. "src/lib.rs")
    #[serde(with = "arc_str_serde")]
    pub rel_fname: Arc<str>,
    /// Absolute path, used for I/O
    #[serde(with = "arc_str_serde")]
    pub fname: Arc<str>,
    /// 0-based row of the symbol
    pub line: u32,
    /// The identifier text
    #[serde(with = "arc_str_serde")]
    pub name: Arc<str>,
    /// Definition site or use site
    pub kind: TagKind,
}

/// Whether a tag marks a symbol's declaration or one of its uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKind {
    /// Symbol definition (function, type, method, ...)
    Def,
    /// Symbol reference (call, type usage, ...)
    Ref,
}

impl Tag {
    pub fn new(rel_fname: &str, fname: &str, line: u32, name: &str, kind: TagKind) -> Self {
        Self {
            rel_fname: Arc::from(rel_fname),
            fname: Arc::from(fname),
            line,
            name: Arc::from(name),
            kind,
        }
    }

    pub fn is_def(&self) -> bool {
        matches!(self.kind, TagKind::Def)
    }

    pub fn is_ref(&self) -> bool {
        matches!(self.kind, TagKind::Ref)
    }
}

/// A `(file, symbol)` definition site with its distributed rank.
///
/// Produced by rank distribution, consumed once by the outline assembler.
/// Ordering is rank descending, then file, then symbol, so a plain sort
/// yields the stable output order.
#[derive(Debug, Clone)]
pub struct RankedDefinition {
    pub rel_fname: String,
    pub symbol: String,
    pub rank: f64,
}

impl RankedDefinition {
    pub fn new(rel_fname: impl Into<String>, symbol: impl Into<String>, rank: f64) -> Self {
        Self {
            rel_fname: rel_fname.into(),
            symbol: symbol.into(),
            rank,
        }
    }
}

impl PartialEq for RankedDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank && self.rel_fname == other.rel_fname && self.symbol == other.symbol
    }
}

impl Eq for RankedDefinition {}

impl PartialOrd for RankedDefinition {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankedDefinition {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Higher rank first; ties broken by file then symbol ascending.
        other
            .rank
            .partial_cmp(&self.rank)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| self.rel_fname.cmp(&other.rel_fname))
            .then_with(|| self.symbol.cmp(&other.symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_kind_helpers() {
        let def = Tag::new("a.rs", "/repo/a.rs", 0, "foo", TagKind::Def);
        let re = Tag::new("a.rs", "/repo/a.rs", 3, "foo", TagKind::Ref);
        assert!(def.is_def() && !def.is_ref());
        assert!(re.is_ref() && !re.is_def());
    }

    #[test]
    fn test_tag_serde_roundtrip() {
        #[derive(Serialize, Deserialize)]
        struct Wrap {
            tag: Tag,
        }
        let tag = Tag::new("src/a.rs", "/repo/src/a.rs", 12, "connect", TagKind::Def);
        let s = toml::to_string(&Wrap { tag: tag.clone() }).unwrap();
        let w: Wrap = toml::from_str(&s).unwrap();
        assert_eq!(tag, w.tag);
    }

    #[test]
    fn test_ranked_definition_ordering() {
        let mut defs = vec![
            RankedDefinition::new("b.rs", "beta", 0.5),
            RankedDefinition::new("a.rs", "beta", 0.5),
            RankedDefinition::new("a.rs", "alpha", 0.5),
            RankedDefinition::new("z.rs", "zeta", 0.9),
        ];
        defs.sort();
        assert_eq!(defs[0].rel_fname, "z.rs");
        assert_eq!(defs[1].symbol, "alpha");
        assert_eq!(defs[2].rel_fname, "a.rs");
        assert_eq!(defs[2].symbol, "beta");
        assert_eq!(defs[3].rel_fname, "b.rs");
    }
}
