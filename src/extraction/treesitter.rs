//! Grammar-driven tag extraction.
//!
//! Each supported language has a bundled `.scm` tag query compiled into the
//! binary. Queries use captures of the form `@name.definition.<kind>` and
//! `@name.reference.<kind>`; extraction routes on the prefix alone and never
//! interprets `<kind>`, so query authors are free to invent new kinds
//! without touching this module.
//!
//! The query assets cover more languages than the default grammar table:
//! dart, elisp and elm queries ship here but their grammars are not linked,
//! so those files resolve as unsupported until a grammar is registered.

use std::collections::HashMap;
use std::path::Path;
use std::time::SystemTime;

use once_cell::sync::Lazy;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Parser, Query, QueryCursor};
use tracing::trace;

use crate::error::{MapError, Result};
use crate::extraction::filter::TagFilter;
use crate::types::{Tag, TagKind};

/// Bundled tag queries, one per supported language.
mod queries {
    pub const C: &str = include_str!("../../queries/c-tags.scm");
    pub const C_SHARP: &str = include_str!("../../queries/c_sharp-tags.scm");
    pub const CPP: &str = include_str!("../../queries/cpp-tags.scm");
    pub const DART: &str = include_str!("../../queries/dart-tags.scm");
    pub const ELISP: &str = include_str!("../../queries/elisp-tags.scm");
    pub const ELIXIR: &str = include_str!("../../queries/elixir-tags.scm");
    pub const ELM: &str = include_str!("../../queries/elm-tags.scm");
    pub const GO: &str = include_str!("../../queries/go-tags.scm");
    pub const JAVA: &str = include_str!("../../queries/java-tags.scm");
    pub const JAVASCRIPT: &str = include_str!("../../queries/javascript-tags.scm");
    pub const OCAML: &str = include_str!("../../queries/ocaml-tags.scm");
    pub const PHP: &str = include_str!("../../queries/php-tags.scm");
    pub const PYTHON: &str = include_str!("../../queries/python-tags.scm");
    pub const RUBY: &str = include_str!("../../queries/ruby-tags.scm");
    pub const RUST: &str = include_str!("../../queries/rust-tags.scm");
    pub const TYPESCRIPT: &str = include_str!("../../queries/typescript-tags.scm");
}

/// Map a file extension to a language id.
pub fn extension_to_language(ext: &str) -> Option<&'static str> {
    match ext {
        "c" | "h" => Some("c"),
        "cs" => Some("c_sharp"),
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" => Some("cpp"),
        "dart" => Some("dart"),
        "el" => Some("elisp"),
        "ex" | "exs" => Some("elixir"),
        "elm" => Some("elm"),
        "go" => Some("go"),
        "java" => Some("java"),
        "js" | "mjs" | "cjs" | "jsx" => Some("javascript"),
        "ml" => Some("ocaml"),
        "php" | "phtml" => Some("php"),
        "py" | "pyi" | "pyw" => Some("python"),
        "rb" | "rake" | "gemspec" => Some("ruby"),
        "rs" => Some("rust"),
        "ts" | "mts" | "cts" => Some("typescript"),
        "tsx" => Some("tsx"),
        _ => None,
    }
}

/// Grammar handle for a language id. Languages with bundled queries but no
/// linked grammar return `None` here.
fn grammar_for(lang_id: &str) -> Option<Language> {
    match lang_id {
        "c" => Some(tree_sitter_c::LANGUAGE.into()),
        "c_sharp" => Some(tree_sitter_c_sharp::LANGUAGE.into()),
        "cpp" => Some(tree_sitter_cpp::LANGUAGE.into()),
        "elixir" => Some(tree_sitter_elixir::LANGUAGE.into()),
        "go" => Some(tree_sitter_go::LANGUAGE.into()),
        "java" => Some(tree_sitter_java::LANGUAGE.into()),
        "javascript" => Some(tree_sitter_javascript::LANGUAGE.into()),
        "ocaml" => Some(tree_sitter_ocaml::LANGUAGE_OCAML.into()),
        "php" => Some(tree_sitter_php::LANGUAGE_PHP.into()),
        "python" => Some(tree_sitter_python::LANGUAGE.into()),
        "ruby" => Some(tree_sitter_ruby::LANGUAGE.into()),
        "rust" => Some(tree_sitter_rust::LANGUAGE.into()),
        "typescript" => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        "tsx" => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
        _ => None,
    }
}

/// Tag query source for a language id. The tsx dialect shares the
/// typescript query.
pub fn query_source_for(lang_id: &str) -> Option<&'static str> {
    match lang_id {
        "c" => Some(queries::C),
        "c_sharp" => Some(queries::C_SHARP),
        "cpp" => Some(queries::CPP),
        "dart" => Some(queries::DART),
        "elisp" => Some(queries::ELISP),
        "elixir" => Some(queries::ELIXIR),
        "elm" => Some(queries::ELM),
        "go" => Some(queries::GO),
        "java" => Some(queries::JAVA),
        "javascript" => Some(queries::JAVASCRIPT),
        "ocaml" => Some(queries::OCAML),
        "php" => Some(queries::PHP),
        "python" => Some(queries::PYTHON),
        "ruby" => Some(queries::RUBY),
        "rust" => Some(queries::RUST),
        "typescript" | "tsx" => Some(queries::TYPESCRIPT),
        _ => None,
    }
}

/// Resolve the grammar and language id for a file name.
pub fn language_for(path: &Path) -> Option<(Language, &'static str)> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    let lang_id = extension_to_language(ext)?;
    let language = grammar_for(lang_id)?;
    Some((language, lang_id))
}

struct LangConfig {
    language: Language,
    query: Query,
}

/// Compiled (grammar, query) pairs, one per language with a linked grammar.
/// Compilation happens once; a failure is retained so every file of that
/// language reports the same query error.
static LANG_CONFIGS: Lazy<HashMap<&'static str, std::result::Result<LangConfig, String>>> =
    Lazy::new(|| {
        let mut configs = HashMap::new();
        for lang_id in [
            "c",
            "c_sharp",
            "cpp",
            "elixir",
            "go",
            "java",
            "javascript",
            "ocaml",
            "php",
            "python",
            "ruby",
            "rust",
            "typescript",
            "tsx",
        ] {
            let (Some(language), Some(source)) = (grammar_for(lang_id), query_source_for(lang_id))
            else {
                continue;
            };
            let compiled = Query::new(&language, source)
                .map(|query| LangConfig { language, query })
                .map_err(|e| e.to_string());
            configs.insert(lang_id, compiled);
        }
        configs
    });

/// The observed modification time of an extracted file, reported back to
/// the caller so it can populate the tag cache.
pub struct Extraction {
    pub tags: Vec<Tag>,
    pub mtime: SystemTime,
}

/// Parses one file at a time with a reusable tree-sitter parser.
///
/// Parsers are not thread safe; the extraction fan-out gives each worker
/// its own extractor.
pub struct TagExtractor {
    parser: Parser,
    filter: TagFilter,
}

impl TagExtractor {
    pub fn new() -> Self {
        Self::with_filter(TagFilter::default())
    }

    pub fn with_filter(filter: TagFilter) -> Self {
        Self {
            parser: Parser::new(),
            filter,
        }
    }

    /// Extract tags from the file at `fname`, stat-ing and reading it.
    pub fn extract(&mut self, fname: &Path, rel_fname: &str) -> Result<Extraction> {
        let (_, lang_id) =
            language_for(fname).ok_or_else(|| MapError::UnsupportedLanguage(fname.to_path_buf()))?;

        let metadata = std::fs::metadata(fname).map_err(|source| MapError::Read {
            path: fname.to_path_buf(),
            source,
        })?;
        let mtime = metadata.modified().map_err(|source| MapError::Read {
            path: fname.to_path_buf(),
            source,
        })?;

        let source = std::fs::read(fname).map_err(|source| MapError::Read {
            path: fname.to_path_buf(),
            source,
        })?;

        let tags = self.extract_source(&source, lang_id, fname, rel_fname)?;
        Ok(Extraction { tags, mtime })
    }

    /// Extract tags from in-memory source. `lang_id` must come from
    /// [`language_for`] / [`extension_to_language`].
    pub fn extract_source(
        &mut self,
        source: &[u8],
        lang_id: &str,
        fname: &Path,
        rel_fname: &str,
    ) -> Result<Vec<Tag>> {
        if source.is_empty() {
            return Err(MapError::EmptyFile(fname.to_path_buf()));
        }

        let config = match LANG_CONFIGS.get(lang_id) {
            Some(Ok(config)) => config,
            Some(Err(message)) => {
                return Err(MapError::Query {
                    language: lang_id.to_string(),
                    message: message.clone(),
                })
            }
            None => return Err(MapError::UnsupportedLanguage(fname.to_path_buf())),
        };

        self.parser
            .set_language(&config.language)
            .map_err(|_| MapError::Parse(fname.to_path_buf()))?;

        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| MapError::Parse(fname.to_path_buf()))?;

        let fname_str = fname.to_string_lossy();
        let capture_names = config.query.capture_names();
        let mut tags = Vec::new();

        // Captures stream in source order, which downstream sorting relies on
        // within a file.
        let mut cursor = QueryCursor::new();
        let mut captures = cursor.captures(&config.query, tree.root_node(), source);
        while let Some((m, index)) = captures.next() {
            let capture = m.captures[*index];
            let label = capture_names
                .get(capture.index as usize)
                .copied()
                .unwrap_or("");

            let kind = if label.starts_with("name.definition.") {
                TagKind::Def
            } else if label.starts_with("name.reference.") {
                TagKind::Ref
            } else {
                continue;
            };

            let name = capture.node.utf8_text(source).unwrap_or("");
            if name.is_empty() || !self.filter.accepts(name) {
                continue;
            }

            let row = capture.node.start_position().row as u32;
            trace!(file = %rel_fname, line = row, name, ?kind, "tag");
            tags.push(Tag::new(rel_fname, &fname_str, row, name, kind));
        }

        Ok(tags)
    }
}

impl Default for TagExtractor {
    fn default() -> Self {
        Self::new()
    }
}
