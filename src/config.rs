//! Map configuration.
//!
//! All tunables are carried explicitly on [`MapConfig`] and threaded through
//! the orchestrator; the core never consults process globals or environment
//! variables. The CLI may pre-populate a config from a `repomap.toml` at the
//! repository root:
//!
//! ```toml
//! max-map-tokens = 2048
//! map-mul-no-files = 8
//! max-context-window = 16000
//! content-prefix = "Here are summaries of some {other}files:\n"
//! refresh = "auto"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Token budget defaults, matching the tool's historical behavior.
pub const DEFAULT_MAX_MAP_TOKENS: usize = 1024;
pub const DEFAULT_MAP_MUL_NO_FILES: usize = 8;
pub const DEFAULT_MAX_CONTEXT_WINDOW: usize = 16_000;

/// Context-window padding reserved when enlarging the budget for a
/// chat-less invocation.
pub const CONTEXT_WINDOW_PADDING: usize = 4096;

/// When to bypass the per-input outline cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPolicy {
    /// Serve cached outlines; recompute when inputs change.
    #[default]
    Auto,
    /// Recompute on every call.
    Always,
    /// Only recompute when the caller passes `force_refresh`.
    Manual,
}

/// Configuration for one [`crate::RepoMap`] instance.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Repository root; relative paths in the output are derived from it.
    pub root: PathBuf,
    /// Token budget for the map. `0` disables map generation.
    pub max_map_tokens: usize,
    /// Budget multiplier applied when the chat set is empty.
    pub map_mul_no_files: usize,
    /// Upper bound for the enlarged budget (minus padding).
    pub max_context_window: usize,
    /// Optional prefix template; `{other}` expands to `"other "` when chat
    /// files are present, `""` otherwise.
    pub content_prefix: Option<String>,
    pub refresh: RefreshPolicy,
    pub verbose: bool,
}

impl MapConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_map_tokens: DEFAULT_MAX_MAP_TOKENS,
            map_mul_no_files: DEFAULT_MAP_MUL_NO_FILES,
            max_context_window: DEFAULT_MAX_CONTEXT_WINDOW,
            content_prefix: None,
            refresh: RefreshPolicy::default(),
            verbose: false,
        }
    }

    pub fn with_max_map_tokens(mut self, tokens: usize) -> Self {
        self.max_map_tokens = tokens;
        self
    }

    pub fn with_map_mul_no_files(mut self, mul: usize) -> Self {
        self.map_mul_no_files = mul;
        self
    }

    pub fn with_max_context_window(mut self, window: usize) -> Self {
        self.max_context_window = window;
        self
    }

    pub fn with_content_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.content_prefix = Some(prefix.into());
        self
    }

    pub fn with_refresh(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Overlay settings from `<root>/repomap.toml` when present.
    /// Unreadable or malformed files are ignored; the defaults stand.
    pub fn load_overrides(mut self) -> Self {
        let path = self.root.join("repomap.toml");
        if let Some(raw) = RawConfig::load(&path) {
            if let Some(tokens) = raw.max_map_tokens {
                self.max_map_tokens = tokens;
            }
            if let Some(mul) = raw.map_mul_no_files {
                self.map_mul_no_files = mul;
            }
            if let Some(window) = raw.max_context_window {
                self.max_context_window = window;
            }
            if let Some(prefix) = raw.content_prefix {
                self.content_prefix = Some(prefix);
            }
            if let Some(refresh) = raw.refresh {
                self.refresh = refresh;
            }
        }
        self
    }

    /// Relative form of `fname` with respect to the configured root.
    /// Paths outside the root are returned as given.
    pub fn rel_fname(&self, fname: &Path) -> String {
        fname
            .strip_prefix(&self.root)
            .unwrap_or(fname)
            .to_string_lossy()
            .into_owned()
    }
}

/// Raw config as deserialized from `repomap.toml`.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    max_map_tokens: Option<usize>,
    map_mul_no_files: Option<usize>,
    max_context_window: Option<usize>,
    content_prefix: Option<String>,
    refresh: Option<RefreshPolicy>,
}

impl RawConfig {
    fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        toml::from_str(&content).ok()
    }
}
