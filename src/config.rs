//! Collector configuration
//!
//! Scheme list, source/target paths and index mode. Loaded from a RON file
//! when one is present, otherwise the defaults match the layout produced by
//! the scheme build (`schemes/schemes/<id>` -> `assets`).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CollectError;

/// Schemes bundled by default (Malayalam, Kannada, Hindi)
pub const DEFAULT_SCHEMES: [&str; 3] = ["ml", "kn", "hi"];

/// Scheme build output, relative to the project root
pub const DEFAULT_SOURCE_DIR: &str = "schemes/schemes";

/// Assets directory, relative to the project root
pub const DEFAULT_TARGET_DIR: &str = "assets";

/// Config file looked up in the project root when none is given
pub const DEFAULT_CONFIG_FILE: &str = "varnam-assets.ron";

/// Index file name shared by all schemes
pub const PACKS_INDEX_FILE: &str = "packs.json";

/// How per-scheme pack indexes are written to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndexMode {
    /// Each scheme rewrites `packs.json`; the last scheme wins
    #[default]
    Overwrite,
    /// One `packs.json` holding every scheme's packs in scheme order
    Combined,
    /// One `packs-<id>.json` per scheme
    PerScheme,
}

impl IndexMode {
    /// Human-readable label for the mode
    pub fn label(&self) -> &'static str {
        match self {
            IndexMode::Overwrite => "overwrite",
            IndexMode::Combined => "combined",
            IndexMode::PerScheme => "per-scheme",
        }
    }

    /// Index file name written for `scheme`
    pub fn index_file_name(&self, scheme: &str) -> String {
        match self {
            IndexMode::PerScheme => format!("packs-{}.json", scheme),
            IndexMode::Overwrite | IndexMode::Combined => PACKS_INDEX_FILE.to_string(),
        }
    }
}

/// Everything the collector needs to know about where to read and write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Directory holding one subdirectory per scheme
    pub source_root: PathBuf,
    /// Flat assets directory receiving copies and the index
    pub target_dir: PathBuf,
    /// Scheme identifiers, collected in this order
    pub schemes: Vec<String>,
    pub index_mode: IndexMode,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from(DEFAULT_SOURCE_DIR),
            target_dir: PathBuf::from(DEFAULT_TARGET_DIR),
            schemes: DEFAULT_SCHEMES.iter().map(|s| s.to_string()).collect(),
            index_mode: IndexMode::default(),
        }
    }
}

impl CollectorConfig {
    /// Default layout rooted at `root`
    pub fn with_root(root: &Path) -> Self {
        Self::default().resolve_paths(root)
    }

    /// Load a config from a RON file
    pub fn load(path: &Path) -> Result<Self, CollectError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CollectError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::load_from_str(&contents)
    }

    /// Load a config from a RON string
    pub fn load_from_str(contents: &str) -> Result<Self, CollectError> {
        ron::from_str(contents)
            .map_err(|e| CollectError::Config(format!("failed to parse config: {}", e)))
    }

    /// Serialize to pretty RON, as written by `--write-config`
    pub fn to_ron_string(&self) -> Result<String, CollectError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .indentor("  ".to_string());

        ron::ser::to_string_pretty(self, pretty)
            .map_err(|e| CollectError::Serialize(format!("failed to serialize config: {}", e)))
    }

    /// Anchor relative source/target paths at `root`. Absolute paths are kept.
    pub fn resolve_paths(mut self, root: &Path) -> Self {
        self.source_root = root.join(&self.source_root);
        self.target_dir = root.join(&self.target_dir);
        self
    }

    /// Reject scheme ids that would escape the source root
    pub fn validate(&self) -> Result<(), CollectError> {
        for scheme in &self.schemes {
            if scheme.is_empty() {
                return Err(CollectError::Config("empty scheme identifier".to_string()));
            }
            if scheme.contains(['/', '\\']) || scheme == "." || scheme == ".." {
                return Err(CollectError::Config(format!(
                    "scheme identifier {:?} is not a plain name",
                    scheme
                )));
            }
        }
        Ok(())
    }

    /// Source tree of one scheme
    pub fn scheme_source_dir(&self, scheme: &str) -> PathBuf {
        self.source_root.join(scheme)
    }

    /// Index file written for `scheme` under the current mode
    pub fn index_path(&self, scheme: &str) -> PathBuf {
        self.target_dir.join(self.index_mode.index_file_name(scheme))
    }
}
