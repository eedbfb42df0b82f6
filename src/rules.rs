//! File matching rules
//!
//! Each discovered file is tested against an ordered list of
//! `{predicate -> action}` pairs; the first match decides what happens to it.

use std::path::Path;

/// Name of the per-pack metadata file
pub const PACK_METADATA_FILE: &str = "pack.json";

/// Marker for pack files; matched anywhere in the name, not just the suffix
pub const PACK_FILE_MARKER: &str = ".vlf";

/// Test applied to a file's base name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Base name is exactly this string
    FileNameEquals(String),
    /// Base name contains this substring
    FileNameContains(String),
}

impl Predicate {
    /// Check the predicate against the last component of `path`
    pub fn matches(&self, path: &Path) -> bool {
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => return false,
        };

        match self {
            Predicate::FileNameEquals(expected) => name == expected.as_str(),
            Predicate::FileNameContains(needle) => name.contains(needle.as_str()),
        }
    }
}

/// What to do with a matched file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Copy into the target dir keeping permissions and timestamps
    CopyPreservingMetadata,
    /// Copy the raw bytes into the target dir
    CopyBytes,
    /// Parse as JSON and append to the packs index
    CollectPackMetadata,
}

impl Action {
    /// Short label used in logs and dry-run output
    pub fn label(&self) -> &'static str {
        match self {
            Action::CopyPreservingMetadata => "copy+meta",
            Action::CopyBytes => "copy",
            Action::CollectPackMetadata => "index",
        }
    }

    /// Whether the action writes a file into the target dir
    pub fn copies(&self) -> bool {
        !matches!(self, Action::CollectPackMetadata)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub predicate: Predicate,
    pub action: Action,
}

impl Rule {
    pub fn new(predicate: Predicate, action: Action) -> Self {
        Self { predicate, action }
    }
}

/// Ordered rules for one scheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Build from an explicit rule list
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Rules for a scheme build tree:
    /// 1. `<scheme>.vst` -> copy with metadata
    /// 2. `pack.json` -> collect into the index
    /// 3. `*.vlf*` -> copy bytes
    pub fn for_scheme(scheme: &str) -> Self {
        Self::new(vec![
            Rule::new(
                Predicate::FileNameEquals(format!("{}.vst", scheme)),
                Action::CopyPreservingMetadata,
            ),
            Rule::new(
                Predicate::FileNameEquals(PACK_METADATA_FILE.to_string()),
                Action::CollectPackMetadata,
            ),
            Rule::new(
                Predicate::FileNameContains(PACK_FILE_MARKER.to_string()),
                Action::CopyBytes,
            ),
        ])
    }

    /// First rule whose predicate matches `path`
    pub fn first_match(&self, path: &Path) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.predicate.matches(path))
    }
}
