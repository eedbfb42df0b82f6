//! Error types for asset collection

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Asset collection error types
///
/// Every variant that refers to the filesystem carries the offending path so
/// a failed run can be traced back to a single file.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectError {
    /// Target assets directory does not exist
    TargetMissing(PathBuf),
    /// Walking the scheme source tree failed
    Walk { path: PathBuf, message: String },
    /// I/O error on a specific file
    Io {
        path: PathBuf,
        kind: io::ErrorKind,
        message: String,
    },
    /// A pack.json file is not valid JSON
    MalformedPack { path: PathBuf, message: String },
    /// Configuration could not be loaded or is invalid
    Config(String),
    /// Index serialization error
    Serialize(String),
}

impl CollectError {
    /// Wrap an I/O error together with the path it happened on
    pub fn io(path: &Path, e: io::Error) -> Self {
        CollectError::Io {
            path: path.to_path_buf(),
            kind: e.kind(),
            message: e.to_string(),
        }
    }

    /// Path the error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            CollectError::TargetMissing(path) => Some(path),
            CollectError::Walk { path, .. }
            | CollectError::Io { path, .. }
            | CollectError::MalformedPack { path, .. } => Some(path),
            CollectError::Config(_) | CollectError::Serialize(_) => None,
        }
    }
}

impl fmt::Display for CollectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectError::TargetMissing(path) => {
                write!(f, "target directory does not exist: {}", path.display())
            }
            CollectError::Walk { path, message } => {
                write!(f, "failed to walk {}: {}", path.display(), message)
            }
            CollectError::Io { path, message, .. } => {
                write!(f, "I/O error on {}: {}", path.display(), message)
            }
            CollectError::MalformedPack { path, message } => {
                write!(f, "malformed pack metadata {}: {}", path.display(), message)
            }
            CollectError::Config(msg) => write!(f, "invalid configuration: {}", msg),
            CollectError::Serialize(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {}

impl From<walkdir::Error> for CollectError {
    fn from(e: walkdir::Error) -> Self {
        CollectError::Walk {
            path: e.path().map(Path::to_path_buf).unwrap_or_default(),
            message: e.to_string(),
        }
    }
}
