//! Packs index (`packs.json`)
//!
//! An ordered list of pack metadata objects. The objects are opaque: they are
//! written back exactly as parsed, key order included.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::CollectError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PacksIndex {
    packs: Vec<Value>,
}

impl PacksIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one `pack.json` file
    pub fn parse_pack_file(path: &Path) -> Result<Value, CollectError> {
        let contents = fs::read(path).map_err(|e| CollectError::io(path, e))?;

        serde_json::from_slice(&contents).map_err(|e| CollectError::MalformedPack {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load an index previously written by `write_to`
    pub fn read_from(path: &Path) -> Result<Self, CollectError> {
        let contents = fs::read(path).map_err(|e| CollectError::io(path, e))?;

        serde_json::from_slice(&contents).map_err(|e| {
            CollectError::Serialize(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn push(&mut self, pack: Value) {
        self.packs.push(pack);
    }

    /// Append all packs of `other`, keeping their order
    pub fn extend(&mut self, other: PacksIndex) {
        self.packs.extend(other.packs);
    }

    pub fn len(&self) -> usize {
        self.packs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }

    pub fn packs(&self) -> &[Value] {
        &self.packs
    }

    /// Compact JSON array; non-ASCII text is emitted as UTF-8, not `\u` escapes
    pub fn to_json_string(&self) -> Result<String, CollectError> {
        serde_json::to_string(&self.packs).map_err(|e| CollectError::Serialize(e.to_string()))
    }

    /// Write the index to `path`, replacing any previous contents
    pub fn write_to(&self, path: &Path) -> Result<(), CollectError> {
        let json = self.to_json_string()?;
        fs::write(path, json).map_err(|e| CollectError::io(path, e))
    }
}
