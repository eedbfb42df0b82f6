//! Assets directory inventory
//!
//! The app imports every `.vlf` in the assets dir whose name starts with the
//! scheme identifier. This lists exactly those files so a packaging run can be
//! checked before bundling.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::CollectorConfig;
use crate::error::CollectError;
use crate::index::PacksIndex;

/// What the assets dir currently holds for one scheme
#[derive(Debug, Clone, PartialEq)]
pub struct SchemeInventory {
    pub scheme: String,
    /// `<scheme>.vst` is present
    pub has_vst: bool,
    /// Pack files the app would import, sorted by name
    pub vlf_files: Vec<PathBuf>,
    /// Entries in the scheme's index file, `None` if it does not exist
    pub index_entries: Option<usize>,
}

/// Pack files in `assets_dir` belonging to `scheme`
///
/// Only the top level is scanned: the assets dir is flat.
pub fn scheme_vlf_files(assets_dir: &Path, scheme: &str) -> Result<Vec<PathBuf>, CollectError> {
    let entries = fs::read_dir(assets_dir).map_err(|e| CollectError::io(assets_dir, e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(dir = %assets_dir.display(), error = %e, "skipping unreadable assets entry");
                None
            }
        })
        .filter(|e| e.path().is_file())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.starts_with(scheme) && name.ends_with(".vlf")
        })
        .map(|e| e.path())
        .collect();

    files.sort();
    Ok(files)
}

/// Inventory one scheme against the configured target dir
pub fn inventory(config: &CollectorConfig, scheme: &str) -> Result<SchemeInventory, CollectError> {
    if !config.target_dir.is_dir() {
        return Err(CollectError::TargetMissing(config.target_dir.clone()));
    }

    let index_path = config.index_path(scheme);
    let index_entries = if index_path.is_file() {
        Some(PacksIndex::read_from(&index_path)?.len())
    } else {
        None
    };

    Ok(SchemeInventory {
        scheme: scheme.to_string(),
        has_vst: config.target_dir.join(format!("{}.vst", scheme)).is_file(),
        vlf_files: scheme_vlf_files(&config.target_dir, scheme)?,
        index_entries,
    })
}
