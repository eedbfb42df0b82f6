//! Asset collector
//!
//! Walks `<source_root>/<scheme>/`, applies the scheme's [`RuleSet`] to every
//! file found and writes the packs index. Everything is synchronous and runs
//! scheme by scheme in configuration order.
//!
//! A failure aborts the run immediately. Files already copied stay in the
//! target directory.

use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{CollectorConfig, IndexMode, PACKS_INDEX_FILE};
use crate::error::CollectError;
use crate::index::PacksIndex;
use crate::rules::{Action, RuleSet};

/// Counts for one scheme
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemeReport {
    pub scheme: String,
    /// `<scheme>.vst` files copied
    pub vst_copied: usize,
    /// `.vlf` files copied
    pub vlf_copied: usize,
    /// `pack.json` files collected into the index
    pub packs_collected: usize,
    /// Index file written for this scheme, if one was written yet
    pub index_path: Option<PathBuf>,
}

/// Result of [`AssetCollector::run`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub schemes: Vec<SchemeReport>,
    /// Index files written, in write order (repeats in overwrite mode)
    pub index_writes: Vec<PathBuf>,
}

impl RunReport {
    pub fn files_copied(&self) -> usize {
        self.schemes.iter().map(|s| s.vst_copied + s.vlf_copied).sum()
    }

    pub fn packs_collected(&self) -> usize {
        self.schemes.iter().map(|s| s.packs_collected).sum()
    }
}

/// Packs and counts gathered for one scheme before the index is written
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemeCollection {
    pub packs: PacksIndex,
    pub report: SchemeReport,
}

/// One line of a dry run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub source: PathBuf,
    pub action: Action,
    /// Where a copy would land; `None` for index entries
    pub destination: Option<PathBuf>,
}

/// Copies scheme build artifacts into the assets directory
#[derive(Debug, Clone)]
pub struct AssetCollector {
    config: CollectorConfig,
}

impl AssetCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Collect every configured scheme and write the index per the index mode
    pub fn run(&self) -> Result<RunReport, CollectError> {
        self.ensure_target()?;

        let mut report = RunReport::default();
        let mut combined = PacksIndex::new();

        for scheme in &self.config.schemes {
            match self.config.index_mode {
                IndexMode::Combined => {
                    let collection = self.collect_scheme(scheme)?;
                    combined.extend(collection.packs);
                    report.schemes.push(collection.report);
                }
                IndexMode::Overwrite | IndexMode::PerScheme => {
                    let scheme_report = self.run_scheme(scheme)?;
                    report.index_writes.extend(scheme_report.index_path.clone());
                    report.schemes.push(scheme_report);
                }
            }
        }

        if self.config.index_mode == IndexMode::Combined {
            let path = self.config.target_dir.join(PACKS_INDEX_FILE);
            self.write_index(&combined, &path)?;
            for scheme_report in &mut report.schemes {
                scheme_report.index_path = Some(path.clone());
            }
            report.index_writes.push(path);
        }

        info!(
            schemes = report.schemes.len(),
            files = report.files_copied(),
            packs = report.packs_collected(),
            "asset collection finished"
        );
        Ok(report)
    }

    /// Collect one scheme and write its index file
    ///
    /// In combined mode this writes `packs.json` with this scheme's packs
    /// only; use [`run`](Self::run) to merge all schemes.
    pub fn run_scheme(&self, scheme: &str) -> Result<SchemeReport, CollectError> {
        self.ensure_target()?;

        let SchemeCollection { packs, mut report } = self.collect_scheme(scheme)?;
        let path = self.config.index_path(scheme);
        self.write_index(&packs, &path)?;
        report.index_path = Some(path);

        Ok(report)
    }

    /// Copy one scheme's artifacts and gather its packs, without writing an index
    pub fn collect_scheme(&self, scheme: &str) -> Result<SchemeCollection, CollectError> {
        self.ensure_target()?;

        info!(scheme, "collecting scheme assets");

        let rules = RuleSet::for_scheme(scheme);
        let mut collection = SchemeCollection {
            packs: PacksIndex::new(),
            report: SchemeReport {
                scheme: scheme.to_string(),
                ..SchemeReport::default()
            },
        };

        for path in self.discover(scheme)? {
            let Some(rule) = rules.first_match(&path) else {
                continue;
            };

            match rule.action {
                Action::CopyPreservingMetadata => {
                    let dest = copy_preserving_metadata(&path, &self.config.target_dir)?;
                    debug!(from = %path.display(), to = %dest.display(), "copied symbol table");
                    collection.report.vst_copied += 1;
                }
                Action::CopyBytes => {
                    let dest = copy_bytes(&path, &self.config.target_dir)?;
                    debug!(from = %path.display(), to = %dest.display(), "copied pack file");
                    collection.report.vlf_copied += 1;
                }
                Action::CollectPackMetadata => {
                    collection.packs.push(PacksIndex::parse_pack_file(&path)?);
                    debug!(path = %path.display(), "collected pack metadata");
                    collection.report.packs_collected += 1;
                }
            }
        }

        info!(
            scheme,
            vst = collection.report.vst_copied,
            vlf = collection.report.vlf_copied,
            packs = collection.report.packs_collected,
            "scheme collected"
        );
        Ok(collection)
    }

    /// Dry run: which rule each discovered file would trigger
    pub fn plan(&self, scheme: &str) -> Result<Vec<PlannedAction>, CollectError> {
        let rules = RuleSet::for_scheme(scheme);

        Ok(self
            .discover(scheme)?
            .into_iter()
            .filter_map(|path| {
                let action = rules.first_match(&path)?.action;
                let destination = if action.copies() {
                    destination_for(&path, &self.config.target_dir)
                } else {
                    None
                };
                Some(PlannedAction {
                    source: path,
                    action,
                    destination,
                })
            })
            .collect())
    }

    /// All files below the scheme's source dir, sorted by name at each level
    ///
    /// A missing source dir is not an error: the scheme simply has nothing to
    /// contribute and an empty index is written.
    fn discover(&self, scheme: &str) -> Result<Vec<PathBuf>, CollectError> {
        let source = self.config.scheme_source_dir(scheme);
        if !source.is_dir() {
            warn!(scheme, source = %source.display(), "scheme source directory not found");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&source)
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if entry.file_type().is_dir() {
                continue;
            }
            // Symlinks are not followed into directories but linked files count
            if entry.path().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn ensure_target(&self) -> Result<(), CollectError> {
        if self.config.target_dir.is_dir() {
            Ok(())
        } else {
            Err(CollectError::TargetMissing(self.config.target_dir.clone()))
        }
    }

    fn write_index(&self, index: &PacksIndex, path: &Path) -> Result<(), CollectError> {
        index.write_to(path)?;
        info!(
            path = %path.display(),
            packs = index.len(),
            mode = self.config.index_mode.label(),
            "wrote packs index"
        );
        Ok(())
    }
}

/// `target_dir/<base name of src>`
fn destination_for(src: &Path, target_dir: &Path) -> Option<PathBuf> {
    src.file_name().map(|name| target_dir.join(name))
}

fn destination_or_err(src: &Path, target_dir: &Path) -> Result<PathBuf, CollectError> {
    destination_for(src, target_dir).ok_or_else(|| {
        CollectError::io(
            src,
            io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })
}

/// Copy a file keeping its permissions and access/modification times
fn copy_preserving_metadata(src: &Path, target_dir: &Path) -> Result<PathBuf, CollectError> {
    let dest = destination_or_err(src, target_dir)?;

    // A read-only copy from a previous run cannot be opened for writing
    if let Ok(existing) = fs::metadata(&dest) {
        if existing.is_file() && existing.permissions().readonly() {
            fs::remove_file(&dest).map_err(|e| CollectError::io(&dest, e))?;
        }
    }

    // fs::copy carries the permission bits over
    fs::copy(src, &dest).map_err(|e| CollectError::io(src, e))?;

    let metadata = fs::metadata(src).map_err(|e| CollectError::io(src, e))?;
    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }

    // Setting explicit times needs ownership, not write access, so a
    // read-only handle works for 0444 copies
    let file = File::open(&dest).map_err(|e| CollectError::io(&dest, e))?;
    file.set_times(times).map_err(|e| CollectError::io(&dest, e))?;

    Ok(dest)
}

/// Copy only the contents of a file
fn copy_bytes(src: &Path, target_dir: &Path) -> Result<PathBuf, CollectError> {
    let dest = destination_or_err(src, target_dir)?;

    let mut reader = File::open(src).map_err(|e| CollectError::io(src, e))?;
    let mut writer = File::create(&dest).map_err(|e| CollectError::io(&dest, e))?;
    io::copy(&mut reader, &mut writer).map_err(|e| CollectError::io(&dest, e))?;

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    /// Project root with an empty assets dir and a source tree for `ml`
    fn setup_project() -> (TempDir, CollectorConfig) {
        let dir = TempDir::new().unwrap();
        let config = CollectorConfig {
            schemes: vec!["ml".to_string()],
            ..CollectorConfig::with_root(dir.path())
        };
        fs::create_dir_all(&config.target_dir).unwrap();
        fs::create_dir_all(config.scheme_source_dir("ml")).unwrap();
        (dir, config)
    }

    fn write(path: &Path, contents: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_single_pack_json() {
        let (_dir, config) = setup_project();
        write(
            &config.scheme_source_dir("ml").join("basic/pack.json"),
            br#"{"id":"x"}"#,
        );

        let report = AssetCollector::new(config.clone()).run_scheme("ml").unwrap();
        assert_eq!(report.packs_collected, 1);

        let written = fs::read_to_string(config.target_dir.join("packs.json")).unwrap();
        assert_eq!(written, r#"[{"id":"x"}]"#);
    }

    #[test]
    fn test_deep_pack_json_counted_once() {
        let (_dir, config) = setup_project();
        let source = config.scheme_source_dir("ml");
        write(&source.join("a/b/c/pack.json"), br#"{"id":"deep"}"#);
        write(&source.join("pack.json"), br#"{"id":"top"}"#);

        let collection = AssetCollector::new(config).collect_scheme("ml").unwrap();
        // "a" sorts before "pack.json"
        assert_eq!(collection.packs.packs(), &[json!({"id":"deep"}), json!({"id":"top"})]);
    }

    #[test]
    fn test_no_packs_writes_empty_array() {
        let (_dir, config) = setup_project();
        write(&config.scheme_source_dir("ml").join("ml.vst"), b"vst");

        AssetCollector::new(config.clone()).run_scheme("ml").unwrap();
        let written = fs::read_to_string(config.target_dir.join("packs.json")).unwrap();
        assert_eq!(written, "[]");
    }

    #[test]
    fn test_vst_copied_with_contents_and_mtime() {
        let (_dir, config) = setup_project();
        let vst = config.scheme_source_dir("ml").join("ml.vst");
        write(&vst, &[0u8, 1, 2, 255, 254]);
        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        File::options()
            .write(true)
            .open(&vst)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let report = AssetCollector::new(config.clone()).run_scheme("ml").unwrap();
        assert_eq!(report.vst_copied, 1);

        let copied = config.target_dir.join("ml.vst");
        assert_eq!(fs::read(&copied).unwrap(), vec![0u8, 1, 2, 255, 254]);
        assert_eq!(fs::metadata(&copied).unwrap().modified().unwrap(), old);
    }

    #[test]
    fn test_other_scheme_vst_ignored() {
        let (_dir, config) = setup_project();
        write(&config.scheme_source_dir("ml").join("kn.vst"), b"kn");

        let report = AssetCollector::new(config.clone()).run_scheme("ml").unwrap();
        assert_eq!(report.vst_copied, 0);
        assert!(!config.target_dir.join("kn.vst").exists());
    }

    #[test]
    fn test_nested_vlf_flattened() {
        let (_dir, config) = setup_project();
        let source = config.scheme_source_dir("ml");
        write(&source.join("packs/basic/v1/ml-basic-1.vlf"), b"vlf-1");
        write(&source.join("ml-top.vlf"), b"vlf-top");

        let report = AssetCollector::new(config.clone()).run_scheme("ml").unwrap();
        assert_eq!(report.vlf_copied, 2);
        assert_eq!(fs::read(config.target_dir.join("ml-basic-1.vlf")).unwrap(), b"vlf-1");
        assert_eq!(fs::read(config.target_dir.join("ml-top.vlf")).unwrap(), b"vlf-top");
        assert!(!config.target_dir.join("packs").exists());
    }

    #[test]
    fn test_missing_source_is_empty() {
        let (_dir, config) = setup_project();
        fs::remove_dir_all(config.scheme_source_dir("ml")).unwrap();

        let report = AssetCollector::new(config.clone()).run_scheme("ml").unwrap();
        assert_eq!(report, SchemeReport {
            scheme: "ml".to_string(),
            index_path: Some(config.target_dir.join("packs.json")),
            ..SchemeReport::default()
        });
        assert_eq!(fs::read_to_string(config.target_dir.join("packs.json")).unwrap(), "[]");
    }

    #[test]
    fn test_missing_target_is_error() {
        let (_dir, config) = setup_project();
        fs::remove_dir_all(&config.target_dir).unwrap();

        let err = AssetCollector::new(config.clone()).run_scheme("ml").unwrap_err();
        assert_eq!(err, CollectError::TargetMissing(config.target_dir.clone()));
    }

    #[test]
    fn test_malformed_pack_aborts() {
        let (_dir, config) = setup_project();
        let source = config.scheme_source_dir("ml");
        write(&source.join("a/ml-a.vlf"), b"a");
        write(&source.join("b/pack.json"), b"{\"id\":");
        write(&source.join("c/ml-c.vlf"), b"c");

        let err = AssetCollector::new(config.clone()).run_scheme("ml").unwrap_err();
        assert!(matches!(err, CollectError::MalformedPack { .. }));

        // No rollback: what was copied before the failure stays
        assert!(config.target_dir.join("ml-a.vlf").exists());
        assert!(!config.target_dir.join("ml-c.vlf").exists());
        assert!(!config.target_dir.join("packs.json").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_vst_copied_with_mode_and_mtime() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, config) = setup_project();
        let vst = config.scheme_source_dir("ml").join("ml.vst");
        write(&vst, b"read-only vst");
        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(2_000_000);
        File::options()
            .write(true)
            .open(&vst)
            .unwrap()
            .set_modified(old)
            .unwrap();
        fs::set_permissions(&vst, fs::Permissions::from_mode(0o444)).unwrap();

        let collector = AssetCollector::new(config.clone());
        let report = collector.run_scheme("ml").unwrap();
        assert_eq!(report.vst_copied, 1);

        let copied = config.target_dir.join("ml.vst");
        let metadata = fs::metadata(&copied).unwrap();
        assert_eq!(fs::read(&copied).unwrap(), b"read-only vst");
        assert_eq!(metadata.permissions().mode() & 0o777, 0o444);
        assert_eq!(metadata.modified().unwrap(), old);

        // Second run replaces the read-only copy instead of failing
        collector.run_scheme("ml").unwrap();
        assert_eq!(fs::read(&copied).unwrap(), b"read-only vst");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_walk_error() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, config) = setup_project();
        let locked = config.scheme_source_dir("ml").join("locked");
        write(&locked.join("ml-locked.vlf"), b"vlf");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop root; nothing to check then
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = AssetCollector::new(config.clone()).run_scheme("ml");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        match result {
            Err(CollectError::Walk { path, .. }) => assert_eq!(path, locked),
            other => panic!("expected walk error, got {:?}", other),
        }
        assert!(!config.target_dir.join("packs.json").exists());
    }

    #[test]
    fn test_plan_has_no_side_effects() {
        let (_dir, config) = setup_project();
        let source = config.scheme_source_dir("ml");
        write(&source.join("ml.vst"), b"vst");
        write(&source.join("basic/pack.json"), b"{}");
        write(&source.join("basic/ml-basic.vlf"), b"vlf");
        write(&source.join("basic/README"), b"docs");

        let plan = AssetCollector::new(config.clone()).plan("ml").unwrap();
        let actions: Vec<_> = plan.iter().map(|p| p.action).collect();
        assert_eq!(
            actions,
            vec![Action::CopyBytes, Action::CollectPackMetadata, Action::CopyPreservingMetadata]
        );
        assert_eq!(plan[0].destination, Some(config.target_dir.join("ml-basic.vlf")));
        assert_eq!(plan[1].destination, None);

        assert_eq!(fs::read_dir(&config.target_dir).unwrap().count(), 0);
    }
}
