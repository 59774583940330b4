use crate::baseline_file::{Baseline, BaselineFileError};
use crate::tree::{self, Digests, DiskTree, TreeError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_BASELINE_FILENAME: &str = "baseline.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No baseline found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("Corrupt baseline {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: BaselineFileError,
    },
    #[error("Baseline file error: {0}")]
    BaselineFile(BaselineFileError),
    #[error("Scan error: {0}")]
    Tree(#[from] TreeError),
}

impl StoreError {
    fn from_file(path: &Path, e: BaselineFileError) -> Self {
        match e {
            BaselineFileError::NotFound(_) => StoreError::NotFound(path.to_path_buf()),
            e if e.is_corrupt() => StoreError::Corrupt {
                path: path.to_path_buf(),
                source: e,
            },
            e => StoreError::BaselineFile(e),
        }
    }
}

/// Builds, persists and loads the baseline kept at one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineStore {
    path: PathBuf,
}

impl Default for BaselineStore {
    fn default() -> Self {
        BaselineStore::new(DEFAULT_BASELINE_FILENAME)
    }
}

impl BaselineStore {
    /// A store keeping its baseline at `path`, relative paths being relative
    /// to the working directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        BaselineStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the baseline file is (or would be) with its directory resolved,
    /// in the form the tree walk produces paths. `None` if the directory
    /// does not exist, in which case it cannot be inside any tree either.
    fn resolved_path(&self) -> Option<PathBuf> {
        let file_name = self.path.file_name()?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let parent = parent.canonicalize().ok()?;
        Some(parent.join(file_name))
    }

    /// Hashes every regular file below `dir`.
    ///
    /// Returns the resolved root alongside the digests. The store's own
    /// baseline file is left out when it lies inside the tree, so that saving
    /// a baseline never shows up as a change to the tree.
    pub fn scan(&self, dir: &Path) -> Result<(PathBuf, Digests), TreeError> {
        let disk_tree = self.open_tree(dir)?;
        let digests = tree::scan(&disk_tree)?;

        Ok((disk_tree.root().to_path_buf(), digests))
    }

    /// Like [`scan`](Self::scan), for a tree that may be a moved or copied
    /// version of the one at `recorded_root`.
    ///
    /// If the baseline file lives inside `recorded_root`, whatever sits at
    /// the same relative location below `dir` is left out as well, so a copy
    /// carrying the baseline along does not report it as added.
    pub fn scan_relocated(
        &self,
        dir: &Path,
        recorded_root: &Path,
    ) -> Result<(PathBuf, Digests), TreeError> {
        let mut disk_tree = self.open_tree(dir)?;

        if let Some(own_path) = self.resolved_path()
            && let Ok(relative) = own_path.strip_prefix(recorded_root)
        {
            let copy = disk_tree.root().join(relative);
            debug!("Excluding {} from scans", copy.display());
            disk_tree = disk_tree.with_excluded(copy);
        }

        let digests = tree::scan(&disk_tree)?;

        Ok((disk_tree.root().to_path_buf(), digests))
    }

    fn open_tree(&self, dir: &Path) -> Result<DiskTree, TreeError> {
        let mut disk_tree = DiskTree::open(dir)?;
        if let Some(own_path) = self.resolved_path() {
            debug!("Excluding {} from scans", own_path.display());
            disk_tree = disk_tree.with_excluded(own_path);
        }
        Ok(disk_tree)
    }

    /// Builds a fresh baseline for `dir`. Nothing is written.
    pub fn build(&self, dir: &Path) -> Result<Baseline, StoreError> {
        let (root, digests) = self.scan(dir)?;
        debug!("Built baseline of {} files for {}", digests.len(), root.display());
        Ok(Baseline::new(root, digests))
    }

    /// Replaces whatever baseline is stored with `baseline`.
    ///
    /// Failures here are never reported as a corrupt baseline: nothing was
    /// read.
    pub fn persist(&self, baseline: &Baseline) -> Result<(), StoreError> {
        baseline.save(&self.path).map_err(StoreError::BaselineFile)?;
        info!("Baseline saved to {}", self.path.display());
        Ok(())
    }

    /// Loads the stored baseline.
    ///
    /// `StoreError::NotFound` means no baseline was ever persisted here;
    /// `StoreError::Corrupt` means the file is there but unusable.
    pub fn load(&self) -> Result<Baseline, StoreError> {
        let baseline =
            Baseline::load(&self.path).map_err(|e| StoreError::from_file(&self.path, e))?;
        debug!(
            "Loaded baseline of {} files for {}",
            baseline.files.len(),
            baseline.base_dir.display()
        );
        Ok(baseline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::sha256_of;
    use std::fs;
    use tempfile::TempDir;

    fn store_in(dir: &Path) -> BaselineStore {
        BaselineStore::new(dir.join(DEFAULT_BASELINE_FILENAME))
    }

    #[test]
    fn test_default_location() {
        assert_eq!(BaselineStore::default().path(), Path::new("baseline.json"));
    }

    #[test]
    fn test_build_two_files() {
        let monitored = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        fs::write(monitored.path().join("a.txt"), "hello").unwrap();
        fs::write(monitored.path().join("b.txt"), "world").unwrap();

        let baseline = store_in(state.path()).build(monitored.path()).unwrap();

        assert_eq!(baseline.base_dir, monitored.path().canonicalize().unwrap());
        assert_eq!(baseline.files.len(), 2);
        assert_eq!(baseline.files["a.txt"], sha256_of("hello"));
        assert_eq!(baseline.files["b.txt"], sha256_of("world"));
    }

    #[test]
    fn test_build_does_not_write() {
        let monitored = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let store = store_in(state.path());

        store.build(monitored.path()).unwrap();

        assert!(!store.path().exists());
    }

    #[test]
    fn test_persist_then_load() {
        let monitored = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        fs::create_dir(monitored.path().join("sub")).unwrap();
        fs::write(monitored.path().join("sub/c.txt"), "nested").unwrap();
        let store = store_in(state.path());

        let baseline = store.build(monitored.path()).unwrap();
        store.persist(&baseline).unwrap();

        assert_eq!(store.load().unwrap(), baseline);
    }

    #[test]
    fn test_persist_overwrites_previous_baseline() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        fs::write(first.path().join("one.txt"), "1").unwrap();
        fs::write(second.path().join("two.txt"), "2").unwrap();
        let store = store_in(state.path());

        store.persist(&store.build(first.path()).unwrap()).unwrap();
        let replacement = store.build(second.path()).unwrap();
        store.persist(&replacement).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, replacement);
        assert!(!loaded.files.contains_key("one.txt"));
    }

    #[test]
    fn test_baseline_inside_tree_is_not_scanned() {
        let monitored = TempDir::new().unwrap();
        fs::write(monitored.path().join("data.txt"), "data").unwrap();
        let store = store_in(monitored.path());

        store.persist(&store.build(monitored.path()).unwrap()).unwrap();
        let rebuilt = store.build(monitored.path()).unwrap();

        assert!(store.path().exists());
        let keys: Vec<&str> = rebuilt.files.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["data.txt"]);
    }

    #[test]
    fn test_copied_tree_does_not_report_baseline_as_added() {
        let monitored = TempDir::new().unwrap();
        let copies = TempDir::new().unwrap();
        fs::write(monitored.path().join("data.txt"), "data").unwrap();
        let store = store_in(monitored.path());
        let baseline = store.build(monitored.path()).unwrap();
        store.persist(&baseline).unwrap();

        let copy = copies.path().join("copy");
        fs::create_dir(&copy).unwrap();
        fs::copy(monitored.path().join("data.txt"), copy.join("data.txt")).unwrap();
        fs::copy(store.path(), copy.join(DEFAULT_BASELINE_FILENAME)).unwrap();

        let (root, digests) = store.scan_relocated(&copy, &baseline.base_dir).unwrap();

        assert_eq!(root, copy.canonicalize().unwrap());
        assert_eq!(digests, baseline.files);
    }

    #[test]
    fn test_relocated_scan_with_baseline_outside_tree() {
        let monitored = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        fs::write(monitored.path().join("baseline.json"), "tracked").unwrap();
        let store = store_in(state.path());
        let recorded = monitored.path().canonicalize().unwrap();

        let (_, digests) = store.scan_relocated(monitored.path(), &recorded).unwrap();

        assert!(digests.contains_key("baseline.json"));
    }

    #[test]
    #[cfg(unix)]
    fn test_persist_failure_is_not_corruption() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let state = TempDir::new().unwrap();
        let store = store_in(state.path());
        let baseline = Baseline::new(
            PathBuf::from(OsStr::from_bytes(b"/bad\xffdir")),
            Digests::new(),
        );

        match store.persist(&baseline) {
            Err(StoreError::BaselineFile(BaselineFileError::Json(_))) => {}
            other => panic!("Expected BaselineFile error, got {:?}", other),
        }
        assert!(!store.path().exists());
    }

    #[test]
    fn test_load_without_baseline() {
        let state = TempDir::new().unwrap();
        let store = store_in(state.path());

        match store.load() {
            Err(StoreError::NotFound(path)) => assert_eq!(path, store.path()),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_load_corrupt_baseline() {
        let state = TempDir::new().unwrap();
        let store = store_in(state.path());
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_load_baseline_missing_fields() {
        let state = TempDir::new().unwrap();
        let store = store_in(state.path());
        fs::write(store.path(), r#"{"files": {}}"#).unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_build_missing_directory() {
        let state = TempDir::new().unwrap();
        let missing = state.path().join("missing");

        let result = store_in(state.path()).build(&missing);

        assert!(matches!(
            result,
            Err(StoreError::Tree(TreeError::RootNotFound(_)))
        ));
    }
}
