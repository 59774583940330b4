use crate::baseline_file::Baseline;
use crate::report::{IntegrityReport, compare};
use crate::store::{BaselineStore, StoreError};
use crate::tree::{Digests, TreeError};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("No baseline found at {} (create one with `fimcheck baseline`)", .0.display())]
    NotFound(PathBuf),
    #[error("Baseline root {} no longer exists", .0.display())]
    RootNotFound(PathBuf),
    #[error("Baseline is for {}, not {} (drop --fingerprint to replace it)", .baseline.display(), .requested.display())]
    RootMismatch {
        baseline: PathBuf,
        requested: PathBuf,
    },
    #[error("Fingerprint mismatch: expected {expected}, got {actual}")]
    FingerprintMismatch { expected: String, actual: String },
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuditError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(path) => AuditError::NotFound(path),
            e => AuditError::Store(e),
        }
    }
}

impl From<TreeError> for AuditError {
    fn from(e: TreeError) -> Self {
        AuditError::Store(StoreError::Tree(e))
    }
}

#[derive(Debug, Default)]
pub struct BaselineOptions {
    /// Only replace the stored baseline if the changes since it match this
    /// fingerprint (as printed by `check`).
    pub fingerprint: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct BuildResult {
    pub baseline: Baseline,
    /// False for dry runs.
    pub written: bool,
}

#[derive(Debug)]
pub struct CheckOutcome {
    pub baseline: Baseline,
    pub snapshot: Digests,
    pub report: IntegrityReport,
}

/// Create or replace the stored baseline with the current state of `dir`.
///
/// # Behavior
///
/// **Fingerprint validation:**
/// - If `options.fingerprint` is provided, the changes between the stored
///   baseline and the tree as just scanned must have that fingerprint
/// - Fails with `FingerprintMismatch` if they don't, so files changing
///   between `check` and `baseline` are never accepted unseen
/// - Requires an existing baseline for the same root
/// - **Nothing is written if the fingerprint doesn't match**
///
/// **Dry run:**
/// - If `options.dry_run`, builds the baseline but writes nothing
pub fn build_baseline(
    store: &BaselineStore,
    dir: &Path,
    options: BaselineOptions,
) -> Result<BuildResult, AuditError> {
    let baseline = store.build(dir)?;

    if let Some(expected) = options.fingerprint {
        let previous = store.load()?;
        if previous.base_dir != baseline.base_dir {
            return Err(AuditError::RootMismatch {
                baseline: previous.base_dir,
                requested: baseline.base_dir,
            });
        }

        let report = compare(baseline.base_dir.clone(), &previous.files, &baseline.files);
        let actual = report.fingerprint();
        if actual != expected {
            return Err(AuditError::FingerprintMismatch { expected, actual });
        }
    }

    if options.dry_run {
        return Ok(BuildResult {
            baseline,
            written: false,
        });
    }

    store.persist(&baseline)?;

    Ok(BuildResult {
        baseline,
        written: true,
    })
}

/// Compare the stored baseline against the current state of its tree.
///
/// The tree checked is the root recorded in the baseline unless `dir` names
/// another one (a moved or copied tree, say). Paths are relative, so the
/// comparison holds across such moves.
pub fn check_integrity(
    store: &BaselineStore,
    dir: Option<&Path>,
) -> Result<CheckOutcome, AuditError> {
    let baseline = store.load()?;
    match baseline.created_at {
        Some(created_at) => info!(
            "Loaded version {} baseline for {}, created {}",
            baseline.version(),
            baseline.base_dir.display(),
            created_at.to_rfc3339()
        ),
        None => info!(
            "Loaded version {} baseline for {}",
            baseline.version(),
            baseline.base_dir.display()
        ),
    }

    let target = dir.unwrap_or(baseline.base_dir.as_path());
    let (root, snapshot) = store
        .scan_relocated(target, &baseline.base_dir)
        .map_err(|e| match e {
            TreeError::RootNotFound(_) | TreeError::NotADirectory(_) => {
                AuditError::RootNotFound(target.to_path_buf())
            }
            e => AuditError::from(e),
        })?;

    if root != baseline.base_dir {
        warn!(
            "Checking {} against the baseline recorded for {}",
            root.display(),
            baseline.base_dir.display()
        );
    }

    let report = compare(root, &baseline.files, &snapshot);
    info!(
        "{} modified, {} added, {} removed, {} unchanged",
        report.modified.len(),
        report.added.len(),
        report.removed.len(),
        report.unchanged
    );

    Ok(CheckOutcome {
        baseline,
        snapshot,
        report,
    })
}
