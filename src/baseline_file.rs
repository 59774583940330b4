use crate::tree::{Digests, is_normalized_key};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum BaselineFileError {
    #[error("Baseline file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid baseline: {0}")]
    Invalid(String),
    #[error("Unsupported baseline version: {0}")]
    UnsupportedVersion(u32),
}

impl BaselineFileError {
    /// Whether the file exists but does not hold a baseline we understand.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            BaselineFileError::Json(_)
                | BaselineFileError::Invalid(_)
                | BaselineFileError::UnsupportedVersion(_)
        )
    }

    fn from_io(path: &Path, e: std::io::Error) -> Self {
        match e.kind() {
            ErrorKind::PermissionDenied => BaselineFileError::PermissionDenied(path.to_path_buf()),
            _ => BaselineFileError::Io(e),
        }
    }
}

/// Extracts only the version from a baseline document, ignoring all other
/// content. Used to check the version before parsing the full file.
/// Deliberately lenient about unknown fields.
#[derive(Debug, Deserialize)]
struct VersionOnly {
    #[serde(default = "Baseline::legacy_version")]
    version: u32,
}

/// The persisted reference state of a directory tree.
///
/// Files written before the `version` and `created_at` fields existed only
/// carry `base_dir` and `files`; they load as version 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Baseline {
    /// Absolute, resolved path of the tree root when the baseline was built.
    pub base_dir: PathBuf,
    pub files: Digests,
    #[serde(default = "Baseline::legacy_version")]
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Baseline {
    const SUPPORTED_VERSION: u32 = 1;

    fn legacy_version() -> u32 {
        1
    }

    /// Create a new Baseline stamped with the current time.
    pub fn new(base_dir: PathBuf, files: Digests) -> Self {
        Baseline {
            base_dir,
            files,
            version: Self::SUPPORTED_VERSION,
            created_at: Some(Utc::now()),
        }
    }

    /// Parse a JSON document into a Baseline and validate it.
    pub fn from_json(content: &str) -> Result<Self, BaselineFileError> {
        // Check the version on its own first, so a file from a future
        // version is reported as such instead of as whatever parse error its
        // unknown contents would trigger.
        let version_only: VersionOnly = serde_json::from_str(content)?;

        if version_only.version != Self::SUPPORTED_VERSION {
            return Err(BaselineFileError::UnsupportedVersion(version_only.version));
        }

        let baseline: Baseline = serde_json::from_str(content)?;
        baseline.validate()?;
        Ok(baseline)
    }

    /// Serialize to pretty printed JSON. Keys come out sorted.
    pub fn to_json(&self) -> Result<String, BaselineFileError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        out.push(b'\n');

        String::from_utf8(out).map_err(|e| BaselineFileError::Invalid(e.to_string()))
    }

    /// Load a Baseline from the filesystem.
    pub fn load(path: &Path) -> Result<Self, BaselineFileError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                BaselineFileError::NotFound(path.to_path_buf())
            } else {
                BaselineFileError::from_io(path, e)
            }
        })?;

        Self::from_json(&content)
    }

    /// Save a Baseline to the filesystem atomically.
    ///
    /// Writes to a temporary file next to `path`, fsyncs it, then renames it
    /// into place, so readers see either the old or the new baseline in full.
    pub fn save(&self, path: &Path) -> Result<(), BaselineFileError> {
        use std::io::Write;

        let content = self.to_json()?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp_file = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| BaselineFileError::from_io(parent, e))?;

        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| BaselineFileError::from_io(path, e))?;

        temp_file
            .as_file()
            .sync_all()
            .map_err(BaselineFileError::Io)?;

        temp_file
            .persist(path)
            .map_err(|e| BaselineFileError::from_io(path, e.error))?;

        Ok(())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    fn validate(&self) -> Result<(), BaselineFileError> {
        if !self.base_dir.is_absolute() {
            return Err(BaselineFileError::Invalid(format!(
                "base_dir is not an absolute path: {}",
                self.base_dir.display()
            )));
        }

        for (key, sha256) in &self.files {
            if !is_normalized_key(key) {
                return Err(BaselineFileError::Invalid(format!(
                    "invalid file path {:?}",
                    key
                )));
            }
            if !is_sha256_hex(sha256) {
                return Err(BaselineFileError::Invalid(format!(
                    "invalid sha256 for {}: {:?}",
                    key, sha256
                )));
            }
        }

        Ok(())
    }
}

fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
