//! Enumeration and hashing of the regular files below a root directory.
//!
//! A [`FileTree`] yields the files of a tree as relative keys: the path of
//! each file below the root, with `/` as separator regardless of platform so
//! that baselines stay comparable across operating systems. [`DiskTree`]
//! walks the real filesystem; anything else implementing the trait (an
//! in-memory tree in tests, for example) can be scanned the same way.
//!
//! Symlink policy of [`DiskTree`]:
//! - a symlink to a regular file is followed and hashed by the target's
//!   content, under the link's own key;
//! - a symlink to a directory is neither descended into nor recorded, which
//!   also means symlink cycles cannot make the walk loop;
//! - a broken symlink aborts the walk with [`TreeError::BrokenSymlink`].
//!
//! FIFOs, sockets and device nodes are skipped with a warning.

use crate::checksum::{ChecksumError, checksum_file};
use std::collections::{BTreeMap, VecDeque};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Relative key to hex encoded SHA-256 digest.
pub type Digests = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("Directory not found: {}", .0.display())]
    RootNotFound(PathBuf),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("Broken symlink: {}", .0.display())]
    BrokenSymlink(PathBuf),
    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("IO error at {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Checksum error: {0}")]
    Checksum(#[from] ChecksumError),
}

impl TreeError {
    fn from_io(path: &Path, e: std::io::Error) -> Self {
        if e.kind() == ErrorKind::PermissionDenied {
            TreeError::PermissionDenied(path.to_path_buf())
        } else {
            TreeError::Io(path.to_path_buf(), e)
        }
    }
}

/// A tree of regular files that can be enumerated and hashed.
pub trait FileTree {
    /// Relative keys of every regular file in the tree.
    ///
    /// The sequence is finite and can only be consumed once. Order carries
    /// no meaning. An `Err` item ends the sequence.
    fn files(&self) -> Box<dyn Iterator<Item = Result<String, TreeError>> + '_>;

    /// Hex encoded SHA-256 digest of the content of the file at `key`.
    fn checksum(&self, key: &str) -> Result<String, TreeError>;
}

/// Hashes every file of `tree`.
///
/// The first error aborts the scan: a file that cannot be hashed must never
/// end up looking unchanged.
pub fn scan(tree: &dyn FileTree) -> Result<Digests, TreeError> {
    let mut digests = Digests::new();

    for key in tree.files() {
        let key = key?;
        let digest = tree.checksum(&key)?;
        digests.insert(key, digest);
    }

    info!("Scanned {} files", digests.len());

    Ok(digests)
}

/// Converts `path`, which must lie below `root`, into a `/`-separated key.
pub fn relative_key(root: &Path, path: &Path) -> Result<String, TreeError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        TreeError::Io(
            path.to_path_buf(),
            std::io::Error::other(format!("not below {}", root.display())),
        )
    })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                let name = name
                    .to_str()
                    .ok_or_else(|| TreeError::NonUtf8Path(path.to_path_buf()))?;
                segments.push(name);
            }
            _ => {
                return Err(TreeError::Io(
                    path.to_path_buf(),
                    std::io::Error::other("unexpected path component"),
                ));
            }
        }
    }

    if segments.is_empty() {
        return Err(TreeError::Io(
            path.to_path_buf(),
            std::io::Error::other("path is the tree root itself"),
        ));
    }

    Ok(segments.join("/"))
}

/// Whether `key` has the shape [`relative_key`] produces.
pub fn is_normalized_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// A directory tree on the local filesystem.
#[derive(Debug, Clone)]
pub struct DiskTree {
    root: PathBuf,
    excluded: Vec<PathBuf>,
}

impl DiskTree {
    /// Opens the tree at `root`, resolving it to an absolute canonical path.
    pub fn open(root: &Path) -> Result<Self, TreeError> {
        let resolved = root.canonicalize().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                TreeError::RootNotFound(root.to_path_buf())
            } else {
                TreeError::from_io(root, e)
            }
        })?;

        if !resolved.is_dir() {
            return Err(TreeError::NotADirectory(root.to_path_buf()));
        }

        // The root is recorded in the baseline as a JSON string.
        if resolved.to_str().is_none() {
            return Err(TreeError::NonUtf8Path(resolved));
        }

        Ok(DiskTree {
            root: resolved,
            excluded: Vec::new(),
        })
    }

    /// Leaves the file at `path` (absolute, with a canonical parent) out of
    /// the enumeration. Can be called more than once.
    pub fn with_excluded(mut self, path: PathBuf) -> Self {
        self.excluded.push(path);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, key: &str) -> PathBuf {
        key.split('/').fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

impl FileTree for DiskTree {
    fn files(&self) -> Box<dyn Iterator<Item = Result<String, TreeError>> + '_> {
        Box::new(DiskFiles {
            tree: self,
            pending_dirs: vec![self.root.clone()],
            ready: VecDeque::new(),
        })
    }

    fn checksum(&self, key: &str) -> Result<String, TreeError> {
        Ok(checksum_file(&self.path_of(key))?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Dir,
    SymlinkedDir,
    Special,
}

fn classify(path: &Path) -> Result<EntryKind, TreeError> {
    let metadata = std::fs::symlink_metadata(path).map_err(|e| TreeError::from_io(path, e))?;
    let file_type = metadata.file_type();

    if file_type.is_symlink() {
        return match std::fs::metadata(path) {
            Ok(target) if target.is_file() => Ok(EntryKind::File),
            Ok(target) if target.is_dir() => Ok(EntryKind::SymlinkedDir),
            Ok(_) => Ok(EntryKind::Special),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(TreeError::BrokenSymlink(path.to_path_buf()))
            }
            Err(e) => Err(TreeError::from_io(path, e)),
        };
    }

    if file_type.is_dir() {
        Ok(EntryKind::Dir)
    } else if file_type.is_file() {
        Ok(EntryKind::File)
    } else {
        Ok(EntryKind::Special)
    }
}

/// Depth-first walk reading one directory at a time.
///
/// A directory is listed completely (and its handle closed) before any of
/// its files are handed out.
struct DiskFiles<'a> {
    tree: &'a DiskTree,
    pending_dirs: Vec<PathBuf>,
    ready: VecDeque<PathBuf>,
}

impl DiskFiles<'_> {
    fn list(&mut self, dir: &Path) -> Result<(), TreeError> {
        let mut paths = std::fs::read_dir(dir)
            .map_err(|e| TreeError::from_io(dir, e))?
            .map(|entry| {
                entry
                    .map(|e| e.path())
                    .map_err(|e| TreeError::from_io(dir, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        paths.sort();

        let mut subdirs = Vec::new();
        for path in paths {
            if self.tree.excluded.contains(&path) {
                debug!("Skipping baseline file {}", path.display());
                continue;
            }

            match classify(&path)? {
                EntryKind::File => self.ready.push_back(path),
                EntryKind::Dir => subdirs.push(path),
                EntryKind::SymlinkedDir => {
                    debug!("Not descending into symlinked directory {}", path.display());
                }
                EntryKind::Special => {
                    warn!("Skipping special file {}", path.display());
                }
            }
        }

        self.pending_dirs.extend(subdirs.into_iter().rev());

        Ok(())
    }
}

impl Iterator for DiskFiles<'_> {
    type Item = Result<String, TreeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(path) = self.ready.pop_front() {
                return Some(relative_key(&self.tree.root, &path));
            }

            let dir = self.pending_dirs.pop()?;
            if let Err(e) = self.list(&dir) {
                self.pending_dirs.clear();
                self.ready.clear();
                return Some(Err(e));
            }
        }
    }
}
