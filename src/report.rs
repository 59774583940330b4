use crate::tree::Digests;
use crate::util::hashing::hash_str_field;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Modified,
    Added,
    Removed,
}

impl ChangeType {
    pub fn code(self) -> &'static str {
        match self {
            ChangeType::Modified => "M",
            ChangeType::Added => "A",
            ChangeType::Removed => "R",
        }
    }
}

/// Differences between a baseline and the current state of its tree.
///
/// `modified`, `added` and `removed` are disjoint and each sorted
/// lexicographically. Together with the `unchanged` files they cover every
/// path known to either side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    /// Root the comparison was made against.
    pub root: PathBuf,
    /// In both, with different content.
    pub modified: Vec<String>,
    /// Only in the current tree.
    pub added: Vec<String>,
    /// Only in the baseline.
    pub removed: Vec<String>,
    pub unchanged: usize,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.total_changes() == 0
    }

    pub fn total_changes(&self) -> usize {
        self.modified.len() + self.added.len() + self.removed.len()
    }

    /// Every changed path with its change type: modified, then added, then
    /// removed.
    pub fn changes(&self) -> impl Iterator<Item = (ChangeType, &str)> {
        tagged(ChangeType::Modified, &self.modified)
            .chain(tagged(ChangeType::Added, &self.added))
            .chain(tagged(ChangeType::Removed, &self.removed))
    }

    /// A unique fingerprint of the change set.
    ///
    /// Two reports listing the same paths with the same change types have
    /// the same fingerprint, whatever the digests involved. This is currently
    /// a Base64-encoded SHA-256 but could change in the future.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();

        for (change, path) in self.changes() {
            hash_str_field(&mut hasher, path);
            hash_str_field(&mut hasher, change.code());
        }

        base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
    }
}

fn tagged(change: ChangeType, paths: &[String]) -> impl Iterator<Item = (ChangeType, &str)> {
    paths.iter().map(move |p| (change, p.as_str()))
}

/// Three-way comparison of baseline digests against a fresh snapshot.
pub fn compare(root: PathBuf, baseline: &Digests, snapshot: &Digests) -> IntegrityReport {
    let mut modified = Vec::new();
    let mut removed = Vec::new();
    let mut unchanged = 0;

    for (path, old_sha256) in baseline {
        match snapshot.get(path) {
            None => removed.push(path.clone()),
            Some(new_sha256) if new_sha256 != old_sha256 => modified.push(path.clone()),
            Some(_) => unchanged += 1,
        }
    }

    let added = snapshot
        .keys()
        .filter(|path| !baseline.contains_key(*path))
        .cloned()
        .collect();

    IntegrityReport {
        root,
        modified,
        added,
        removed,
        unchanged,
    }
}
