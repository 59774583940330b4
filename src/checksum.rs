use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CHUNK_SIZE: usize = 8192;

#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("IO error reading {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("File modified during checksumming: {}", .0.display())]
    ConcurrentModification(PathBuf),
}

impl ChecksumError {
    fn from_io(path: &Path, e: std::io::Error) -> Self {
        if e.kind() == ErrorKind::PermissionDenied {
            ChecksumError::PermissionDenied(path.to_path_buf())
        } else {
            ChecksumError::Io(path.to_path_buf(), e)
        }
    }
}

/// Folds everything `reader` yields into a hex encoded SHA-256 digest.
///
/// Reads in fixed size chunks so memory use does not depend on input size.
pub fn checksum_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Computes the SHA-256 checksum of a file with concurrent modification detection.
///
/// # Behavior
/// - Records the file's modification time before reading
/// - Reads the file in chunks and computes SHA-256
/// - Verifies the modification time hasn't changed after reading
///
/// The digest depends only on the file's bytes, never on its metadata. The
/// file handle is closed before this function returns.
///
/// # Errors
/// - `ChecksumError::Io`: File doesn't exist, is a broken symlink, or could not be read
/// - `ChecksumError::PermissionDenied`: Insufficient permissions to read the file
/// - `ChecksumError::ConcurrentModification`: File was detected as being modified while
///   checksumming. The absence of this error is *not* a guarantee that the
///   file was *not* modified.
pub fn checksum_file(path: &Path) -> Result<String, ChecksumError> {
    info!("Checksumming {}", path.display());

    let mtime_before = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| ChecksumError::from_io(path, e))?;

    let sha256 = {
        let file = File::open(path).map_err(|e| ChecksumError::from_io(path, e))?;
        checksum_reader(file).map_err(|e| ChecksumError::from_io(path, e))?
    };

    let mtime_after = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| ChecksumError::from_io(path, e))?;

    if mtime_before != mtime_after {
        return Err(ChecksumError::ConcurrentModification(path.to_path_buf()));
    }

    debug!("Checksum of {} is {}", path.display(), sha256);

    Ok(sha256)
}
