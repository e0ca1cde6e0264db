use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::Result;

/// Identity of an indexed location at the time it was last read.
///
/// A loose file or archive is hashed by content. A class folder is hashed over
/// the relative path, length and modification time of every file beneath it,
/// which is enough to notice added, removed or rewritten classes without
/// reading them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileFingerprint {
    pub size: u64,
    pub modified_ms: u64,
    /// Lowercase hex SHA-256, empty for a location that does not exist.
    pub hash: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FingerprintTest {
    pub matches: bool,
    /// Set when the content is unchanged but size or timestamp moved, so the
    /// stored fingerprint should be replaced to keep the next test cheap.
    pub needs_new_fingerprint: bool,
    pub new_fingerprint: FileFingerprint,
}

impl FileFingerprint {
    /// The fingerprint of a missing location.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.hash.is_empty()
    }

    /// Computes the full fingerprint of `path`. A missing path yields
    /// [`FileFingerprint::empty`].
    pub fn compute(path: &Path) -> Result<Self> {
        let Some((size, modified_ms, is_dir)) = stat(path)? else {
            return Ok(Self::empty());
        };
        let hash = if is_dir {
            hash_directory(path)?
        } else {
            hash_reader(fs::File::open(path)?)?
        };
        Ok(Self {
            size,
            modified_ms,
            hash,
        })
    }

    /// Compares this stored fingerprint against the current state of `path`.
    ///
    /// Equal size and timestamp count as unchanged without hashing. Otherwise
    /// the content hash decides.
    pub fn test(&self, path: &Path) -> Result<FingerprintTest> {
        let current = match stat(path)? {
            None => {
                return Ok(FingerprintTest {
                    matches: self.is_empty(),
                    needs_new_fingerprint: false,
                    new_fingerprint: Self::empty(),
                })
            }
            Some((size, modified_ms, _)) if !self.is_empty() => {
                if size == self.size && modified_ms == self.modified_ms {
                    return Ok(FingerprintTest {
                        matches: true,
                        needs_new_fingerprint: false,
                        new_fingerprint: self.clone(),
                    });
                }
                Self::compute(path)?
            }
            Some(_) => Self::compute(path)?,
        };

        let matches = current.hash == self.hash;
        Ok(FingerprintTest {
            matches,
            needs_new_fingerprint: matches && current != *self,
            new_fingerprint: current,
        })
    }
}

/// Size and modification time of `path`. A directory reports the total size
/// of the files beneath it and the newest timestamp of any file or directory
/// beneath it, so renames and deletions move the timestamp too.
fn stat(path: &Path) -> Result<Option<(u64, u64, bool)>> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    if !meta.is_dir() {
        return Ok(Some((meta.len(), modified_ms(path, &meta), false)));
    }

    let mut size = 0u64;
    let mut newest = modified_ms(path, &meta);
    for entry in WalkDir::new(path).min_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        let meta = entry.metadata().map_err(io::Error::from)?;
        if entry.file_type().is_file() {
            size = size.saturating_add(meta.len());
        } else if !entry.file_type().is_dir() {
            continue;
        }
        newest = newest.max(modified_ms(entry.path(), &meta));
    }
    Ok(Some((size, newest, true)))
}

fn modified_ms(path: &Path, meta: &fs::Metadata) -> u64 {
    match meta.modified().map(|time| time.duration_since(UNIX_EPOCH)) {
        Ok(Ok(elapsed)) => elapsed.as_millis() as u64,
        Ok(Err(_)) => 0,
        Err(err) => {
            tracing::debug!(
                target = "jindex.cache",
                path = %path.display(),
                error = %err,
                "file mtime unavailable; fingerprint falls back to hashing"
            );
            0
        }
    }
}

fn hash_reader(mut reader: impl Read) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn hash_directory(root: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let meta = entry.metadata().map_err(io::Error::from)?;
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        hasher.update(relative.to_string_lossy().as_bytes());
        hasher.update([0]);
        hasher.update(meta.len().to_le_bytes());
        let modified = meta
            .modified()
            .ok()
            .and_then(|time| time.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map_or(0, |elapsed| elapsed.as_nanos());
        hasher.update(modified.to_le_bytes());
    }
    Ok(hex::encode(hasher.finalize()))
}
