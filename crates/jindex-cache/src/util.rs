use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CacheError, Result};

/// Upper bound for any cache file we are willing to decode. A corrupted
/// length prefix must turn into a cache miss, not a huge allocation.
pub const MAX_CACHE_FILE_BYTES: usize = 256 * 1024 * 1024;

pub fn now_millis() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as u64,
        Err(err) => {
            static REPORTED: OnceLock<()> = OnceLock::new();
            if REPORTED.set(()).is_ok() {
                tracing::debug!(
                    target = "jindex.cache",
                    error = %err,
                    "system clock is before the unix epoch; using 0"
                );
            }
            0
        }
    }
}

fn bincode_options() -> impl Options + Copy {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode_options().serialize(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode_options()
        .with_limit(MAX_CACHE_FILE_BYTES as u64)
        .deserialize(bytes)?)
}

/// Reads a cache file, returning `None` for anything that is not a regular
/// file within the size limit. Missing files are silent; other failures are
/// logged.
pub fn read_cache_file(path: &Path) -> Option<Vec<u8>> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
        Err(err) => {
            tracing::debug!(
                target = "jindex.cache",
                path = %path.display(),
                error = %err,
                "failed to stat cache file"
            );
            return None;
        }
    };
    if !meta.is_file() || meta.len() > MAX_CACHE_FILE_BYTES as u64 {
        tracing::debug!(
            target = "jindex.cache",
            path = %path.display(),
            len = meta.len(),
            "ignoring cache file that is not a regular file or is too large"
        );
        return None;
    }
    match fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            tracing::debug!(
                target = "jindex.cache",
                path = %path.display(),
                error = %err,
                "failed to read cache file"
            );
            None
        }
    }
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A sibling temp file that is deleted on drop unless it was renamed into
/// place.
struct PendingFile {
    tmp_path: PathBuf,
    renamed: bool,
}

impl PendingFile {
    fn create(dest: &Path, dir: &Path) -> io::Result<(Self, fs::File)> {
        let file_name = dest
            .file_name()
            .ok_or_else(|| io::Error::other("destination has no file name"))?;
        loop {
            let mut tmp_name = file_name.to_os_string();
            tmp_name.push(format!(
                ".tmp.{}.{}",
                std::process::id(),
                TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
            ));
            let tmp_path = dir.join(tmp_name);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&tmp_path)
            {
                Ok(file) => {
                    return Ok((
                        Self {
                            tmp_path,
                            renamed: false,
                        },
                        file,
                    ))
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn rename_to(mut self, dest: &Path) -> io::Result<()> {
        const MAX_ATTEMPTS: usize = 64;
        let mut attempts = 0;
        loop {
            match fs::rename(&self.tmp_path, dest) {
                Ok(()) => {
                    self.renamed = true;
                    return Ok(());
                }
                // `rename` does not replace an existing file on Windows.
                Err(err) if cfg!(windows) && dest.exists() && attempts < MAX_ATTEMPTS => {
                    attempts += 1;
                    match fs::remove_file(dest) {
                        Ok(()) => {}
                        Err(remove) if remove.kind() == io::ErrorKind::NotFound => {}
                        Err(_) => return Err(err),
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if self.renamed {
            return;
        }
        if let Err(err) = fs::remove_file(&self.tmp_path) {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::debug!(
                    target = "jindex.cache",
                    path = %self.tmp_path.display(),
                    error = %err,
                    "failed to remove temporary cache file"
                );
            }
        }
    }
}

/// Writes `bytes` to `path` so readers only ever observe the old or the new
/// contents.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => return Err(CacheError::Io(io::Error::other("path has no parent"))),
    };
    fs::create_dir_all(dir)?;

    let (pending, mut file) = PendingFile::create(path, dir)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    pending.rename_to(path)?;

    #[cfg(unix)]
    if let Err(err) = fs::File::open(dir).and_then(|dir| dir.sync_all()) {
        tracing::debug!(
            target = "jindex.cache",
            dir = %dir.display(),
            error = %err,
            "failed to sync cache directory"
        );
    }
    Ok(())
}
