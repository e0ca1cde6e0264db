use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Tri-state up-to-date tracking for indexed locations.
///
/// A location that was never recorded (or was removed/cleared) is unknown and
/// must be tested against its fingerprint before the index can be trusted for
/// it. The lock is only held for a map lookup or update; callers do their I/O
/// outside of it.
#[derive(Debug, Default)]
pub struct FreshnessCache {
    entries: Mutex<HashMap<PathBuf, bool>>,
}

impl FreshnessCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` means unknown, `Some(true)` fresh, `Some(false)` stale.
    pub fn is_up_to_date(&self, location: &Path) -> Option<bool> {
        self.lock_entries().get(location).copied()
    }

    pub fn put(&self, location: impl Into<PathBuf>, up_to_date: bool) {
        self.lock_entries().insert(location.into(), up_to_date);
    }

    pub fn remove(&self, location: &Path) {
        self.lock_entries().remove(location);
    }

    pub fn clear(&self) {
        self.lock_entries().clear();
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[track_caller]
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<PathBuf, bool>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(err) => {
                let loc = std::panic::Location::caller();
                tracing::error!(
                    target = "jindex.cache",
                    file = loc.file(),
                    line = loc.line(),
                    column = loc.column(),
                    error = %err,
                    "freshness cache mutex poisoned; continuing with recovered guard"
                );
                err.into_inner()
            }
        }
    }
}
