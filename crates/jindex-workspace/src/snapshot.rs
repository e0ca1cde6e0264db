use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::error::RescanError;
use crate::host::{IndexableHandle, IndexableKind, WorkspaceHost};
use crate::progress::{Progress, ProgressSink};

/// Every handle that resolved to one canonical location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub location: PathBuf,
    /// Kind of the first handle seen for this location.
    pub kind: IndexableKind,
    pub handles: Vec<IndexableHandle>,
}

/// The indexables of a workspace at one point in time, keyed by canonical
/// location in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct WorkspaceSnapshot {
    entries: Vec<SnapshotEntry>,
    by_location: HashMap<PathBuf, usize>,
}

impl WorkspaceSnapshot {
    /// Enumerates `host` breadth first, one root at a time.
    ///
    /// A root or handle that fails to enumerate or resolve is logged and
    /// skipped. Cancellation is checked between roots.
    pub fn create(
        host: &dyn WorkspaceHost,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<Self, RescanError> {
        let mut queue: VecDeque<String> = host.roots().into();
        let mut progress = Progress::start(progress, "Enumerating workspace", queue.len());
        let mut snapshot = WorkspaceSnapshot::default();

        while let Some(root) = queue.pop_front() {
            if cancel.is_cancelled() {
                return Err(RescanError::Cancelled);
            }
            progress.step(root.clone());

            let children = match host.children(&root) {
                Ok(children) => children,
                Err(err) => {
                    tracing::warn!(
                        target = "jindex.workspace",
                        root = %root,
                        error = %err,
                        "failed to enumerate workspace root; skipping"
                    );
                    continue;
                }
            };

            for handle in children {
                match host.canonical_location(&handle) {
                    Ok(location) => snapshot.insert(location, handle),
                    Err(err) => tracing::warn!(
                        target = "jindex.workspace",
                        path = %handle.path.display(),
                        error = %err,
                        "failed to resolve indexable; skipping"
                    ),
                }
            }
        }

        progress.finish(format!("{} locations", snapshot.len()));
        Ok(snapshot)
    }

    /// Adds `handle` under `location`.
    ///
    /// The first handle seen for a location decides its owner. Later handles
    /// from a different, non-empty owner are dropped; handles without an
    /// owner are always kept.
    pub fn insert(&mut self, location: PathBuf, handle: IndexableHandle) {
        let Some(&idx) = self.by_location.get(&location) else {
            self.by_location.insert(location.clone(), self.entries.len());
            self.entries.push(SnapshotEntry {
                location,
                kind: handle.kind,
                handles: vec![handle],
            });
            return;
        };

        let entry = &mut self.entries[idx];
        if handle.has_owner() {
            let first_owner = entry.handles[0].owner.as_deref();
            if first_owner.is_some_and(|owner| !owner.is_empty())
                && first_owner != handle.owner.as_deref()
            {
                tracing::debug!(
                    target = "jindex.workspace",
                    location = %entry.location.display(),
                    owner = handle.owner.as_deref().unwrap_or_default(),
                    kept = first_owner.unwrap_or_default(),
                    "dropping duplicate handle"
                );
                return;
            }
        }
        entry.handles.push(handle);
    }

    pub fn get(&self, location: &Path) -> Option<&SnapshotEntry> {
        self.by_location.get(location).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, location: &Path) -> bool {
        self.by_location.contains_key(location)
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn locations(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|entry| entry.location.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
