use std::fmt;
use std::path::Path;

use jindex_cache::{now_millis, FileFingerprint, FreshnessCache};
use jindex_classfile::{internal_name_to_descriptor, ClassFile};
use jindex_config::IndexerConfig;
use jindex_index::{
    check_type, IndexBinaryType, IndexConverter, IndexStore, JavaIndex, ResourceFile, ResourceId,
};
use tokio_util::sync::CancellationToken;

use crate::error::{RescanError, WorkspaceError};
use crate::host::{IndexableHandle, IndexableKind, WorkspaceHost};
use crate::progress::{Progress, ProgressSink};
use crate::reader::{is_type_class, read_archive, read_class_folder, ArchiveListing};
use crate::snapshot::{SnapshotEntry, WorkspaceSnapshot};

/// Counters describing one [`Indexer::rescan`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RescanSummary {
    pub locations: usize,
    pub garbage_collected: usize,
    pub unchanged: usize,
    pub reindexed: usize,
    pub classes_indexed: usize,
    pub self_test_failures: usize,
}

/// Keeps a [`JavaIndex`] in sync with the indexables of a workspace.
pub struct Indexer {
    config: IndexerConfig,
    index: JavaIndex,
    freshness: FreshnessCache,
}

impl Indexer {
    pub fn new(config: IndexerConfig) -> Self {
        Self::with_index(config, JavaIndex::new())
    }

    /// Like [`new`](Self::new), starting from the persisted index when one is
    /// configured and readable.
    pub fn open(config: IndexerConfig) -> Self {
        let index = config
            .index_file()
            .and_then(|path| JavaIndex::load(&path))
            .unwrap_or_default();
        Self::with_index(config, index)
    }

    pub fn with_index(config: IndexerConfig, index: JavaIndex) -> Self {
        Self {
            config,
            index,
            freshness: FreshnessCache::new(),
        }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn index(&self) -> &JavaIndex {
        &self.index
    }

    pub fn freshness(&self) -> &FreshnessCache {
        &self.freshness
    }

    /// Forgets that `location` was up to date.
    pub fn make_dirty(&self, location: &Path) {
        self.freshness.remove(location);
    }

    /// Brings the index up to date with `host`.
    ///
    /// Locations whose fingerprint still matches are kept as they are; every
    /// other location is read again into a fresh resource that replaces the
    /// old one. Resources that left the workspace are deleted once they have
    /// been unused for `gc_unused_after_ms`. Cancellation is checked between
    /// containers; a cancelled rescan does not persist the index.
    pub fn rescan(
        &mut self,
        host: &dyn WorkspaceHost,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<RescanSummary, RescanError> {
        let now = now_millis();
        tracing::debug!(target = "jindex.workspace", "rescan started");

        self.freshness.clear();
        let snapshot = WorkspaceSnapshot::create(host, cancel, progress)?;
        let mut summary = RescanSummary {
            locations: snapshot.len(),
            garbage_collected: self.collect_garbage(&snapshot, now),
            ..RescanSummary::default()
        };

        let mut changed = Vec::new();
        for entry in snapshot.entries() {
            if self.freshness.is_up_to_date(&entry.location) == Some(true) {
                summary.unchanged += 1;
                continue;
            }
            match self.test_fingerprint(&entry.location) {
                Some(fingerprint) => changed.push((entry, fingerprint)),
                None => summary.unchanged += 1,
            }
        }

        let mut indexing = Progress::start(progress, "Indexing", changed.len());
        for (entry, fingerprint) in &changed {
            if cancel.is_cancelled() {
                return Err(RescanError::Cancelled);
            }
            indexing.step(entry.location.display().to_string());
            self.reindex(entry, fingerprint.clone(), now, &mut summary);
        }
        indexing.finish(format!("{} classes", summary.classes_indexed));

        for entry in snapshot.entries() {
            if !changed.iter().any(|(changed, _)| changed.location == entry.location) {
                self.update_mapping(entry, now);
            }
        }

        self.persist()?;

        tracing::info!(
            target = "jindex.workspace",
            locations = summary.locations,
            garbage_collected = summary.garbage_collected,
            reindexed = summary.reindexed,
            classes = summary.classes_indexed,
            "rescan finished"
        );
        Ok(summary)
    }

    fn collect_garbage(&mut self, snapshot: &WorkspaceSnapshot, now: u64) -> usize {
        let garbage: Vec<ResourceId> = self
            .index
            .resources()
            .filter(|(_, resource)| {
                !snapshot.contains(&resource.location)
                    && now.saturating_sub(resource.time_last_used_ms)
                        >= self.config.gc_unused_after_ms
            })
            .map(|(id, _)| id)
            .collect();

        for id in &garbage {
            if let Some(resource) = self.index.remove_resource(*id) {
                tracing::debug!(
                    target = "jindex.workspace",
                    path = %resource.location.display(),
                    "removed resource that is no longer in the workspace"
                );
            }
        }
        garbage.len()
    }

    /// Returns the fingerprint to store when `location` must be re-read, or
    /// `None` when the indexed copy is still current.
    fn test_fingerprint(&mut self, location: &Path) -> Option<FileFingerprint> {
        let existing = self.index.resources_by_location(location).last().copied();
        let stored = existing
            .and_then(|id| self.index.resource(id))
            .map(|resource| resource.fingerprint.clone())
            .unwrap_or_default();

        let test = match stored.test(location) {
            Ok(test) => test,
            Err(err) => {
                tracing::warn!(
                    target = "jindex.workspace",
                    path = %location.display(),
                    error = %err,
                    "failed to fingerprint location; skipping"
                );
                return None;
            }
        };

        if !test.matches {
            self.freshness.put(location, false);
            return Some(test.new_fingerprint);
        }
        if test.needs_new_fingerprint {
            if let Some(resource) = existing.and_then(|id| self.index.resource_mut(id).ok()) {
                tracing::debug!(
                    target = "jindex.workspace",
                    path = %location.display(),
                    "content unchanged; refreshing fingerprint"
                );
                resource.fingerprint = test.new_fingerprint;
            }
        }
        self.freshness.put(location, true);
        None
    }

    fn reindex(
        &mut self,
        entry: &SnapshotEntry,
        fingerprint: FileFingerprint,
        now: u64,
        summary: &mut RescanSummary,
    ) {
        let location = entry.location.as_path();
        let mut resource = ResourceFile::new(location);
        resource.time_last_used_ms = now;
        resource.workspace_paths = entry
            .handles
            .iter()
            .map(IndexableHandle::workspace_path)
            .collect();
        let id = self.index.add_resource(resource);

        let mut sink = ClassSink {
            index: &mut self.index,
            resource: id,
            self_test: self.config.self_test,
            jdk_level: 0,
            indexed: 0,
            self_test_failures: 0,
        };
        let listing = match entry.kind {
            IndexableKind::Archive => read_archive(location, &self.config, |name, entry, bytes| {
                sink.add(Some(name), &entry, bytes)
            }),
            IndexableKind::ClassFolder => {
                read_class_folder(location, &self.config, |name, path, bytes| {
                    sink.add(Some(name), &path.display(), bytes)
                });
                Ok(ArchiveListing::default())
            }
            IndexableKind::ClassFile => std::fs::read(location)
                .map(|bytes| {
                    sink.add(None, &location.display(), &bytes);
                    ArchiveListing::default()
                })
                .map_err(|err| WorkspaceError::io(location, err)),
        };
        let (jdk_level, indexed, self_test_failures) =
            (sink.jdk_level, sink.indexed, sink.self_test_failures);

        let listing = match listing {
            Ok(listing) => listing,
            Err(err) => {
                tracing::warn!(
                    target = "jindex.workspace",
                    path = %location.display(),
                    error = %err,
                    "failed to read indexable; skipping"
                );
                self.index.remove_resource(id);
                self.freshness.remove(location);
                return;
            }
        };

        if let Ok(resource) = self.index.resource_mut(id) {
            resource.fingerprint = fingerprint;
            resource.jdk_level = jdk_level;
            resource.manifest = listing.manifest;
            resource.corrupt = listing.corrupt;
            resource.non_class_entries = listing.non_class_entries;
        }
        for old in self.index.resources_by_location(location) {
            if old != id {
                self.index.remove_resource(old);
            }
        }
        // Reading may race with writers; the next rescan decides freshness again.
        self.freshness.remove(location);

        if indexed == 0 {
            tracing::debug!(
                target = "jindex.workspace",
                path = %location.display(),
                "indexable contained no class files"
            );
        }
        summary.reindexed += 1;
        summary.classes_indexed += indexed;
        summary.self_test_failures += self_test_failures;
    }

    fn update_mapping(&mut self, entry: &SnapshotEntry, now: u64) {
        let workspace_paths: Vec<String> = entry
            .handles
            .iter()
            .map(IndexableHandle::workspace_path)
            .collect();
        for id in self.index.resources_by_location(&entry.location) {
            if let Ok(resource) = self.index.resource_mut(id) {
                resource.workspace_paths = workspace_paths.clone();
                resource.time_last_used_ms = now;
            }
        }
    }

    fn persist(&self) -> Result<(), WorkspaceError> {
        let Some(path) = self.config.index_file() else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|err| WorkspaceError::io(dir, err))?;
        }
        self.index.save(&path)?;
        tracing::debug!(
            target = "jindex.workspace",
            path = %path.display(),
            types = self.index.type_count(),
            "index saved"
        );
        Ok(())
    }
}

/// Decodes class bytes and files them under one resource.
struct ClassSink<'a> {
    index: &'a mut JavaIndex,
    resource: ResourceId,
    self_test: bool,
    jdk_level: u16,
    indexed: usize,
    self_test_failures: usize,
}

impl ClassSink<'_> {
    /// `binary_name` is where the class was found; `None` files the class
    /// under the name it declares.
    fn add(&mut self, binary_name: Option<&str>, origin: &dyn fmt::Display, bytes: &[u8]) {
        let class = match ClassFile::parse(bytes) {
            Ok(class) => class,
            Err(err) => {
                tracing::warn!(
                    target = "jindex.workspace",
                    origin = %origin,
                    error = %err,
                    "unable to decode class file; skipping"
                );
                return;
            }
        };
        let binary_name = binary_name.unwrap_or(class.this_class.as_str());
        if !is_type_class(binary_name) {
            return;
        }

        let descriptor = internal_name_to_descriptor(binary_name);
        let type_id = match IndexConverter::new(&mut *self.index, self.resource)
            .add_type(&class, &descriptor)
        {
            Ok(type_id) => type_id,
            Err(err) => {
                tracing::warn!(
                    target = "jindex.workspace",
                    origin = %origin,
                    error = %err,
                    "unable to index class; skipping"
                );
                return;
            }
        };
        self.jdk_level = self.jdk_level.max(class.major_version);
        self.indexed += 1;

        if !self.self_test {
            return;
        }
        let Some(record) = self.index.find_type(type_id, self.resource) else {
            tracing::warn!(
                target = "jindex.workspace",
                origin = %origin,
                "class missing from the index right after indexing it"
            );
            self.self_test_failures += 1;
            return;
        };
        let rehydrated = IndexBinaryType::new(record, self.index.interner());
        if let Err(mismatch) = check_type(&class, &rehydrated) {
            tracing::warn!(
                target = "jindex.workspace",
                origin = %origin,
                %mismatch,
                "indexed type differs from its class file"
            );
            self.self_test_failures += 1;
        }
    }
}
