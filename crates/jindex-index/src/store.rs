use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use jindex_cache::{atomic_write, decode, encode, read_cache_file};
use jindex_signature::{TypeId, TypeInterner};
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::records::{IndexType, ResourceFile, ResourceId};

/// Where converted records are written.
///
/// Type records are keyed by `(type id, owning resource)`; storing a type
/// under a key that already exists replaces the previous record, so
/// re-indexing never duplicates a type.
pub trait IndexStore {
    fn interner(&self) -> &TypeInterner;
    fn interner_mut(&mut self) -> &mut TypeInterner;
    fn resource(&self, id: ResourceId) -> Option<&ResourceFile>;
    fn find_type(&self, type_id: TypeId, resource: ResourceId) -> Option<&IndexType>;
    /// Inserts `record` or overwrites the record with the same key.
    fn put_type(&mut self, record: IndexType) -> &IndexType;
}

/// An in-memory index that can be persisted as a single cache file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JavaIndex {
    interner: TypeInterner,
    next_resource_id: u32,
    resources: BTreeMap<ResourceId, ResourceFile>,
    types: HashMap<(TypeId, ResourceId), IndexType>,
}

const JAVA_INDEX_MAGIC: [u8; 8] = *b"JINDEXDB";
const JAVA_INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct JavaIndexFile<'a> {
    magic: [u8; 8],
    format_version: u32,
    payload: &'a JavaIndex,
}

#[derive(Deserialize)]
struct JavaIndexFileOwned {
    magic: [u8; 8],
    format_version: u32,
    payload: JavaIndex,
}

impl JavaIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_resource(&mut self, resource: ResourceFile) -> ResourceId {
        let id = ResourceId(self.next_resource_id);
        self.next_resource_id += 1;
        self.resources.insert(id, resource);
        id
    }

    pub fn resource_mut(&mut self, id: ResourceId) -> Result<&mut ResourceFile> {
        self.resources
            .get_mut(&id)
            .ok_or(IndexError::UnknownResource(id))
    }

    pub fn resources(&self) -> impl Iterator<Item = (ResourceId, &ResourceFile)> {
        self.resources.iter().map(|(id, resource)| (*id, resource))
    }

    /// Resources recorded for `location`, oldest first.
    pub fn resources_by_location(&self, location: &Path) -> Vec<ResourceId> {
        self.resources
            .iter()
            .filter(|(_, resource)| resource.location == location)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Removes a resource together with every type it owns.
    pub fn remove_resource(&mut self, id: ResourceId) -> Option<ResourceFile> {
        let removed = self.resources.remove(&id)?;
        self.types.retain(|(_, owner), _| *owner != id);
        Some(removed)
    }

    /// Every indexed type filed under `field_descriptor`, across resources.
    pub fn find_types_by_field_descriptor(&self, field_descriptor: &str) -> Vec<&IndexType> {
        let Some(type_id) = self.interner.get(field_descriptor) else {
            return Vec::new();
        };
        let mut found: Vec<_> = self
            .types
            .values()
            .filter(|record| record.type_id == type_id)
            .collect();
        found.sort_by_key(|record| record.resource);
        found
    }

    /// Types owned by `resource`, ordered by descriptor.
    pub fn types_in_resource(&self, resource: ResourceId) -> Vec<&IndexType> {
        let mut found: Vec<_> = self
            .types
            .values()
            .filter(|record| record.resource == resource)
            .collect();
        found.sort_by(|a, b| {
            self.interner
                .resolve(a.type_id)
                .cmp(self.interner.resolve(b.type_id))
        });
        found
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = JavaIndexFile {
            magic: JAVA_INDEX_MAGIC,
            format_version: JAVA_INDEX_FORMAT_VERSION,
            payload: self,
        };
        let bytes = encode(&file)?;
        atomic_write(path, &bytes)?;
        Ok(())
    }

    /// Loads a previously saved index. A missing, foreign, outdated or corrupt
    /// file is a cache miss, reported as `None`.
    pub fn load(path: &Path) -> Option<Self> {
        let bytes = read_cache_file(path)?;
        match decode::<JavaIndexFileOwned>(&bytes) {
            Ok(file) if file.magic != JAVA_INDEX_MAGIC => {
                tracing::debug!(
                    target = "jindex.index",
                    path = %path.display(),
                    "ignoring index file with unexpected magic"
                );
                None
            }
            Ok(file) if file.format_version != JAVA_INDEX_FORMAT_VERSION => {
                tracing::debug!(
                    target = "jindex.index",
                    path = %path.display(),
                    expected = JAVA_INDEX_FORMAT_VERSION,
                    found = file.format_version,
                    "ignoring index file with unsupported format version"
                );
                None
            }
            Ok(file) => Some(file.payload),
            Err(err) => {
                tracing::debug!(
                    target = "jindex.index",
                    path = %path.display(),
                    error = %err,
                    "failed to decode index file"
                );
                None
            }
        }
    }
}

impl IndexStore for JavaIndex {
    fn interner(&self) -> &TypeInterner {
        &self.interner
    }

    fn interner_mut(&mut self) -> &mut TypeInterner {
        &mut self.interner
    }

    fn resource(&self, id: ResourceId) -> Option<&ResourceFile> {
        self.resources.get(&id)
    }

    fn find_type(&self, type_id: TypeId, resource: ResourceId) -> Option<&IndexType> {
        self.types.get(&(type_id, resource))
    }

    fn put_type(&mut self, record: IndexType) -> &IndexType {
        let key = (record.type_id, record.resource);
        match self.types.entry(key) {
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                slot.insert(record);
                slot.into_mut()
            }
            std::collections::hash_map::Entry::Vacant(slot) => slot.insert(record),
        }
    }
}
