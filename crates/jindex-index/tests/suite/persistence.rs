use jindex_classfile::ClassFile;
use jindex_index::{IndexConverter, IndexStore, JavaIndex, ResourceFile};
use jindex_test_utils::{ClassFileBuilder, FieldSpec};
use pretty_assertions::assert_eq;

fn populated() -> JavaIndex {
    let mut index = JavaIndex::new();
    let first = index.add_resource(ResourceFile::new("/lib/a.jar"));
    let second = index.add_resource(ResourceFile::new("/lib/b.jar"));
    for resource in [first, second] {
        let bytes = ClassFileBuilder::new("p/Shared")
            .field(FieldSpec::new(0, "x", "I"))
            .build();
        let class = ClassFile::parse(&bytes).unwrap();
        IndexConverter::new(&mut index, resource)
            .add_type(&class, "Lp/Shared;")
            .unwrap();
    }
    let only = ClassFile::parse(&ClassFileBuilder::new("p/Only").build()).unwrap();
    IndexConverter::new(&mut index, second)
        .add_type(&only, "Lp/Only;")
        .unwrap();
    index
}

#[test]
fn same_type_in_two_resources_is_kept_per_resource() {
    let index = populated();

    let shared = index.find_types_by_field_descriptor("Lp/Shared;");
    assert_eq!(shared.len(), 2);
    assert!(shared[0].resource < shared[1].resource);
    assert!(index.find_types_by_field_descriptor("Lp/Unknown;").is_empty());
}

#[test]
fn removing_a_resource_drops_its_types() {
    let mut index = populated();
    let second = index.resources_by_location("/lib/b.jar".as_ref())[0];

    let removed = index.remove_resource(second).unwrap();
    assert_eq!(removed.location, std::path::PathBuf::from("/lib/b.jar"));
    assert_eq!(index.resource_count(), 1);
    assert_eq!(index.type_count(), 1);
    assert!(index.find_types_by_field_descriptor("Lp/Only;").is_empty());
    assert!(index.resource(second).is_none());
}

#[test]
fn saved_index_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.bin");
    let index = populated();

    index.save(&path).unwrap();
    let loaded = JavaIndex::load(&path).unwrap();

    assert_eq!(loaded.type_count(), index.type_count());
    assert_eq!(loaded.resource_count(), index.resource_count());
    let before = index.find_types_by_field_descriptor("Lp/Shared;");
    let after = loaded.find_types_by_field_descriptor("Lp/Shared;");
    assert_eq!(before, after);
    for (id, resource) in index.resources() {
        assert_eq!(loaded.resource(id), Some(resource));
    }
}

#[test]
fn foreign_or_truncated_files_are_a_cache_miss() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.bin");
    populated().save(&path).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    bytes[0] ^= 0xff;
    std::fs::write(&path, &bytes).unwrap();
    assert!(JavaIndex::load(&path).is_none());

    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    assert!(JavaIndex::load(&path).is_none());

    assert!(JavaIndex::load(&dir.path().join("missing.bin")).is_none());
}

#[test]
fn resource_ids_are_not_reused() {
    let mut index = JavaIndex::new();
    let first = index.add_resource(ResourceFile::new("/a"));
    index.remove_resource(first);
    let second = index.add_resource(ResourceFile::new("/a"));

    assert_ne!(first, second);
    assert_eq!(index.resources_by_location("/a".as_ref()), vec![second]);
}
