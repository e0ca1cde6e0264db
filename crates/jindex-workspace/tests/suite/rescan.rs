use std::path::{Path, PathBuf};

use jindex_classfile::access_flags;
use jindex_config::{init_tracing, IndexerConfig, LoggingConfig};
use jindex_index::{IndexStore, JavaIndex, ResourceFile};
use jindex_test_utils::{write_jar, ClassFileBuilder, FieldSpec, MethodSpec};
use jindex_workspace::{
    CancellationToken, FsWorkspaceHost, Indexer, ProgressEvent, ProgressSender, RescanError,
};
use pretty_assertions::assert_eq;

fn class(name: &str) -> Vec<u8> {
    ClassFileBuilder::new(name)
        .field(FieldSpec::new(access_flags::ACC_PRIVATE, "value", "I"))
        .method(MethodSpec::new(access_flags::ACC_PUBLIC, "<init>", "()V"))
        .build()
}

fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap()
}

fn only_resource<'a>(indexer: &'a Indexer, location: &Path) -> &'a ResourceFile {
    let ids = indexer.index().resources_by_location(location);
    assert_eq!(ids.len(), 1, "resources at {}", location.display());
    indexer.index().resource(ids[0]).unwrap()
}

fn rescan(indexer: &mut Indexer, host: &FsWorkspaceHost) -> jindex_workspace::RescanSummary {
    init_tracing(&LoggingConfig {
        level: "jindex=debug".to_owned(),
        json: true,
    });
    indexer
        .rescan(host, &CancellationToken::new(), &())
        .unwrap()
}

#[test]
fn archive_is_indexed_with_its_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib.jar");
    let a = class("p/A");
    let b = ClassFileBuilder::new("p/B").major_version(55).build();
    let module_info = ClassFileBuilder::new("module-info")
        .access_flags(0x8000)
        .superclass(None)
        .build();
    write_jar(
        &jar,
        &[
            ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n"),
            ("module-info.class", &module_info),
            ("p/A.class", &a),
            ("p/B.class", &b),
            ("p/package-info.class", &class("p/package-info")),
            ("p/broken.class", b"\xca\xfe"),
        ],
    )
    .unwrap();

    let host = FsWorkspaceHost::new(IndexerConfig::default()).project("app", [&jar]);
    let mut indexer = Indexer::new(IndexerConfig::default());
    let summary = rescan(&mut indexer, &host);

    assert_eq!(summary.locations, 1);
    assert_eq!(summary.reindexed, 1);
    assert_eq!(summary.classes_indexed, 2);
    assert_eq!(indexer.index().type_count(), 2);
    assert_eq!(indexer.index().find_types_by_field_descriptor("Lp/A;").len(), 1);
    assert!(indexer
        .index()
        .find_types_by_field_descriptor("Lmodule-info;")
        .is_empty());

    let resource = only_resource(&indexer, &canonical(&jar));
    assert_eq!(resource.manifest.as_deref(), Some("Manifest-Version: 1.0\n"));
    assert_eq!(resource.non_class_entries, vec!["META-INF/MANIFEST.MF"]);
    assert_eq!(resource.jdk_level, 61);
    assert!(!resource.corrupt);
    assert!(!resource.fingerprint.is_empty());
    assert_eq!(resource.workspace_paths, vec![format!("app/{}", jar.display())]);
}

#[test]
fn unchanged_locations_are_not_read_again() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib.jar");
    write_jar(&jar, &[("p/A.class", &class("p/A"))]).unwrap();
    let host = FsWorkspaceHost::new(IndexerConfig::default()).project("app", [&jar]);
    let mut indexer = Indexer::new(IndexerConfig::default());

    rescan(&mut indexer, &host);
    let before = indexer.index().find_types_by_field_descriptor("Lp/A;")[0].clone();
    let summary = rescan(&mut indexer, &host);

    assert_eq!(summary.reindexed, 0);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(indexer.index().type_count(), 1);
    assert_eq!(
        indexer.index().find_types_by_field_descriptor("Lp/A;")[0],
        &before
    );
    assert_eq!(indexer.freshness().is_up_to_date(&canonical(&jar)), Some(true));
}

#[test]
fn changed_archive_replaces_the_old_resource() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib.jar");
    write_jar(&jar, &[("p/A.class", &class("p/A"))]).unwrap();
    let host = FsWorkspaceHost::new(IndexerConfig::default()).project("app", [&jar]);
    let mut indexer = Indexer::new(IndexerConfig::default());
    rescan(&mut indexer, &host);

    write_jar(
        &jar,
        &[("p/A.class", &class("p/A")), ("p/B.class", &class("p/B"))],
    )
    .unwrap();
    let summary = rescan(&mut indexer, &host);

    assert_eq!(summary.reindexed, 1);
    assert_eq!(indexer.index().resource_count(), 1);
    assert_eq!(indexer.index().type_count(), 2);
    let resource = only_resource(&indexer, &canonical(&jar));
    assert!(resource.non_class_entries.is_empty());
}

#[test]
fn resources_leaving_the_workspace_are_collected() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib.jar");
    write_jar(&jar, &[("p/A.class", &class("p/A"))]).unwrap();
    let with_jar = FsWorkspaceHost::new(IndexerConfig::default()).project("app", [&jar]);
    let without_jar =
        FsWorkspaceHost::new(IndexerConfig::default()).project("app", Vec::<PathBuf>::new());

    let mut indexer = Indexer::new(IndexerConfig::default());
    rescan(&mut indexer, &with_jar);
    let summary = rescan(&mut indexer, &without_jar);

    assert_eq!(summary.garbage_collected, 1);
    assert_eq!(indexer.index().resource_count(), 0);
    assert_eq!(indexer.index().type_count(), 0);
}

#[test]
fn recently_used_resources_survive_collection() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib.jar");
    write_jar(&jar, &[("p/A.class", &class("p/A"))]).unwrap();
    let config = IndexerConfig {
        gc_unused_after_ms: 24 * 60 * 60 * 1000,
        ..IndexerConfig::default()
    };
    let with_jar = FsWorkspaceHost::new(config.clone()).project("app", [&jar]);
    let without_jar = FsWorkspaceHost::new(config.clone()).project("app", Vec::<PathBuf>::new());

    let mut indexer = Indexer::new(config);
    rescan(&mut indexer, &with_jar);
    let summary = rescan(&mut indexer, &without_jar);

    assert_eq!(summary.garbage_collected, 0);
    assert_eq!(indexer.index().resource_count(), 1);
}

#[test]
fn corrupt_archive_is_recorded_without_types() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("broken.jar");
    std::fs::write(&jar, b"definitely not a zip archive").unwrap();
    let host = FsWorkspaceHost::new(IndexerConfig::default()).project("app", [&jar]);

    let mut indexer = Indexer::new(IndexerConfig::default());
    let summary = rescan(&mut indexer, &host);

    assert_eq!(summary.reindexed, 1);
    assert_eq!(summary.classes_indexed, 0);
    assert!(only_resource(&indexer, &canonical(&jar)).corrupt);
    assert_eq!(indexer.index().type_count(), 0);
}

#[test]
fn class_folders_and_loose_class_files_are_indexed() {
    let dir = tempfile::tempdir().unwrap();
    let classes = dir.path().join("classes");
    std::fs::create_dir_all(classes.join("p/q")).unwrap();
    std::fs::write(classes.join("p/A.class"), class("p/A")).unwrap();
    std::fs::write(classes.join("p/q/B.class"), class("p/q/B")).unwrap();
    std::fs::write(classes.join("p/q/package-info.class"), class("p/q/package-info")).unwrap();
    let loose = dir.path().join("Stray.class");
    std::fs::write(&loose, class("r/Stray")).unwrap();

    let host = FsWorkspaceHost::new(IndexerConfig::default())
        .project("app", [&classes])
        .shared(&loose);
    let mut indexer = Indexer::new(IndexerConfig::default());
    let summary = rescan(&mut indexer, &host);

    assert_eq!(summary.reindexed, 2);
    assert_eq!(summary.classes_indexed, 3);
    for descriptor in ["Lp/A;", "Lp/q/B;", "Lr/Stray;"] {
        assert_eq!(
            indexer.index().find_types_by_field_descriptor(descriptor).len(),
            1,
            "{descriptor}"
        );
    }
    assert_eq!(
        only_resource(&indexer, &canonical(&loose)).workspace_paths,
        vec![loose.display().to_string()]
    );
}

#[test]
fn renamed_class_in_existing_package_reindexes_the_folder() {
    let dir = tempfile::tempdir().unwrap();
    let classes = dir.path().join("classes");
    std::fs::create_dir_all(classes.join("p")).unwrap();
    std::fs::write(classes.join("p/A.class"), class("p/A")).unwrap();
    let host = FsWorkspaceHost::new(IndexerConfig::default()).project("app", [&classes]);
    let mut indexer = Indexer::new(IndexerConfig::default());
    rescan(&mut indexer, &host);
    assert_eq!(indexer.index().find_types_by_field_descriptor("Lp/A;").len(), 1);

    std::thread::sleep(std::time::Duration::from_millis(20));
    std::fs::rename(classes.join("p/A.class"), classes.join("p/B.class")).unwrap();
    let summary = rescan(&mut indexer, &host);

    assert_eq!(summary.reindexed, 1);
    assert_eq!(summary.unchanged, 0);
    assert!(indexer.index().find_types_by_field_descriptor("Lp/A;").is_empty());
    assert_eq!(indexer.index().find_types_by_field_descriptor("Lp/B;").len(), 1);
    assert_eq!(indexer.index().resource_count(), 1);
}

#[test]
fn rescan_progress_reaches_every_subscriber() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib.jar");
    write_jar(&jar, &[("p/A.class", &class("p/A"))]).unwrap();
    let host = FsWorkspaceHost::new(IndexerConfig::default()).project("app", [&jar]);
    let progress = ProgressSender::default();
    let mut first = progress.subscribe();
    let mut second = progress.subscribe();

    let mut indexer = Indexer::new(IndexerConfig::default());
    indexer
        .rescan(&host, &CancellationToken::new(), &progress)
        .unwrap();

    let first: Vec<_> = std::iter::from_fn(|| first.try_recv().ok()).collect();
    let second: Vec<_> = std::iter::from_fn(|| second.try_recv().ok()).collect();
    assert_eq!(first, second);
    let titles: Vec<_> = first
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::Begin { title, .. } => Some(title.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(titles.last(), Some(&"Indexing"));
    assert!(first.contains(&ProgressEvent::End {
        message: Some("1 classes".to_string())
    }));
}

#[test]
fn self_test_accepts_what_was_indexed() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib.jar");
    let generic = ClassFileBuilder::new("p/Box")
        .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
        .field(FieldSpec {
            signature: Some("TT;".to_string()),
            ..FieldSpec::new(access_flags::ACC_PRIVATE, "value", "Ljava/lang/Object;")
        })
        .method(MethodSpec {
            signature: Some("()TT;".to_string()),
            ..MethodSpec::new(access_flags::ACC_PUBLIC, "get", "()Ljava/lang/Object;")
        })
        .build();
    write_jar(&jar, &[("p/A.class", &class("p/A")), ("p/Box.class", &generic)]).unwrap();
    let config = IndexerConfig {
        self_test: true,
        ..IndexerConfig::default()
    };
    let host = FsWorkspaceHost::new(config.clone()).project("app", [&jar]);

    let mut indexer = Indexer::new(config);
    let summary = rescan(&mut indexer, &host);

    assert_eq!(summary.classes_indexed, 2);
    assert_eq!(summary.self_test_failures, 0);
}

#[test]
fn index_is_persisted_and_reopened() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib.jar");
    write_jar(&jar, &[("p/A.class", &class("p/A"))]).unwrap();
    let config = IndexerConfig {
        cache_dir: Some(dir.path().join("cache")),
        ..IndexerConfig::default()
    };
    let host = FsWorkspaceHost::new(config.clone()).project("app", [&jar]);

    let mut indexer = Indexer::new(config.clone());
    rescan(&mut indexer, &host);
    let saved = JavaIndex::load(&config.index_file().unwrap()).unwrap();
    assert_eq!(saved.type_count(), 1);

    let mut reopened = Indexer::open(config);
    assert_eq!(reopened.index().type_count(), 1);
    let summary = rescan(&mut reopened, &host);
    assert_eq!(summary.reindexed, 0);
    assert_eq!(summary.unchanged, 1);
}

#[test]
fn cancelled_rescan_reports_cancellation() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib.jar");
    write_jar(&jar, &[("p/A.class", &class("p/A"))]).unwrap();
    let host = FsWorkspaceHost::new(IndexerConfig::default()).project("app", [&jar]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut indexer = Indexer::new(IndexerConfig::default());
    let result = indexer.rescan(&host, &cancel, &());

    assert!(matches!(result, Err(RescanError::Cancelled)));
    assert_eq!(indexer.index().type_count(), 0);
}

#[test]
fn make_dirty_forgets_freshness() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib.jar");
    write_jar(&jar, &[("p/A.class", &class("p/A"))]).unwrap();
    let host = FsWorkspaceHost::new(IndexerConfig::default()).project("app", [&jar]);
    let mut indexer = Indexer::new(IndexerConfig::default());
    rescan(&mut indexer, &host);
    rescan(&mut indexer, &host);

    let location = canonical(&jar);
    assert_eq!(indexer.freshness().is_up_to_date(&location), Some(true));
    indexer.make_dirty(&location);
    assert_eq!(indexer.freshness().is_up_to_date(&location), None);
}
