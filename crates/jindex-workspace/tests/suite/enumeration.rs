use std::path::PathBuf;

use jindex_config::IndexerConfig;
use jindex_workspace::{
    CancellationToken, FsWorkspaceHost, IndexableHandle, IndexableKind, ProgressEvent,
    ProgressSender, RescanError, WorkspaceError, WorkspaceHost, WorkspaceSnapshot,
};
use pretty_assertions::assert_eq;

#[test]
fn handles_resolving_to_one_location_are_collapsed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("lib")).unwrap();
    let jar = dir.path().join("lib/dep.jar");
    std::fs::write(&jar, b"").unwrap();
    let indirect = dir.path().join("lib/../lib/dep.jar");

    let host = FsWorkspaceHost::new(IndexerConfig::default())
        .project("app", [&jar])
        .project("tests", [&indirect])
        .shared(&indirect);
    let snapshot =
        WorkspaceSnapshot::create(&host, &CancellationToken::new(), &()).unwrap();

    assert_eq!(snapshot.len(), 1);
    let entry = &snapshot.entries()[0];
    assert_eq!(entry.location, dunce::canonicalize(&jar).unwrap());
    assert_eq!(entry.kind, IndexableKind::Archive);
    let owners: Vec<_> = entry.handles.iter().map(|h| h.owner.clone()).collect();
    assert_eq!(owners, vec![Some("app".to_string()), None]);
}

#[test]
fn missing_entries_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("present.jar");
    std::fs::write(&present, b"").unwrap();

    let host = FsWorkspaceHost::new(IndexerConfig::default())
        .project("app", [dir.path().join("absent.jar"), present.clone()]);
    let snapshot =
        WorkspaceSnapshot::create(&host, &CancellationToken::new(), &()).unwrap();

    let locations: Vec<_> = snapshot.locations().map(PathBuf::from).collect();
    assert_eq!(locations, vec![dunce::canonicalize(&present).unwrap()]);
}

/// A host whose first root cannot be listed and whose handles may not resolve.
struct FlakyHost {
    good: PathBuf,
}

impl WorkspaceHost for FlakyHost {
    fn roots(&self) -> Vec<String> {
        vec!["broken".to_string(), "fine".to_string()]
    }

    fn children(&self, root: &str) -> Result<Vec<IndexableHandle>, WorkspaceError> {
        match root {
            "broken" => Err(WorkspaceError::UnknownRoot(root.to_string())),
            _ => Ok(vec![
                IndexableHandle {
                    kind: IndexableKind::ClassFolder,
                    path: PathBuf::from("unresolvable"),
                    owner: Some(root.to_string()),
                },
                IndexableHandle {
                    kind: IndexableKind::ClassFolder,
                    path: self.good.clone(),
                    owner: Some(root.to_string()),
                },
            ]),
        }
    }

    fn canonical_location(&self, handle: &IndexableHandle) -> Result<PathBuf, WorkspaceError> {
        if handle.path == self.good {
            Ok(handle.path.clone())
        } else {
            Err(WorkspaceError::Unsupported(handle.path.clone()))
        }
    }
}

#[test]
fn enumeration_failures_do_not_stop_the_snapshot() {
    let host = FlakyHost {
        good: PathBuf::from("/workspace/classes"),
    };
    let progress = ProgressSender::default();
    let mut rx = progress.subscribe();
    let snapshot =
        WorkspaceSnapshot::create(&host, &CancellationToken::new(), &progress).unwrap();

    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.contains(&host.good));

    let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert!(matches!(
        events.first(),
        Some(ProgressEvent::Begin { total: 2, .. })
    ));
    assert!(matches!(events.last(), Some(ProgressEvent::End { .. })));
}

#[test]
fn cancelled_enumeration_stops() {
    let host = FlakyHost {
        good: PathBuf::from("/workspace/classes"),
    };
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = WorkspaceSnapshot::create(&host, &cancel, &());
    assert!(matches!(result, Err(RescanError::Cancelled)));
}
