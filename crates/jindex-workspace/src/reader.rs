//! Reads the class files out of indexable containers.

use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use jindex_config::IndexerConfig;

use crate::error::WorkspaceError;

const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

/// Everything in an archive that is not a class file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ArchiveListing {
    pub(crate) manifest: Option<String>,
    pub(crate) non_class_entries: Vec<String>,
    /// The archive could not be read as a zip file, entirely or from some entry on.
    pub(crate) corrupt: bool,
}

/// `p/q/C.class` to `p/q/C`, or `None` for names that are not class files.
fn binary_name<'a>(entry: &'a str, config: &IndexerConfig) -> Option<&'a str> {
    let (stem, ext) = entry.rsplit_once('.')?;
    config
        .class_file_extensions
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(ext))
        .then_some(stem)
}

fn is_jmod(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jmod"))
}

/// Calls `on_class(binary_name, entry_name, bytes)` for each class entry of the
/// archive at `path`, in archive order.
///
/// Failing to open the file is an error. Failing to read it as a zip archive
/// marks the listing corrupt and keeps whatever was read before.
pub(crate) fn read_archive<F>(
    path: &Path,
    config: &IndexerConfig,
    mut on_class: F,
) -> Result<ArchiveListing, WorkspaceError>
where
    F: FnMut(&str, &str, &[u8]),
{
    let file = File::open(path).map_err(|err| WorkspaceError::io(path, err))?;
    let mut listing = ArchiveListing::default();
    let mut archive = match zip::ZipArchive::new(file) {
        Ok(archive) => archive,
        Err(err) => {
            tracing::warn!(
                target = "jindex.workspace",
                path = %path.display(),
                error = %err,
                "archive is corrupt; indexing it as empty"
            );
            listing.corrupt = true;
            return Ok(listing);
        }
    };
    let jmod = is_jmod(path);

    let mut bytes = Vec::new();
    for idx in 0..archive.len() {
        let mut entry = match archive.by_index(idx) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(
                    target = "jindex.workspace",
                    path = %path.display(),
                    entry = idx,
                    error = %err,
                    "archive is corrupt; ignoring the remaining entries"
                );
                listing.corrupt = true;
                break;
            }
        };
        let name = entry.name().to_owned();

        let class_name = if entry.is_dir() {
            None
        } else {
            binary_name(&name, config)
        };
        let Some(class_name) = class_name else {
            if name == MANIFEST_ENTRY {
                let mut text = Vec::new();
                match entry.read_to_end(&mut text) {
                    Ok(_) => listing.manifest = Some(String::from_utf8_lossy(&text).into_owned()),
                    Err(err) => tracing::warn!(
                        target = "jindex.workspace",
                        path = %path.display(),
                        error = %err,
                        "failed to read manifest"
                    ),
                }
            }
            listing.non_class_entries.push(name);
            continue;
        };

        bytes.clear();
        if let Err(err) = entry.read_to_end(&mut bytes) {
            tracing::warn!(
                target = "jindex.workspace",
                path = %path.display(),
                entry = %name,
                error = %err,
                "failed to read archive entry; skipping"
            );
            continue;
        }
        // JMODs keep class files under `classes/`.
        let class_name = if jmod {
            class_name.strip_prefix("classes/").unwrap_or(class_name)
        } else {
            class_name
        };
        on_class(class_name, &name, &bytes);
    }

    Ok(listing)
}

/// Walks the class folder at `root` breadth first, calling
/// `on_class(binary_name, path, bytes)` for each class file.
///
/// Directories and files that cannot be read are logged and skipped. Entries
/// of one directory are visited in name order.
pub(crate) fn read_class_folder<F>(root: &Path, config: &IndexerConfig, mut on_class: F)
where
    F: FnMut(&str, &Path, &[u8]),
{
    let mut queue: VecDeque<(std::path::PathBuf, String)> = VecDeque::new();
    queue.push_back((root.to_path_buf(), String::new()));

    while let Some((dir, prefix)) = queue.pop_front() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(
                    target = "jindex.workspace",
                    path = %dir.display(),
                    error = %err,
                    "failed to list directory; skipping"
                );
                continue;
            }
        };
        let mut entries: Vec<_> = entries.filter_map(|entry| entry.ok()).collect();
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            let relative = format!("{prefix}{file_name}");
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                queue.push_back((path, format!("{relative}/")));
                continue;
            }
            let Some(class_name) = binary_name(&relative, config) else {
                continue;
            };
            match std::fs::read(&path) {
                Ok(bytes) => on_class(class_name, &path, &bytes),
                Err(err) => tracing::warn!(
                    target = "jindex.workspace",
                    path = %path.display(),
                    error = %err,
                    "failed to read class file; skipping"
                ),
            }
        }
    }
}

/// `module-info` and `package-info` describe modules and packages, not types.
pub(crate) fn is_type_class(binary_name: &str) -> bool {
    let simple = binary_name.rsplit('/').next().unwrap_or(binary_name);
    simple != "module-info" && simple != "package-info"
}
