use std::path::{Path, PathBuf};

use jindex_config::IndexerConfig;

use crate::error::WorkspaceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexableKind {
    /// A zip-format archive (`.jar`, `.zip`, `.jmod`).
    Archive,
    /// A directory tree of class files laid out by package.
    ClassFolder,
    /// A single class file.
    ClassFile,
}

/// One logical reference to an indexable, as declared by the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexableHandle {
    pub kind: IndexableKind,
    /// The path as declared; it may be relative or go through symlinks.
    pub path: PathBuf,
    /// The logical context (project) that declared the handle. `None` for
    /// handles shared by the whole workspace.
    pub owner: Option<String>,
}

impl IndexableHandle {
    pub fn has_owner(&self) -> bool {
        self.owner.as_deref().is_some_and(|owner| !owner.is_empty())
    }

    /// `owner/path`, the form recorded as a resource's workspace path.
    pub fn workspace_path(&self) -> String {
        match self.owner.as_deref() {
            Some(owner) if !owner.is_empty() => format!("{owner}/{}", self.path.display()),
            _ => self.path.display().to_string(),
        }
    }
}

/// The hosting environment that knows which indexables the workspace uses.
pub trait WorkspaceHost {
    /// Logical roots, in the order they should be visited.
    fn roots(&self) -> Vec<String>;

    /// Handles declared directly by `root`.
    fn children(&self, root: &str) -> Result<Vec<IndexableHandle>, WorkspaceError>;

    /// The canonical on-disk location `handle` refers to.
    fn canonical_location(&self, handle: &IndexableHandle) -> Result<PathBuf, WorkspaceError>;
}

#[derive(Debug, Clone)]
struct Project {
    name: String,
    classpath: Vec<PathBuf>,
}

/// A [`WorkspaceHost`] over a fixed list of projects on the local file system.
///
/// Each project declares classpath entries; the kind of an entry is decided
/// by looking at the file system and the configured extensions. Entries added
/// with [`shared`](Self::shared) have no owner.
#[derive(Debug, Clone)]
pub struct FsWorkspaceHost {
    config: IndexerConfig,
    projects: Vec<Project>,
    shared: Vec<PathBuf>,
}

const SHARED_ROOT: &str = "";

impl FsWorkspaceHost {
    pub fn new(config: IndexerConfig) -> Self {
        Self {
            config,
            projects: Vec::new(),
            shared: Vec::new(),
        }
    }

    pub fn project<I, P>(mut self, name: impl Into<String>, classpath: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.projects.push(Project {
            name: name.into(),
            classpath: classpath.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn shared(mut self, path: impl Into<PathBuf>) -> Self {
        self.shared.push(path.into());
        self
    }

    fn classify(&self, path: &Path) -> Result<IndexableKind, WorkspaceError> {
        let metadata = std::fs::metadata(path).map_err(|err| WorkspaceError::io(path, err))?;
        if metadata.is_dir() {
            Ok(IndexableKind::ClassFolder)
        } else if self.config.is_archive(path) {
            Ok(IndexableKind::Archive)
        } else if self.config.is_class_file(path) {
            Ok(IndexableKind::ClassFile)
        } else {
            Err(WorkspaceError::Unsupported(path.to_path_buf()))
        }
    }

    fn handles(&self, entries: &[PathBuf], owner: Option<&str>) -> Vec<IndexableHandle> {
        entries
            .iter()
            .filter_map(|path| match self.classify(path) {
                Ok(kind) => Some(IndexableHandle {
                    kind,
                    path: path.clone(),
                    owner: owner.map(str::to_string),
                }),
                Err(err) => {
                    tracing::debug!(
                        target = "jindex.workspace",
                        path = %path.display(),
                        error = %err,
                        "skipping classpath entry"
                    );
                    None
                }
            })
            .collect()
    }
}

impl WorkspaceHost for FsWorkspaceHost {
    fn roots(&self) -> Vec<String> {
        let mut roots: Vec<String> = self.projects.iter().map(|p| p.name.clone()).collect();
        if !self.shared.is_empty() {
            roots.push(SHARED_ROOT.to_string());
        }
        roots
    }

    fn children(&self, root: &str) -> Result<Vec<IndexableHandle>, WorkspaceError> {
        if root == SHARED_ROOT {
            return Ok(self.handles(&self.shared, None));
        }
        let project = self
            .projects
            .iter()
            .find(|project| project.name == root)
            .ok_or_else(|| WorkspaceError::UnknownRoot(root.to_string()))?;
        Ok(self.handles(&project.classpath, Some(&project.name)))
    }

    fn canonical_location(&self, handle: &IndexableHandle) -> Result<PathBuf, WorkspaceError> {
        dunce::canonicalize(&handle.path).map_err(|err| WorkspaceError::io(&handle.path, err))
    }
}
