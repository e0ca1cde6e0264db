use std::path::PathBuf;

use jindex_index::IndexError;

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a class folder, archive or class file", .0.display())]
    Unsupported(PathBuf),

    #[error("unknown project `{0}`")]
    UnknownRoot(String),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl WorkspaceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkspaceError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RescanError {
    #[error("rescan was cancelled")]
    Cancelled,

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}
