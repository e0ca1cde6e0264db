//! Workspace enumeration and the rescan loop that keeps the index current.
//!
//! A [`WorkspaceHost`] names the class folders, archives and loose class files
//! a workspace uses. [`WorkspaceSnapshot`] resolves them to canonical
//! locations and collapses duplicates, and [`Indexer::rescan`] re-reads the
//! locations whose fingerprint changed.

#![forbid(unsafe_code)]

mod error;
mod host;
mod indexer;
mod progress;
mod reader;
mod snapshot;

pub use crate::error::{RescanError, WorkspaceError};
pub use crate::host::{FsWorkspaceHost, IndexableHandle, IndexableKind, WorkspaceHost};
pub use crate::indexer::{Indexer, RescanSummary};
pub use crate::progress::{ProgressEvent, ProgressReceiver, ProgressSender, ProgressSink};
pub use crate::snapshot::{SnapshotEntry, WorkspaceSnapshot};

pub use tokio_util::sync::CancellationToken;
