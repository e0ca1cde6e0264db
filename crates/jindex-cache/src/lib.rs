//! Incremental freshness tracking and cache-file persistence helpers.
//!
//! - [`FreshnessCache`]: per-location unknown/fresh/stale state consulted
//!   before re-reading an indexed container
//! - [`FileFingerprint`]: size + mtime + SHA-256 identity of a location as of
//!   its last indexing
//! - [`atomic_write`], [`encode`], [`decode`]: the `bincode` + temp-file/rename
//!   plumbing used to persist the index

#![forbid(unsafe_code)]

mod error;
mod fingerprint;
mod freshness;
mod util;

pub use crate::error::{CacheError, Result};
pub use crate::fingerprint::{FileFingerprint, FingerprintTest};
pub use crate::freshness::FreshnessCache;
pub use crate::util::{atomic_write, decode, encode, now_millis, read_cache_file, MAX_CACHE_FILE_BYTES};
