pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors produced by fingerprinting and cache-file persistence.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}
