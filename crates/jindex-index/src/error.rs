use jindex_cache::CacheError;
use jindex_classfile::ClassFormatError;
use jindex_signature::SignatureError;

use crate::records::ResourceId;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    ClassFormat(#[from] ClassFormatError),

    #[error("invalid generic signature: {0}")]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("unknown resource {0:?}")]
    UnknownResource(ResourceId),
}
