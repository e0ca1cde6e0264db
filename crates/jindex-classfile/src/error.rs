pub type Result<T> = std::result::Result<T, ClassFormatError>;

/// Malformed class-file input.
///
/// Every variant means the bytes cannot be read as a class file. Nothing in the
/// decoder substitutes a default value for a bad reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassFormatError {
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("invalid classfile magic: 0x{0:08x}")]
    InvalidMagic(u32),

    #[error("invalid constant pool index: {0}")]
    InvalidConstantPoolIndex(u16),

    #[error("invalid constant pool tag: {0}")]
    InvalidConstantPoolTag(u8),

    #[error("invalid constant-pool entry at index {index}: expected {expected}, found {found}")]
    ConstantPoolTypeMismatch {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid modified UTF-8 constant")]
    InvalidModifiedUtf8,

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("invalid element value tag {0:?}")]
    InvalidElementValueTag(char),

    #[error("unknown type annotation target type 0x{0:02x}")]
    UnknownTargetType(u8),

    #[error("invalid type path kind {0}")]
    InvalidTypePathKind(u8),

    #[error("unknown stack map frame type {0}")]
    UnknownFrameType(u8),

    #[error("unknown verification type tag {0}")]
    UnknownVerificationType(u8),

    #[error("malformed {0} attribute")]
    MalformedAttribute(&'static str),

    #[error("{remaining} trailing bytes after {what}")]
    TrailingBytes { what: &'static str, remaining: usize },
}
