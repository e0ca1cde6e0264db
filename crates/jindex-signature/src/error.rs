use thiserror::Error;

pub type Result<T> = std::result::Result<T, SignatureError>;

/// A generic signature (or descriptor) that does not follow the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {position} of `{signature}`")]
pub struct SignatureError {
    pub message: String,
    pub signature: String,
    pub position: usize,
}

impl SignatureError {
    pub fn new(message: impl Into<String>, signature: &str, position: usize) -> Self {
        Self {
            message: message.into(),
            signature: signature.to_string(),
            position,
        }
    }

    /// The unparsed tail of the signature starting at the failure position.
    pub fn remaining(&self) -> &str {
        self.signature.get(self.position..).unwrap_or("")
    }
}
