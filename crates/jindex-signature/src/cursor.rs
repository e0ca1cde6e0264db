use crate::error::{Result, SignatureError};

/// An immutable position within a signature string.
///
/// Parsing functions take a cursor by value and hand back the advanced one
/// next to the node they produced, so a failed branch never leaves a
/// half-consumed cursor behind.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub(crate) fn position(self) -> usize {
        self.pos
    }

    pub(crate) fn at_end(self) -> bool {
        self.pos >= self.input.len()
    }

    pub(crate) fn peek(self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Advances over one ASCII grammar symbol.
    pub(crate) fn bump(self) -> Self {
        Self {
            pos: (self.pos + 1).min(self.input.len()),
            ..self
        }
    }

    pub(crate) fn expect(self, symbol: u8) -> Result<Self> {
        match self.peek() {
            Some(b) if b == symbol => Ok(self.bump()),
            Some(_) => Err(self.error(format!("expected `{}`", symbol as char))),
            None => Err(self.error(format!("expected `{}`, found end of input", symbol as char))),
        }
    }

    /// Advances over `symbol` when it is next; otherwise stays put.
    pub(crate) fn skip(self, symbol: u8) -> Self {
        if self.peek() == Some(symbol) {
            self.bump()
        } else {
            self
        }
    }

    /// Consumes a non-empty run of characters up to (not including) the first
    /// byte in `terminators`.
    pub(crate) fn identifier(self, terminators: &[u8]) -> Result<(&'a str, Self)> {
        let rest = &self.input.as_bytes()[self.pos..];
        let len = rest
            .iter()
            .position(|b| terminators.contains(b))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected identifier"));
        }
        let end = self.pos + len;
        Ok((
            &self.input[self.pos..end],
            Self { pos: end, ..self },
        ))
    }

    pub(crate) fn slice_from(self, start: Cursor<'a>) -> &'a str {
        &self.input[start.pos..self.pos]
    }

    pub(crate) fn ensure_end(self) -> Result<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error("unexpected trailing characters"))
        }
    }

    pub(crate) fn error(self, message: impl Into<String>) -> SignatureError {
        SignatureError::new(message, self.input, self.pos)
    }
}
