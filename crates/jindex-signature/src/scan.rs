//! Structure-only scanning: skips over signature elements without building
//! nodes or touching the interner.

use crate::cursor::Cursor;
use crate::error::Result;

fn skip_type(c: Cursor<'_>) -> Result<Cursor<'_>> {
    match c.peek() {
        Some(b'[') => skip_type(c.bump()),
        Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b'V') => Ok(c.bump()),
        Some(b'T') => {
            let (_, c) = c.bump().identifier(b";")?;
            Ok(c.skip(b';'))
        }
        Some(b'L') => {
            let mut c = c.bump();
            loop {
                let (_, next) = c.identifier(b"<;.")?;
                c = next;
                if c.peek() == Some(b'<') {
                    c = skip_type_arguments(c)?;
                }
                match c.peek() {
                    Some(b'.') => c = c.bump(),
                    _ => return c.expect(b';'),
                }
            }
        }
        None => Err(c.error("expected type signature, found end of input")),
        Some(_) => Err(c.error("unexpected character at start of type signature")),
    }
}

fn skip_type_arguments(c: Cursor<'_>) -> Result<Cursor<'_>> {
    let mut c = c.expect(b'<')?;
    loop {
        match c.peek() {
            Some(b'>') => return Ok(c.bump()),
            Some(b'*') => c = c.bump(),
            Some(b'+' | b'-') => c = skip_type(c.bump())?,
            Some(_) => c = skip_type(c)?,
            None => return Err(c.error("unterminated type-argument list")),
        }
    }
}

fn skip_type_parameters(c: Cursor<'_>) -> Result<Cursor<'_>> {
    if c.peek() != Some(b'<') {
        return Ok(c);
    }
    let mut c = c.bump();
    while c.peek() != Some(b'>') {
        let (_, next) = c.identifier(b":>")?;
        c = next.expect(b':')?;
        if c.peek() != Some(b':') {
            c = skip_type(c)?;
        }
        while c.peek() == Some(b':') {
            c = skip_type(c.bump())?;
        }
    }
    Ok(c.bump())
}

/// Splits `(IJ[Ljava/lang/String;)V` into its parameter descriptors and the
/// return descriptor.
pub fn split_method_descriptor(descriptor: &str) -> Result<(Vec<&str>, &str)> {
    let mut c = Cursor::new(descriptor).expect(b'(')?;
    let mut params = Vec::new();
    while c.peek() != Some(b')') {
        if c.peek() == Some(b'V') {
            return Err(c.error("parameter type cannot be void"));
        }
        let next = skip_type(c)?;
        params.push(next.slice_from(c));
        c = next;
    }
    let c = c.bump();
    let end = skip_type(c)?;
    end.ensure_end()?;
    Ok((params, end.slice_from(c)))
}

/// Counts the parameters declared by a method signature (or descriptor),
/// skipping any leading type-parameter block.
pub fn count_method_parameters(signature: &str) -> Result<usize> {
    let c = skip_type_parameters(Cursor::new(signature))?;
    let mut c = c.expect(b'(')?;
    let mut count = 0;
    while c.peek() != Some(b')') {
        c = skip_type(c)?;
        count += 1;
    }
    Ok(count)
}
