//! Recursive-descent parser for JVM generic signatures.
//!
//! Every production takes a [`Cursor`] by value and returns the parsed node
//! together with the cursor positioned just past it.

use crate::cursor::Cursor;
use crate::error::Result;
use crate::interner::TypeInterner;
use crate::scan::split_method_descriptor;
use crate::types::{
    ClassSignature, MethodSignature, TypeArgument, TypeParameter, TypeSignature, Wildcard,
};

pub(crate) const JAVA_LANG_OBJECT: &str = "Ljava/lang/Object;";

/// Parses a field signature (or a plain field descriptor).
///
/// `descriptor` is the field's erased descriptor, used as the raw type of a
/// top-level type variable (`TT;` declared as `Ljava/lang/Number;`).
pub fn parse_field_signature(
    signature: &str,
    descriptor: &str,
    interner: &mut TypeInterner,
) -> Result<TypeSignature> {
    let start = Cursor::new(signature);
    let (ty, end) = type_signature(start, Some(descriptor), interner)?;
    let ty = ty.ok_or_else(|| start.error("field type cannot be void"))?;
    end.ensure_end()?;
    Ok(ty)
}

/// Parses `<type parameters> superclass interface*`.
pub fn parse_class_signature(
    signature: &str,
    interner: &mut TypeInterner,
) -> Result<ClassSignature> {
    let (type_parameters, c) = type_parameters(Cursor::new(signature), interner)?;
    let (superclass, mut c) = class_type(c, interner)?;
    let mut interfaces = Vec::new();
    while !c.at_end() {
        let (interface, next) = class_type(c, interner)?;
        interfaces.push(interface);
        c = next;
    }
    Ok(ClassSignature {
        type_parameters,
        superclass,
        interfaces,
    })
}

/// Parses `<type parameters> ( params ) return ^throws*`.
///
/// Signature parameter `i` is erased against descriptor parameter
/// `i + compiler_defined`; the leading compiler-defined parameters exist only
/// in the descriptor. `exception_descriptors` erase `^TX;` throws clauses in
/// order.
pub fn parse_method_signature(
    signature: &str,
    descriptor: &str,
    compiler_defined: usize,
    exception_descriptors: &[String],
    interner: &mut TypeInterner,
) -> Result<MethodSignature> {
    let (param_descriptors, return_descriptor) = split_method_descriptor(descriptor)?;

    let (type_parameters, c) = type_parameters(Cursor::new(signature), interner)?;
    let mut c = c.expect(b'(')?;
    let mut parameters = Vec::new();
    while c.peek() != Some(b')') {
        let erasure = param_descriptors
            .get(compiler_defined + parameters.len())
            .copied();
        let (ty, next) = type_signature(c, erasure, interner)?;
        let ty = ty.ok_or_else(|| c.error("parameter type cannot be void"))?;
        parameters.push(ty);
        c = next;
    }
    c = c.bump();

    let (return_type, mut c) = type_signature(c, Some(return_descriptor), interner)?;

    let mut exceptions = Vec::new();
    while c.peek() == Some(b'^') {
        let erasure = exception_descriptors
            .get(exceptions.len())
            .map(String::as_str);
        let after_caret = c.bump();
        if !matches!(after_caret.peek(), Some(b'L' | b'T')) {
            return Err(after_caret.error("expected class type or type variable after `^`"));
        }
        let (ty, next) = type_signature(after_caret, erasure, interner)?;
        if let Some(ty) = ty {
            exceptions.push(ty);
        }
        c = next;
    }
    c.ensure_end()?;

    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
        exceptions,
    })
}

/// Parses one type. `V` yields `None`.
pub(crate) fn type_signature<'a>(
    c: Cursor<'a>,
    erasure: Option<&str>,
    interner: &mut TypeInterner,
) -> Result<(Option<TypeSignature>, Cursor<'a>)> {
    match c.peek() {
        None => Err(c.error("expected type signature, found end of input")),
        Some(b'T') => {
            // The closing `;` of a type variable is optional.
            let (identifier, next) = c.bump().identifier(b";")?;
            let next = next.skip(b';');
            let raw_type = interner.intern(erasure.unwrap_or(JAVA_LANG_OBJECT));
            Ok((
                Some(TypeSignature::Variable {
                    raw_type,
                    identifier: identifier.to_string(),
                }),
                next,
            ))
        }
        Some(b'[') => {
            let nested = erasure.and_then(|desc| desc.strip_prefix('['));
            let (element, next) = type_signature(c.bump(), nested, interner)?;
            let element = element.ok_or_else(|| c.bump().error("array element cannot be void"))?;
            let descriptor = format!("[{}", interner.resolve(element.raw_type()));
            let raw_type = interner.intern(&descriptor);
            Ok((
                Some(TypeSignature::Array {
                    raw_type,
                    element: Box::new(element),
                }),
                next,
            ))
        }
        Some(b'V') => Ok((None, c.bump())),
        Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') => {
            let next = c.bump();
            let raw_type = interner.intern(next.slice_from(c));
            Ok((Some(TypeSignature::Raw(raw_type)), next))
        }
        Some(b'L') => {
            let (ty, next) = class_type_signature(c.bump(), None, interner)?;
            Ok((Some(ty), next))
        }
        Some(b'+' | b'-' | b'*') => Err(c.error("unexpected wildcard outside a type-argument list")),
        Some(_) => Err(c.error("unexpected character at start of type signature")),
    }
}

fn class_type<'a>(c: Cursor<'a>, interner: &mut TypeInterner) -> Result<(TypeSignature, Cursor<'a>)> {
    let c = c.expect(b'L')?;
    class_type_signature(c, None, interner)
}

/// A type-argument, type-parameter bound or throws target: a class type,
/// type variable or array. Type variables erase to `java/lang/Object`.
fn reference_type<'a>(
    c: Cursor<'a>,
    interner: &mut TypeInterner,
) -> Result<(TypeSignature, Cursor<'a>)> {
    if !matches!(c.peek(), Some(b'L' | b'T' | b'[')) {
        return Err(c.error("expected reference type"));
    }
    match type_signature(c, None, interner)? {
        (Some(ty), next) => Ok((ty, next)),
        (None, _) => Err(c.error("expected reference type")),
    }
}

/// Parses the remainder of `L...;` after the `L` (or after the `.` of an
/// inner type, in which case `outer` is the enclosing type).
fn class_type_signature<'a>(
    c: Cursor<'a>,
    outer: Option<TypeSignature>,
    interner: &mut TypeInterner,
) -> Result<(TypeSignature, Cursor<'a>)> {
    let (identifier, mut c) = c.identifier(b"<;.")?;
    let descriptor = match &outer {
        Some(outer) => {
            let outer_raw = interner.resolve(outer.raw_type());
            let outer_raw = outer_raw.strip_suffix(';').unwrap_or(outer_raw);
            format!("{outer_raw}${identifier};")
        }
        None => format!("L{identifier};"),
    };
    let raw_type = interner.intern(&descriptor);

    let has_arguments = c.peek() == Some(b'<');
    if !has_arguments && outer.is_none() && c.peek() != Some(b'.') {
        let c = c.expect(b';')?;
        return Ok((TypeSignature::Raw(raw_type), c));
    }

    let mut arguments = Vec::new();
    if has_arguments {
        c = c.bump();
        while c.peek() != Some(b'>') {
            let (argument, next) = type_argument(c, interner)?;
            arguments.push(argument);
            c = next;
        }
        if arguments.is_empty() {
            return Err(c.error("empty type-argument list"));
        }
        c = c.bump();
    }

    let node = TypeSignature::Class {
        raw_type,
        arguments,
        outer: outer.map(Box::new),
    };
    if c.peek() == Some(b'.') {
        return class_type_signature(c.bump(), Some(node), interner);
    }
    let c = c.expect(b';')?;
    Ok((node, c))
}

fn type_argument<'a>(
    c: Cursor<'a>,
    interner: &mut TypeInterner,
) -> Result<(TypeArgument, Cursor<'a>)> {
    let (wildcard, c) = match c.peek() {
        Some(b'*') => {
            return Ok((
                TypeArgument {
                    wildcard: Wildcard::Unbounded,
                    ty: None,
                },
                c.bump(),
            ))
        }
        Some(b'+') => (Wildcard::Extends, c.bump()),
        Some(b'-') => (Wildcard::Super, c.bump()),
        _ => (Wildcard::None, c),
    };
    let (ty, c) = reference_type(c, interner)?;
    Ok((
        TypeArgument {
            wildcard,
            ty: Some(ty),
        },
        c,
    ))
}

/// Parses an optional `<T:bound:bound U::bound>` block.
pub(crate) fn type_parameters<'a>(
    c: Cursor<'a>,
    interner: &mut TypeInterner,
) -> Result<(Vec<TypeParameter>, Cursor<'a>)> {
    if c.peek() != Some(b'<') {
        return Ok((Vec::new(), c));
    }
    let mut c = c.bump();
    let mut params = Vec::new();
    while c.peek() != Some(b'>') {
        let (identifier, next) = c.identifier(b":>")?;
        let mut next = next.expect(b':')?;

        let mut bounds = Vec::new();
        let first_bound_is_class = next.peek() != Some(b':');
        if first_bound_is_class {
            let (bound, after) = reference_type(next, interner)?;
            bounds.push(bound);
            next = after;
        }
        while next.peek() == Some(b':') {
            let (bound, after) = reference_type(next.bump(), interner)?;
            bounds.push(bound);
            next = after;
        }

        params.push(TypeParameter {
            identifier: identifier.to_string(),
            bounds,
            first_bound_is_class,
        });
        c = next;
    }
    if params.is_empty() {
        return Err(c.error("empty type-parameter list"));
    }
    Ok((params, c.bump()))
}
