use serde::{Deserialize, Serialize};

use crate::interner::{TypeId, TypeInterner};

/// One node of a parsed generic signature.
///
/// Every node carries exactly one raw (erased) type identity. Plain class
/// types and primitives are stored as [`TypeSignature::Raw`]; a
/// [`TypeSignature::Class`] node only exists when the type has type
/// arguments or takes part in an inner-type chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeSignature {
    Raw(TypeId),
    /// A reference to a type parameter; `raw_type` is its erasure.
    Variable { raw_type: TypeId, identifier: String },
    Array {
        raw_type: TypeId,
        element: Box<TypeSignature>,
    },
    Class {
        raw_type: TypeId,
        arguments: Vec<TypeArgument>,
        /// The enclosing generic type for `Outer<..>.Inner` forms.
        outer: Option<Box<TypeSignature>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Wildcard {
    /// An exact (invariant) argument.
    #[default]
    None,
    /// `+T`
    Extends,
    /// `-T`
    Super,
    /// `*`
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeArgument {
    pub wildcard: Wildcard,
    /// `None` only for [`Wildcard::Unbounded`].
    pub ty: Option<TypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParameter {
    pub identifier: String,
    pub bounds: Vec<TypeSignature>,
    /// `false` when the parameter declares only interface bounds (`T::Ljava/lang/Runnable;`).
    pub first_bound_is_class: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub superclass: TypeSignature,
    pub interfaces: Vec<TypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    /// Parameters declared by the signature; compiler-defined leading
    /// parameters that only appear in the descriptor are not included.
    pub parameters: Vec<TypeSignature>,
    /// `None` for `V`.
    pub return_type: Option<TypeSignature>,
    /// Only the `^`-prefixed throws clauses of the signature.
    pub exceptions: Vec<TypeSignature>,
}

impl TypeSignature {
    pub fn raw_type(&self) -> TypeId {
        match self {
            TypeSignature::Raw(id) => *id,
            TypeSignature::Variable { raw_type, .. }
            | TypeSignature::Array { raw_type, .. }
            | TypeSignature::Class { raw_type, .. } => *raw_type,
        }
    }

    pub fn to_signature_string(&self, interner: &TypeInterner) -> String {
        let mut out = String::new();
        self.write(interner, &mut out);
        out
    }

    pub fn write(&self, interner: &TypeInterner, out: &mut String) {
        match self {
            TypeSignature::Raw(id) => out.push_str(interner.resolve(*id)),
            TypeSignature::Variable { identifier, .. } => {
                out.push('T');
                out.push_str(identifier);
                out.push(';');
            }
            TypeSignature::Array { element, .. } => {
                out.push('[');
                element.write(interner, out);
            }
            TypeSignature::Class { .. } => {
                self.write_class_without_semicolon(interner, out);
                out.push(';');
            }
        }
    }

    fn write_class_without_semicolon(&self, interner: &TypeInterner, out: &mut String) {
        let raw = interner.resolve(self.raw_type());
        let raw = raw.strip_suffix(';').unwrap_or(raw);
        let TypeSignature::Class {
            arguments, outer, ..
        } = self
        else {
            out.push_str(raw);
            return;
        };

        match outer {
            Some(outer) => {
                let outer_raw = interner.resolve(outer.raw_type());
                outer.write_class_without_semicolon(interner, out);
                out.push('.');
                // `Lp/Outer;` + `Inner` was interned as `Lp/Outer$Inner;`.
                out.push_str(raw.get(outer_raw.len()..).unwrap_or(raw));
            }
            None => out.push_str(raw),
        }

        if !arguments.is_empty() {
            out.push('<');
            for argument in arguments {
                argument.write(interner, out);
            }
            out.push('>');
        }
    }
}

impl TypeArgument {
    pub fn write(&self, interner: &TypeInterner, out: &mut String) {
        match self.wildcard {
            Wildcard::None => {}
            Wildcard::Extends => out.push('+'),
            Wildcard::Super => out.push('-'),
            Wildcard::Unbounded => {
                out.push('*');
                return;
            }
        }
        if let Some(ty) = &self.ty {
            ty.write(interner, out);
        }
    }
}

impl TypeParameter {
    pub fn write(&self, interner: &TypeInterner, out: &mut String) {
        out.push_str(&self.identifier);
        let mut bounds = self.bounds.iter();
        out.push(':');
        if self.first_bound_is_class {
            if let Some(bound) = bounds.next() {
                bound.write(interner, out);
            }
        }
        for bound in bounds {
            out.push(':');
            bound.write(interner, out);
        }
    }
}

fn write_type_parameters(params: &[TypeParameter], interner: &TypeInterner, out: &mut String) {
    if params.is_empty() {
        return;
    }
    out.push('<');
    for param in params {
        param.write(interner, out);
    }
    out.push('>');
}

impl ClassSignature {
    pub fn to_signature_string(&self, interner: &TypeInterner) -> String {
        let mut out = String::new();
        write_type_parameters(&self.type_parameters, interner, &mut out);
        self.superclass.write(interner, &mut out);
        for interface in &self.interfaces {
            interface.write(interner, &mut out);
        }
        out
    }
}

impl MethodSignature {
    pub fn to_signature_string(&self, interner: &TypeInterner) -> String {
        let mut out = String::new();
        write_type_parameters(&self.type_parameters, interner, &mut out);
        out.push('(');
        for param in &self.parameters {
            param.write(interner, &mut out);
        }
        out.push(')');
        match &self.return_type {
            Some(ty) => ty.write(interner, &mut out),
            None => out.push('V'),
        }
        for exception in &self.exceptions {
            out.push('^');
            exception.write(interner, &mut out);
        }
        out
    }
}
