//! Parser for the compact JVM generic-signature grammar.
//!
//! Raw (erased) type identities are interned in a [`TypeInterner`]; parsed
//! trees reference them by [`TypeId`] and can be written back to the grammar
//! with `to_signature_string`.

#![forbid(unsafe_code)]

mod cursor;
mod defaults;
mod error;
mod interner;
mod parser;
mod scan;
mod types;

pub use crate::defaults::{
    compiler_defined_parameter_count, default_class_signature, default_method_signature,
};
pub use crate::error::{Result, SignatureError};
pub use crate::interner::{TypeId, TypeInterner};
pub use crate::parser::{parse_class_signature, parse_field_signature, parse_method_signature};
pub use crate::scan::{count_method_parameters, split_method_descriptor};
pub use crate::types::{
    ClassSignature, MethodSignature, TypeArgument, TypeParameter, TypeSignature, Wildcard,
};
