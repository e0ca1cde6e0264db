//! The persistent type index and the class-to-index converter.
//!
//! [`IndexConverter`] writes one decoded class into an [`IndexStore`];
//! [`IndexBinaryType`] reads a stored type back as a
//! [`BinaryType`](jindex_classfile::BinaryType), and [`check_type`] compares
//! the two views.

#![forbid(unsafe_code)]

mod converter;
mod error;
mod records;
mod rehydrate;
mod store;
mod verify;

pub use crate::converter::IndexConverter;
pub use crate::error::{IndexError, Result};
pub use crate::records::{
    method_flags, type_flags, variable_flags, IndexAnnotation, IndexConstant, IndexMethod,
    IndexMethodRef, IndexParameter, IndexType, IndexTypeAnnotation, IndexVariable, ResourceFile,
    ResourceId,
};
pub use crate::rehydrate::{IndexBinaryField, IndexBinaryMethod, IndexBinaryType};
pub use crate::store::{IndexStore, JavaIndex};
pub use crate::verify::{assert_type_consistent, check_type, Mismatch};
