//! The read-only view of a compiled type consumed by the indexer.
//!
//! [`ClassFile`] implements it directly from decoded bytes; the index crate
//! implements it again for types rehydrated from the store, which is what lets
//! the two be compared field by field.

use crate::annotation::{Annotation, ConstValue, ElementValue};
use crate::attribute::MethodRef;
use crate::classfile::{access_flags, ClassFile, FieldInfo, MethodInfo};
use crate::type_annotation::TypeAnnotation;

pub mod tag_bits {
    pub const DEPRECATED: u64 = 1 << 0;
    pub const SYNTHETIC: u64 = 1 << 1;
    pub const HAS_MISSING_TYPES: u64 = 1 << 2;
}

pub trait BinaryType {
    type Field: BinaryField;
    type Method: BinaryMethod;

    /// Internal name, e.g. `java/util/Map$Entry`.
    fn name(&self) -> &str;
    /// Access flags; for a member type these come from its `InnerClasses` entry.
    fn modifiers(&self) -> u16;
    fn superclass_name(&self) -> Option<&str>;
    fn interface_names(&self) -> &[String];
    fn generic_signature(&self) -> Option<&str>;
    fn enclosing_type_name(&self) -> Option<&str>;
    fn enclosing_method(&self) -> Option<&MethodRef>;
    fn source_file_name(&self) -> Option<&str>;
    /// Simple name as written in source; empty for anonymous types.
    fn source_name(&self) -> &str;
    fn is_member(&self) -> bool;
    fn is_local(&self) -> bool;
    fn is_anonymous(&self) -> bool;
    fn tag_bits(&self) -> u64;
    /// Internal names of types the compiler could not resolve.
    fn missing_type_names(&self) -> &[String];
    fn annotations(&self) -> &[Annotation];
    fn type_annotations(&self) -> &[TypeAnnotation];
    fn fields(&self) -> &[Self::Field];
    fn methods(&self) -> &[Self::Method];
}

pub trait BinaryField {
    fn name(&self) -> &str;
    fn descriptor(&self) -> &str;
    fn modifiers(&self) -> u16;
    fn generic_signature(&self) -> Option<&str>;
    fn constant(&self) -> Option<&ConstValue>;
    fn annotations(&self) -> &[Annotation];
    fn type_annotations(&self) -> &[TypeAnnotation];
    fn tag_bits(&self) -> u64;
}

pub trait BinaryMethod {
    fn selector(&self) -> &str;
    fn descriptor(&self) -> &str;
    fn modifiers(&self) -> u16;
    fn generic_signature(&self) -> Option<&str>;
    /// Names of the source-level parameters, excluding compiler-defined ones.
    fn argument_names(&self) -> Vec<&str>;
    fn annotations(&self) -> &[Annotation];
    fn parameter_annotations(&self) -> &[Vec<Annotation>];
    fn type_annotations(&self) -> &[TypeAnnotation];
    fn default_value(&self) -> Option<&ElementValue>;
    fn exception_names(&self) -> &[String];
    fn tag_bits(&self) -> u64;

    fn is_constructor(&self) -> bool {
        self.selector() == "<init>"
    }
}

fn member_tag_bits(deprecated: bool, synthetic: bool, flags: u16) -> u64 {
    let mut bits = 0;
    if deprecated {
        bits |= tag_bits::DEPRECATED;
    }
    if synthetic || flags & access_flags::ACC_SYNTHETIC != 0 {
        bits |= tag_bits::SYNTHETIC;
    }
    bits
}

impl BinaryType for ClassFile {
    type Field = FieldInfo;
    type Method = MethodInfo;

    fn name(&self) -> &str {
        &self.this_class
    }

    fn modifiers(&self) -> u16 {
        match self.own_inner_class_entry() {
            Some(entry) => entry.access_flags,
            None => self.access_flags,
        }
    }

    fn superclass_name(&self) -> Option<&str> {
        self.super_class.as_deref()
    }

    fn interface_names(&self) -> &[String] {
        &self.interfaces
    }

    fn generic_signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    fn enclosing_type_name(&self) -> Option<&str> {
        if let Some(outer) = self
            .own_inner_class_entry()
            .and_then(|entry| entry.outer_class.as_deref())
        {
            return Some(outer);
        }
        self.enclosing_method.as_ref().map(|em| em.class.as_str())
    }

    fn enclosing_method(&self) -> Option<&MethodRef> {
        self.enclosing_method
            .as_ref()
            .and_then(|em| em.method.as_ref())
    }

    fn source_file_name(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    fn source_name(&self) -> &str {
        match self.own_inner_class_entry() {
            Some(entry) => entry.inner_name.as_deref().unwrap_or(""),
            None => self
                .this_class
                .rsplit_once('/')
                .map_or(self.this_class.as_str(), |(_, simple)| simple),
        }
    }

    fn is_member(&self) -> bool {
        self.own_inner_class_entry()
            .is_some_and(|entry| entry.outer_class.is_some())
    }

    fn is_local(&self) -> bool {
        self.own_inner_class_entry()
            .is_some_and(|entry| entry.outer_class.is_none() && entry.inner_name.is_some())
    }

    fn is_anonymous(&self) -> bool {
        self.own_inner_class_entry()
            .is_some_and(|entry| entry.inner_name.is_none())
    }

    fn tag_bits(&self) -> u64 {
        let mut bits = member_tag_bits(self.deprecated, self.synthetic, self.access_flags);
        if !self.missing_types.is_empty() {
            bits |= tag_bits::HAS_MISSING_TYPES;
        }
        bits
    }

    fn missing_type_names(&self) -> &[String] {
        &self.missing_types
    }

    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn type_annotations(&self) -> &[TypeAnnotation] {
        &self.type_annotations
    }

    fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }
}

impl BinaryField for FieldInfo {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn modifiers(&self) -> u16 {
        self.access_flags
    }

    fn generic_signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    fn constant(&self) -> Option<&ConstValue> {
        self.constant.as_ref()
    }

    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn type_annotations(&self) -> &[TypeAnnotation] {
        &self.type_annotations
    }

    fn tag_bits(&self) -> u64 {
        member_tag_bits(self.deprecated, self.synthetic, self.access_flags)
    }
}

impl BinaryMethod for MethodInfo {
    fn selector(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn modifiers(&self) -> u16 {
        self.access_flags
    }

    fn generic_signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    fn argument_names(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| {
                p.access_flags & (access_flags::ACC_SYNTHETIC | access_flags::ACC_MANDATED) == 0
            })
            .filter_map(|p| p.name.as_deref())
            .collect()
    }

    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn parameter_annotations(&self) -> &[Vec<Annotation>] {
        &self.parameter_annotations
    }

    fn type_annotations(&self) -> &[TypeAnnotation] {
        &self.type_annotations
    }

    fn default_value(&self) -> Option<&ElementValue> {
        self.default_value.as_ref()
    }

    fn exception_names(&self) -> &[String] {
        &self.exceptions
    }

    fn tag_bits(&self) -> u64 {
        member_tag_bits(self.deprecated, self.synthetic, self.access_flags)
    }
}
