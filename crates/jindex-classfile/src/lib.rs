//! Bit-exact decoding of JVM class files.
//!
//! Every decoder reads from an immutable byte slice through a [`Reader`] and
//! resolves constant-pool references through a [`ConstantPoolResolver`]. Bad
//! input is always reported as a [`ClassFormatError`].

#![forbid(unsafe_code)]

mod annotation;
mod attribute;
mod binary;
mod classfile;
mod constant_pool;
mod descriptor;
mod error;
mod reader;
mod stack_map;
mod type_annotation;

pub use crate::annotation::{descriptor_to_internal_name, Annotation, ConstValue, ElementValue};
pub use crate::attribute::{
    Annotations, Attribute, AttributeRecord, Code, EnclosingMethod, ExceptionTableEntry,
    Exceptions, InnerClassEntry, InnerClasses, LocalVariableTypeEntry, LocalVariableTypeTable,
    MethodParameter, MethodParameters, MethodRef, MissingTypes, ParameterAnnotations,
    PermittedSubclasses, SourceFile, TypeAnnotations,
};
pub use crate::binary::{tag_bits, BinaryField, BinaryMethod, BinaryType};
pub use crate::classfile::{access_flags, ClassFile, FieldInfo, MethodInfo};
pub use crate::constant_pool::{ConstantPool, ConstantPoolResolver, CpInfo};
pub use crate::descriptor::{
    internal_name_to_descriptor, parse_field_descriptor, parse_method_descriptor,
    split_method_descriptor, BaseType, FieldType, MethodDescriptor, ReturnType,
};
pub use crate::error::{ClassFormatError, Result};
pub use crate::reader::Reader;
pub use crate::stack_map::{StackMapFrame, StackMapTable, VerificationType};
pub use crate::type_annotation::{
    LocalVariableTarget, TargetInfo, TargetType, TypeAnnotation, TypePathEntry, TypePathKind,
};
