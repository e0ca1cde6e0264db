//! `type_annotation` structures (JVMS 4.7.20).
//!
//! Each target type maps to exactly one `target_info` shape; decoding matches
//! on [`TargetType`] so a new target type cannot be added without deciding its
//! shape.

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::attribute::AttributeRecord;
use crate::constant_pool::ConstantPoolResolver;
use crate::error::{ClassFormatError, Result};
use crate::reader::Reader;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    ClassTypeParameter,
    MethodTypeParameter,
    ClassExtends,
    ClassTypeParameterBound,
    MethodTypeParameterBound,
    #[default]
    Field,
    MethodReturn,
    MethodReceiver,
    MethodFormalParameter,
    Throws,
    LocalVariable,
    ResourceVariable,
    ExceptionParameter,
    Instanceof,
    New,
    ConstructorReference,
    MethodReference,
    Cast,
    ConstructorInvocationTypeArgument,
    MethodInvocationTypeArgument,
    ConstructorReferenceTypeArgument,
    MethodReferenceTypeArgument,
}

impl TargetType {
    pub fn from_tag(tag: u8) -> Result<Self> {
        let target = match tag {
            0x00 => TargetType::ClassTypeParameter,
            0x01 => TargetType::MethodTypeParameter,
            0x10 => TargetType::ClassExtends,
            0x11 => TargetType::ClassTypeParameterBound,
            0x12 => TargetType::MethodTypeParameterBound,
            0x13 => TargetType::Field,
            0x14 => TargetType::MethodReturn,
            0x15 => TargetType::MethodReceiver,
            0x16 => TargetType::MethodFormalParameter,
            0x17 => TargetType::Throws,
            0x40 => TargetType::LocalVariable,
            0x41 => TargetType::ResourceVariable,
            0x42 => TargetType::ExceptionParameter,
            0x43 => TargetType::Instanceof,
            0x44 => TargetType::New,
            0x45 => TargetType::ConstructorReference,
            0x46 => TargetType::MethodReference,
            0x47 => TargetType::Cast,
            0x48 => TargetType::ConstructorInvocationTypeArgument,
            0x49 => TargetType::MethodInvocationTypeArgument,
            0x4A => TargetType::ConstructorReferenceTypeArgument,
            0x4B => TargetType::MethodReferenceTypeArgument,
            other => return Err(ClassFormatError::UnknownTargetType(other)),
        };
        Ok(target)
    }

    pub fn tag(self) -> u8 {
        match self {
            TargetType::ClassTypeParameter => 0x00,
            TargetType::MethodTypeParameter => 0x01,
            TargetType::ClassExtends => 0x10,
            TargetType::ClassTypeParameterBound => 0x11,
            TargetType::MethodTypeParameterBound => 0x12,
            TargetType::Field => 0x13,
            TargetType::MethodReturn => 0x14,
            TargetType::MethodReceiver => 0x15,
            TargetType::MethodFormalParameter => 0x16,
            TargetType::Throws => 0x17,
            TargetType::LocalVariable => 0x40,
            TargetType::ResourceVariable => 0x41,
            TargetType::ExceptionParameter => 0x42,
            TargetType::Instanceof => 0x43,
            TargetType::New => 0x44,
            TargetType::ConstructorReference => 0x45,
            TargetType::MethodReference => 0x46,
            TargetType::Cast => 0x47,
            TargetType::ConstructorInvocationTypeArgument => 0x48,
            TargetType::MethodInvocationTypeArgument => 0x49,
            TargetType::ConstructorReferenceTypeArgument => 0x4A,
            TargetType::MethodReferenceTypeArgument => 0x4B,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetInfo {
    TypeParameter {
        index: u8,
    },
    Supertype {
        index: u16,
    },
    TypeParameterBound {
        type_parameter_index: u8,
        bound_index: u8,
    },
    /// Field, return and receiver targets carry no payload.
    #[default]
    Empty,
    FormalParameter {
        index: u8,
    },
    Throws {
        type_index: u16,
    },
    LocalVariable {
        table: Vec<LocalVariableTarget>,
    },
    Catch {
        exception_table_index: u16,
    },
    Offset {
        offset: u16,
    },
    TypeArgument {
        offset: u16,
        type_argument_index: u8,
    },
}

impl TargetInfo {
    fn read(target_type: TargetType, reader: &mut Reader<'_>) -> Result<Self> {
        let info = match target_type {
            TargetType::ClassTypeParameter | TargetType::MethodTypeParameter => {
                TargetInfo::TypeParameter {
                    index: reader.read_u1()?,
                }
            }
            TargetType::ClassExtends => TargetInfo::Supertype {
                index: reader.read_u2()?,
            },
            TargetType::ClassTypeParameterBound | TargetType::MethodTypeParameterBound => {
                TargetInfo::TypeParameterBound {
                    type_parameter_index: reader.read_u1()?,
                    bound_index: reader.read_u1()?,
                }
            }
            TargetType::Field | TargetType::MethodReturn | TargetType::MethodReceiver => {
                TargetInfo::Empty
            }
            TargetType::MethodFormalParameter => TargetInfo::FormalParameter {
                index: reader.read_u1()?,
            },
            TargetType::Throws => TargetInfo::Throws {
                type_index: reader.read_u2()?,
            },
            TargetType::LocalVariable | TargetType::ResourceVariable => {
                let len = reader.read_u2()? as usize;
                let mut table = Vec::with_capacity(len);
                for _ in 0..len {
                    table.push(LocalVariableTarget {
                        start_pc: reader.read_u2()?,
                        length: reader.read_u2()?,
                        index: reader.read_u2()?,
                    });
                }
                TargetInfo::LocalVariable { table }
            }
            TargetType::ExceptionParameter => TargetInfo::Catch {
                exception_table_index: reader.read_u2()?,
            },
            TargetType::Instanceof
            | TargetType::New
            | TargetType::ConstructorReference
            | TargetType::MethodReference => TargetInfo::Offset {
                offset: reader.read_u2()?,
            },
            TargetType::Cast
            | TargetType::ConstructorInvocationTypeArgument
            | TargetType::MethodInvocationTypeArgument
            | TargetType::ConstructorReferenceTypeArgument
            | TargetType::MethodReferenceTypeArgument => TargetInfo::TypeArgument {
                offset: reader.read_u2()?,
                type_argument_index: reader.read_u1()?,
            },
        };
        Ok(info)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalVariableTarget {
    pub start_pc: u16,
    pub length: u16,
    pub index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypePathKind {
    /// Deeper in an array type.
    Array,
    /// Deeper in a nested type.
    Nested,
    /// On the bound of a wildcard type argument.
    Wildcard,
    /// On a type argument of a parameterized type.
    TypeArgument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypePathEntry {
    pub kind: TypePathKind,
    pub type_argument_index: u8,
}

impl TypePathEntry {
    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let kind = match reader.read_u1()? {
            0 => TypePathKind::Array,
            1 => TypePathKind::Nested,
            2 => TypePathKind::Wildcard,
            3 => TypePathKind::TypeArgument,
            other => return Err(ClassFormatError::InvalidTypePathKind(other)),
        };
        Ok(Self {
            kind,
            type_argument_index: reader.read_u1()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeAnnotation {
    pub target_type: TargetType,
    pub target_info: TargetInfo,
    pub type_path: Vec<TypePathEntry>,
    pub annotation: Annotation,
}

impl AttributeRecord for TypeAnnotation {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let target_type = TargetType::from_tag(reader.read_u1()?)?;
        let target_info = TargetInfo::read(target_type, reader)?;
        let path_length = reader.read_u1()? as usize;
        let mut type_path = Vec::with_capacity(path_length);
        for _ in 0..path_length {
            type_path.push(TypePathEntry::read(reader)?);
        }
        let annotation = Annotation::read(reader, cp)?;
        Ok(Self {
            target_type,
            target_info,
            type_path,
            annotation,
        })
    }
}
