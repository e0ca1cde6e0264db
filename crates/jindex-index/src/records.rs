//! Persistent records of the index graph.

use std::fmt;
use std::path::PathBuf;

use jindex_cache::FileFingerprint;
use jindex_classfile::{TargetInfo, TargetType, TypePathEntry};
use jindex_signature::{TypeId, TypeParameter, TypeSignature};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One indexed container (archive, class folder or loose class file).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFile {
    pub location: PathBuf,
    pub fingerprint: FileFingerprint,
    pub time_last_used_ms: u64,
    /// Logical workspace handles that currently resolve to this location.
    pub workspace_paths: Vec<String>,
    /// Highest class-file major version seen while indexing.
    pub jdk_level: u16,
    pub manifest: Option<String>,
    /// Set when the archive could not be opened; such a resource holds no types.
    pub corrupt: bool,
    /// Archive entries that are not class files, in archive order.
    pub non_class_entries: Vec<String>,
}

impl ResourceFile {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }
}

pub mod type_flags {
    pub const GENERIC_SIGNATURE_PRESENT: u8 = 1 << 0;
    /// The class file names no superclass (`java/lang/Object`, `module-info`).
    pub const NO_SUPERCLASS: u8 = 1 << 1;
}

pub mod method_flags {
    pub const HAS_GENERIC_SIGNATURE: u8 = 1 << 0;
    pub const HAS_THROWS_SIGNATURE: u8 = 1 << 1;
}

pub mod variable_flags {
    pub const GENERIC_SIGNATURE_PRESENT: u8 = 1 << 0;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMethodRef {
    pub name: String,
    pub descriptor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexType {
    pub type_id: TypeId,
    pub resource: ResourceId,
    /// The class's own descriptor when it differs from `type_id` (a class file
    /// that was moved away from its package directory).
    pub field_descriptor_from_class: Option<String>,
    pub flags: u8,
    pub modifiers: u16,
    pub declaring_type: Option<TypeId>,
    pub declaring_method: Option<IndexMethodRef>,
    pub type_parameters: Vec<TypeParameter>,
    /// `java/lang/Object` when [`type_flags::NO_SUPERCLASS`] is set.
    pub superclass: TypeSignature,
    pub interfaces: Vec<TypeSignature>,
    pub annotations: Vec<IndexAnnotation>,
    pub type_annotations: Vec<IndexTypeAnnotation>,
    pub variables: Vec<IndexVariable>,
    /// Sorted by selector followed by descriptor.
    pub methods: Vec<IndexMethod>,
    /// Comma-separated internal names.
    pub missing_type_names: Option<String>,
    pub source_file_name: Option<String>,
    pub is_anonymous: bool,
    pub is_local: bool,
    pub is_member: bool,
    pub tag_bits: u64,
    pub source_name_override: String,
}

impl IndexType {
    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMethod {
    pub selector: String,
    pub descriptor: String,
    /// Position of the method in the class file's method table.
    pub declaration_position: u32,
    pub modifiers: u16,
    pub tag_bits: u64,
    pub flags: u8,
    pub type_parameters: Vec<TypeParameter>,
    /// Compiler-defined parameters first, then the declared ones.
    pub parameters: Vec<IndexParameter>,
    /// Number of entries in the class file's parameter-annotation table.
    pub annotated_parameter_count: u32,
    /// `None` for `void`.
    pub return_type: Option<TypeSignature>,
    pub exceptions: Vec<TypeSignature>,
    pub default_value: Option<IndexConstant>,
    pub annotations: Vec<IndexAnnotation>,
    pub type_annotations: Vec<IndexTypeAnnotation>,
}

impl IndexMethod {
    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    pub fn compiler_defined_parameter_count(&self) -> usize {
        self.parameters
            .iter()
            .take_while(|param| param.compiler_defined)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexParameter {
    pub ty: TypeSignature,
    pub compiler_defined: bool,
    pub name: Option<String>,
    pub annotations: Vec<IndexAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexVariable {
    pub name: String,
    pub ty: TypeSignature,
    pub flags: u8,
    pub modifiers: u16,
    pub tag_bits: u64,
    pub constant: Option<IndexConstant>,
    pub annotations: Vec<IndexAnnotation>,
    pub type_annotations: Vec<IndexTypeAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexAnnotation {
    /// Field descriptor of the annotation type.
    pub type_id: TypeId,
    pub value_pairs: Vec<(String, IndexConstant)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexTypeAnnotation {
    pub target_type: TargetType,
    pub target_info: TargetInfo,
    pub path: Vec<TypePathEntry>,
    pub annotation: IndexAnnotation,
}

/// A constant value: a field initializer, an annotation element or an
/// annotation default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IndexConstant {
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    /// A class literal; the id is the literal's descriptor (`I`, `Ljava/lang/String;`).
    Class(TypeId),
    Enum { type_id: TypeId, name: String },
    Annotation(Box<IndexAnnotation>),
    Array(Vec<IndexConstant>),
}
