//! Reconstructs a [`BinaryType`] view from stored records.
//!
//! Generic signatures are regenerated by writing the stored signature trees
//! back to the grammar, so a faithful conversion reproduces what the class
//! file declared.

use jindex_classfile::{
    descriptor_to_internal_name, Annotation, BinaryField, BinaryMethod, BinaryType, ConstValue,
    ElementValue, MethodRef, TypeAnnotation,
};
use jindex_signature::{ClassSignature, MethodSignature, TypeInterner, TypeSignature};

use crate::records::{
    method_flags, type_flags, variable_flags, IndexAnnotation, IndexConstant, IndexMethod,
    IndexType, IndexTypeAnnotation, IndexVariable,
};

#[derive(Debug, Clone, PartialEq)]
pub struct IndexBinaryType {
    name: String,
    modifiers: u16,
    superclass_name: Option<String>,
    interface_names: Vec<String>,
    generic_signature: Option<String>,
    enclosing_type_name: Option<String>,
    enclosing_method: Option<MethodRef>,
    source_file_name: Option<String>,
    source_name: String,
    is_member: bool,
    is_local: bool,
    is_anonymous: bool,
    tag_bits: u64,
    missing_type_names: Vec<String>,
    annotations: Vec<Annotation>,
    type_annotations: Vec<TypeAnnotation>,
    fields: Vec<IndexBinaryField>,
    methods: Vec<IndexBinaryMethod>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexBinaryField {
    name: String,
    descriptor: String,
    modifiers: u16,
    generic_signature: Option<String>,
    constant: Option<ConstValue>,
    annotations: Vec<Annotation>,
    type_annotations: Vec<TypeAnnotation>,
    tag_bits: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexBinaryMethod {
    selector: String,
    descriptor: String,
    modifiers: u16,
    generic_signature: Option<String>,
    argument_names: Vec<String>,
    annotations: Vec<Annotation>,
    parameter_annotations: Vec<Vec<Annotation>>,
    type_annotations: Vec<TypeAnnotation>,
    default_value: Option<ElementValue>,
    exception_names: Vec<String>,
    tag_bits: u64,
}

/// `Lp/C;` to `p/C`; anything else (primitives, arrays) is kept as is.
fn internal_name(descriptor: &str) -> String {
    descriptor_to_internal_name(descriptor)
        .unwrap_or(descriptor)
        .to_string()
}

fn raw_internal_name(ty: &TypeSignature, interner: &TypeInterner) -> String {
    internal_name(interner.resolve(ty.raw_type()))
}

impl IndexBinaryType {
    pub fn new(record: &IndexType, interner: &TypeInterner) -> Self {
        let own_descriptor = record
            .field_descriptor_from_class
            .as_deref()
            .unwrap_or_else(|| interner.resolve(record.type_id));

        let generic_signature = record
            .has_flag(type_flags::GENERIC_SIGNATURE_PRESENT)
            .then(|| {
                ClassSignature {
                    type_parameters: record.type_parameters.clone(),
                    superclass: record.superclass.clone(),
                    interfaces: record.interfaces.clone(),
                }
                .to_signature_string(interner)
            });

        let mut methods: Vec<&IndexMethod> = record.methods.iter().collect();
        methods.sort_by_key(|method| method.declaration_position);

        Self {
            name: internal_name(own_descriptor),
            modifiers: record.modifiers,
            superclass_name: (!record.has_flag(type_flags::NO_SUPERCLASS))
                .then(|| raw_internal_name(&record.superclass, interner)),
            interface_names: record
                .interfaces
                .iter()
                .map(|ty| raw_internal_name(ty, interner))
                .collect(),
            generic_signature,
            enclosing_type_name: record
                .declaring_type
                .map(|id| internal_name(interner.resolve(id))),
            enclosing_method: record.declaring_method.as_ref().map(|method| MethodRef {
                name: method.name.clone(),
                descriptor: method.descriptor.clone(),
            }),
            source_file_name: record.source_file_name.clone(),
            source_name: record.source_name_override.clone(),
            is_member: record.is_member,
            is_local: record.is_local,
            is_anonymous: record.is_anonymous,
            tag_bits: record.tag_bits,
            missing_type_names: record
                .missing_type_names
                .as_deref()
                .map(|names| names.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            annotations: rehydrate_annotations(&record.annotations, interner),
            type_annotations: rehydrate_type_annotations(&record.type_annotations, interner),
            fields: record
                .variables
                .iter()
                .map(|variable| IndexBinaryField::new(variable, interner))
                .collect(),
            methods: methods
                .into_iter()
                .map(|method| IndexBinaryMethod::new(method, interner))
                .collect(),
        }
    }
}

impl IndexBinaryField {
    fn new(variable: &IndexVariable, interner: &TypeInterner) -> Self {
        Self {
            name: variable.name.clone(),
            descriptor: interner.resolve(variable.ty.raw_type()).to_string(),
            modifiers: variable.modifiers,
            generic_signature: (variable.flags & variable_flags::GENERIC_SIGNATURE_PRESENT != 0)
                .then(|| variable.ty.to_signature_string(interner)),
            constant: variable.constant.as_ref().and_then(rehydrate_const),
            annotations: rehydrate_annotations(&variable.annotations, interner),
            type_annotations: rehydrate_type_annotations(&variable.type_annotations, interner),
            tag_bits: variable.tag_bits,
        }
    }
}

impl IndexBinaryMethod {
    fn new(method: &IndexMethod, interner: &TypeInterner) -> Self {
        let generic_signature = method.has_flag(method_flags::HAS_GENERIC_SIGNATURE).then(|| {
            MethodSignature {
                type_parameters: method.type_parameters.clone(),
                parameters: method
                    .parameters
                    .iter()
                    .filter(|param| !param.compiler_defined)
                    .map(|param| param.ty.clone())
                    .collect(),
                return_type: method.return_type.clone(),
                exceptions: if method.has_flag(method_flags::HAS_THROWS_SIGNATURE) {
                    method.exceptions.clone()
                } else {
                    Vec::new()
                },
            }
            .to_signature_string(interner)
        });

        let mut parameter_annotations: Vec<Vec<Annotation>> = method
            .parameters
            .iter()
            .take(method.annotated_parameter_count as usize)
            .map(|param| rehydrate_annotations(&param.annotations, interner))
            .collect();
        parameter_annotations.resize(method.annotated_parameter_count as usize, Vec::new());

        Self {
            selector: method.selector.clone(),
            descriptor: method.descriptor.clone(),
            modifiers: method.modifiers,
            generic_signature,
            argument_names: method
                .parameters
                .iter()
                .filter_map(|param| param.name.clone())
                .collect(),
            annotations: rehydrate_annotations(&method.annotations, interner),
            parameter_annotations,
            type_annotations: rehydrate_type_annotations(&method.type_annotations, interner),
            default_value: method
                .default_value
                .as_ref()
                .map(|value| rehydrate_element_value(value, interner)),
            exception_names: method
                .exceptions
                .iter()
                .map(|ty| raw_internal_name(ty, interner))
                .collect(),
            tag_bits: method.tag_bits,
        }
    }
}

fn rehydrate_annotations(annotations: &[IndexAnnotation], interner: &TypeInterner) -> Vec<Annotation> {
    annotations
        .iter()
        .map(|annotation| rehydrate_annotation(annotation, interner))
        .collect()
}

fn rehydrate_annotation(annotation: &IndexAnnotation, interner: &TypeInterner) -> Annotation {
    Annotation {
        type_descriptor: interner.resolve(annotation.type_id).to_string(),
        elements: annotation
            .value_pairs
            .iter()
            .map(|(name, value)| (name.clone(), rehydrate_element_value(value, interner)))
            .collect(),
    }
}

fn rehydrate_type_annotations(
    annotations: &[IndexTypeAnnotation],
    interner: &TypeInterner,
) -> Vec<TypeAnnotation> {
    annotations
        .iter()
        .map(|annotation| TypeAnnotation {
            target_type: annotation.target_type,
            target_info: annotation.target_info.clone(),
            type_path: annotation.path.clone(),
            annotation: rehydrate_annotation(&annotation.annotation, interner),
        })
        .collect()
}

/// Only primitive and string constants have a [`ConstValue`] form.
fn rehydrate_const(constant: &IndexConstant) -> Option<ConstValue> {
    Some(match constant {
        IndexConstant::Byte(v) => ConstValue::Byte(*v),
        IndexConstant::Char(v) => ConstValue::Char(*v),
        IndexConstant::Short(v) => ConstValue::Short(*v),
        IndexConstant::Int(v) => ConstValue::Int(*v),
        IndexConstant::Long(v) => ConstValue::Long(*v),
        IndexConstant::Float(v) => ConstValue::Float(*v),
        IndexConstant::Double(v) => ConstValue::Double(*v),
        IndexConstant::Boolean(v) => ConstValue::Boolean(*v),
        IndexConstant::String(v) => ConstValue::String(v.clone()),
        IndexConstant::Class(_)
        | IndexConstant::Enum { .. }
        | IndexConstant::Annotation(_)
        | IndexConstant::Array(_) => return None,
    })
}

fn rehydrate_element_value(constant: &IndexConstant, interner: &TypeInterner) -> ElementValue {
    match constant {
        IndexConstant::Class(id) => ElementValue::Class(interner.resolve(*id).to_string()),
        IndexConstant::Enum { type_id, name } => ElementValue::Enum {
            type_descriptor: interner.resolve(*type_id).to_string(),
            const_name: name.clone(),
        },
        IndexConstant::Annotation(annotation) => {
            ElementValue::Annotation(Box::new(rehydrate_annotation(annotation, interner)))
        }
        IndexConstant::Array(values) => ElementValue::Array(
            values
                .iter()
                .map(|value| rehydrate_element_value(value, interner))
                .collect(),
        ),
        IndexConstant::Byte(v) => ElementValue::Const(ConstValue::Byte(*v)),
        IndexConstant::Char(v) => ElementValue::Const(ConstValue::Char(*v)),
        IndexConstant::Short(v) => ElementValue::Const(ConstValue::Short(*v)),
        IndexConstant::Int(v) => ElementValue::Const(ConstValue::Int(*v)),
        IndexConstant::Long(v) => ElementValue::Const(ConstValue::Long(*v)),
        IndexConstant::Float(v) => ElementValue::Const(ConstValue::Float(*v)),
        IndexConstant::Double(v) => ElementValue::Const(ConstValue::Double(*v)),
        IndexConstant::Boolean(v) => ElementValue::Const(ConstValue::Boolean(*v)),
        IndexConstant::String(v) => ElementValue::Const(ConstValue::String(v.clone())),
    }
}

impl BinaryType for IndexBinaryType {
    type Field = IndexBinaryField;
    type Method = IndexBinaryMethod;

    fn name(&self) -> &str {
        &self.name
    }

    fn modifiers(&self) -> u16 {
        self.modifiers
    }

    fn superclass_name(&self) -> Option<&str> {
        self.superclass_name.as_deref()
    }

    fn interface_names(&self) -> &[String] {
        &self.interface_names
    }

    fn generic_signature(&self) -> Option<&str> {
        self.generic_signature.as_deref()
    }

    fn enclosing_type_name(&self) -> Option<&str> {
        self.enclosing_type_name.as_deref()
    }

    fn enclosing_method(&self) -> Option<&MethodRef> {
        self.enclosing_method.as_ref()
    }

    fn source_file_name(&self) -> Option<&str> {
        self.source_file_name.as_deref()
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn is_member(&self) -> bool {
        self.is_member
    }

    fn is_local(&self) -> bool {
        self.is_local
    }

    fn is_anonymous(&self) -> bool {
        self.is_anonymous
    }

    fn tag_bits(&self) -> u64 {
        self.tag_bits
    }

    fn missing_type_names(&self) -> &[String] {
        &self.missing_type_names
    }

    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn type_annotations(&self) -> &[TypeAnnotation] {
        &self.type_annotations
    }

    fn fields(&self) -> &[IndexBinaryField] {
        &self.fields
    }

    fn methods(&self) -> &[IndexBinaryMethod] {
        &self.methods
    }
}

impl BinaryField for IndexBinaryField {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn modifiers(&self) -> u16 {
        self.modifiers
    }

    fn generic_signature(&self) -> Option<&str> {
        self.generic_signature.as_deref()
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
        self.tag_bits
    }
}

impl BinaryMethod for IndexBinaryMethod {
    fn selector(&self) -> &str {
        &self.selector
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn modifiers(&self) -> u16 {
        self.modifiers
    }

    fn generic_signature(&self) -> Option<&str> {
        self.generic_signature.as_deref()
    }

    fn argument_names(&self) -> Vec<&str> {
        self.argument_names.iter().map(String::as_str).collect()
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
        &self.exception_names
    }

    fn tag_bits(&self) -> u64 {
        self.tag_bits
    }
}
