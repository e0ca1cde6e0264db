use crate::annotation::{Annotation, ConstValue, ElementValue};
use crate::attribute::{
    Attribute, Code, EnclosingMethod, InnerClassEntry, MethodParameter,
};
use crate::constant_pool::{ConstantPool, ConstantPoolResolver};
use crate::error::{ClassFormatError, Result};
use crate::reader::Reader;
use crate::type_annotation::TypeAnnotation;

pub mod access_flags {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ANNOTATION: u16 = 0x2000;
    pub const ACC_ENUM: u16 = 0x4000;
    pub const ACC_MANDATED: u16 = 0x8000;
}

const CLASSFILE_MAGIC: u32 = 0xCAFEBABE;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub signature: Option<String>,
    pub source_file: Option<String>,
    /// Runtime-visible annotations followed by runtime-invisible ones.
    pub annotations: Vec<Annotation>,
    pub type_annotations: Vec<TypeAnnotation>,
    pub inner_classes: Vec<InnerClassEntry>,
    pub enclosing_method: Option<EnclosingMethod>,
    pub permitted_subclasses: Vec<String>,
    pub missing_types: Vec<String>,
    pub deprecated: bool,
    pub synthetic: bool,
    pub constant_pool: ConstantPool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub constant: Option<ConstValue>,
    pub annotations: Vec<Annotation>,
    pub type_annotations: Vec<TypeAnnotation>,
    pub deprecated: bool,
    pub synthetic: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
    pub parameters: Vec<MethodParameter>,
    /// Indexed by the parameter positions the attribute declares; visible and
    /// invisible lists are merged per position.
    pub parameter_annotations: Vec<Vec<Annotation>>,
    pub annotations: Vec<Annotation>,
    pub type_annotations: Vec<TypeAnnotation>,
    pub default_value: Option<ElementValue>,
    pub code: Option<Code>,
    pub deprecated: bool,
    pub synthetic: bool,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != CLASSFILE_MAGIC {
            return Err(ClassFormatError::InvalidMagic(magic));
        }

        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let cp = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = cp.get_class_name(reader.read_u2()?)?.to_string();
        let super_class = match reader.read_u2()? {
            0 => None,
            idx => Some(cp.get_class_name(idx)?.to_string()),
        };

        let interfaces_count = reader.read_u2()? as usize;
        let mut interfaces = Vec::with_capacity(interfaces_count);
        for _ in 0..interfaces_count {
            interfaces.push(cp.get_class_name(reader.read_u2()?)?.to_string());
        }

        let fields_count = reader.read_u2()? as usize;
        let mut fields = Vec::with_capacity(fields_count);
        for _ in 0..fields_count {
            fields.push(parse_field(&mut reader, &cp)?);
        }

        let methods_count = reader.read_u2()? as usize;
        let mut methods = Vec::with_capacity(methods_count);
        for _ in 0..methods_count {
            methods.push(parse_method(&mut reader, &cp)?);
        }

        let attrs = parse_attributes(&mut reader, &cp)?;
        reader.ensure_empty("class file")?;

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            signature: attrs.signature,
            source_file: attrs.source_file,
            annotations: attrs.annotations,
            type_annotations: attrs.type_annotations,
            inner_classes: attrs.inner_classes,
            enclosing_method: attrs.enclosing_method,
            permitted_subclasses: attrs.permitted_subclasses,
            missing_types: attrs.missing_types,
            deprecated: attrs.deprecated,
            synthetic: attrs.synthetic,
            constant_pool: cp,
        })
    }

    /// The `InnerClasses` entry describing this class itself, if it is nested.
    pub fn own_inner_class_entry(&self) -> Option<&InnerClassEntry> {
        self.inner_classes
            .iter()
            .find(|entry| entry.inner_class == self.this_class)
    }
}

fn parse_field(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<FieldInfo> {
    let access_flags = reader.read_u2()?;
    let name = cp.get_utf8(reader.read_u2()?)?.to_string();
    let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();

    let attrs = parse_attributes(reader, cp)?;
    let constant = attrs
        .constant_value
        .map(|idx| typed_constant(cp, idx, &descriptor))
        .transpose()?;

    Ok(FieldInfo {
        access_flags,
        name,
        descriptor,
        signature: attrs.signature,
        constant,
        annotations: attrs.annotations,
        type_annotations: attrs.type_annotations,
        deprecated: attrs.deprecated,
        synthetic: attrs.synthetic,
    })
}

fn parse_method(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<MethodInfo> {
    let access_flags = reader.read_u2()?;
    let name = cp.get_utf8(reader.read_u2()?)?.to_string();
    let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();

    let attrs = parse_attributes(reader, cp)?;
    Ok(MethodInfo {
        access_flags,
        name,
        descriptor,
        signature: attrs.signature,
        exceptions: attrs.exceptions,
        parameters: attrs.method_parameters,
        parameter_annotations: attrs.parameter_annotations,
        annotations: attrs.annotations,
        type_annotations: attrs.type_annotations,
        default_value: attrs.default_value,
        code: attrs.code,
        deprecated: attrs.deprecated,
        synthetic: attrs.synthetic,
    })
}

/// `ConstantValue` entries are typed by the field descriptor: `Z`, `B`, `C`
/// and `S` fields all point at `CONSTANT_Integer`.
fn typed_constant(cp: &ConstantPool, index: u16, descriptor: &str) -> Result<ConstValue> {
    let value = match descriptor {
        "Z" => ConstValue::Boolean(cp.get_integer(index)? != 0),
        "B" => ConstValue::Byte(cp.get_integer(index)? as i8),
        "C" => ConstValue::Char(cp.get_integer(index)? as u16),
        "S" => ConstValue::Short(cp.get_integer(index)? as i16),
        "I" => ConstValue::Int(cp.get_integer(index)?),
        "J" => ConstValue::Long(cp.get_long(index)?),
        "F" => ConstValue::Float(cp.get_float(index)?),
        "D" => ConstValue::Double(cp.get_double(index)?),
        "Ljava/lang/String;" => ConstValue::String(cp.get_string_constant(index)?.to_string()),
        _ => return Err(ClassFormatError::MalformedAttribute("ConstantValue")),
    };
    Ok(value)
}

#[derive(Default)]
struct ParsedAttributes {
    signature: Option<String>,
    source_file: Option<String>,
    annotations: Vec<Annotation>,
    invisible_annotations: Vec<Annotation>,
    type_annotations: Vec<TypeAnnotation>,
    parameter_annotations: Vec<Vec<Annotation>>,
    inner_classes: Vec<InnerClassEntry>,
    enclosing_method: Option<EnclosingMethod>,
    permitted_subclasses: Vec<String>,
    missing_types: Vec<String>,
    exceptions: Vec<String>,
    method_parameters: Vec<MethodParameter>,
    default_value: Option<ElementValue>,
    constant_value: Option<u16>,
    code: Option<Code>,
    deprecated: bool,
    synthetic: bool,
}

fn parse_attributes(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<ParsedAttributes> {
    let attributes_count = reader.read_u2()? as usize;
    let mut parsed = ParsedAttributes::default();
    for _ in 0..attributes_count {
        match Attribute::read(reader, cp)? {
            Attribute::Signature(sig) => parsed.signature = Some(sig),
            Attribute::SourceFile(file) => parsed.source_file = Some(file.source_file),
            Attribute::Deprecated => parsed.deprecated = true,
            Attribute::Synthetic => parsed.synthetic = true,
            Attribute::RuntimeVisibleAnnotations(anns) => {
                parsed.annotations.extend(anns.annotations)
            }
            Attribute::RuntimeInvisibleAnnotations(anns) => {
                parsed.invisible_annotations.extend(anns.annotations)
            }
            Attribute::RuntimeVisibleTypeAnnotations(anns)
            | Attribute::RuntimeInvisibleTypeAnnotations(anns) => {
                parsed.type_annotations.extend(anns.annotations)
            }
            Attribute::RuntimeVisibleParameterAnnotations(params)
            | Attribute::RuntimeInvisibleParameterAnnotations(params) => {
                merge_parameter_annotations(&mut parsed.parameter_annotations, params.parameters)
            }
            Attribute::InnerClasses(inner) => parsed.inner_classes.extend(inner.classes),
            Attribute::EnclosingMethod(method) => parsed.enclosing_method = Some(method),
            Attribute::PermittedSubclasses(permitted) => {
                parsed.permitted_subclasses.extend(permitted.classes)
            }
            Attribute::MissingTypes(missing) => parsed.missing_types.extend(missing.types),
            Attribute::Exceptions(exceptions) => parsed.exceptions.extend(exceptions.exceptions),
            Attribute::MethodParameters(params) => parsed.method_parameters = params.parameters,
            Attribute::AnnotationDefault(value) => parsed.default_value = Some(value),
            Attribute::ConstantValue(idx) => parsed.constant_value = Some(idx),
            Attribute::Code(code) => parsed.code = Some(code),
            // Only meaningful inside `Code`.
            Attribute::LocalVariableTypeTable(_) | Attribute::StackMapTable(_) => {}
            Attribute::Unknown { .. } => {}
        }
    }
    let invisible = std::mem::take(&mut parsed.invisible_annotations);
    parsed.annotations.extend(invisible);
    Ok(parsed)
}

fn merge_parameter_annotations(into: &mut Vec<Vec<Annotation>>, from: Vec<Vec<Annotation>>) {
    if into.len() < from.len() {
        into.resize_with(from.len(), Vec::new);
    }
    for (slot, anns) in into.iter_mut().zip(from) {
        slot.extend(anns);
    }
}
