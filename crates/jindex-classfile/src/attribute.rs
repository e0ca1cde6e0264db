use crate::annotation::{Annotation, ElementValue};
use crate::constant_pool::ConstantPoolResolver;
use crate::error::Result;
use crate::reader::Reader;
use crate::stack_map::StackMapTable;
use crate::type_annotation::TypeAnnotation;

/// A record decoded from an immutable buffer at a given offset.
///
/// Records are built once per decode pass and never mutated afterwards;
/// [`reset`](AttributeRecord::reset) returns one to its default state so a
/// caller can reuse the allocation.
pub trait AttributeRecord: Default + Sized {
    /// Reads the record starting at the reader's current position.
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self>;

    /// Decodes one record at `offset` and reports how many bytes it consumed.
    fn decode(buf: &[u8], offset: usize, cp: &dyn ConstantPoolResolver) -> Result<(Self, usize)> {
        let mut reader = Reader::at(buf, offset)?;
        let record = Self::read(&mut reader, cp)?;
        Ok((record, reader.position() - offset))
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

fn read_table<T>(
    reader: &mut Reader<'_>,
    count: usize,
    mut read_one: impl FnMut(&mut Reader<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    // `Vec::new()` does not allocate, so empty tables cost nothing.
    if count == 0 {
        return Ok(Vec::new());
    }
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(read_one(reader)?);
    }
    Ok(out)
}

fn read_class_names(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Vec<String>> {
    let count = reader.read_u2()? as usize;
    read_table(reader, count, |r| Ok(cp.get_class_name(r.read_u2()?)?.to_string()))
}

/// `SourceFile`: the index must resolve to a UTF-8 entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFile {
    pub source_file: String,
}

impl AttributeRecord for SourceFile {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        Ok(Self {
            source_file: cp.get_utf8(reader.read_u2()?)?.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InnerClassEntry {
    pub inner_class: String,
    pub outer_class: Option<String>,
    pub inner_name: Option<String>,
    pub access_flags: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InnerClasses {
    pub classes: Vec<InnerClassEntry>,
}

impl AttributeRecord for InnerClasses {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        let classes = read_table(reader, count, |r| {
            let inner_class_info_index = r.read_u2()?;
            let outer_class_info_index = r.read_u2()?;
            let inner_name_index = r.read_u2()?;
            let access_flags = r.read_u2()?;
            Ok(InnerClassEntry {
                inner_class: cp.get_class_name(inner_class_info_index)?.to_string(),
                outer_class: match outer_class_info_index {
                    0 => None,
                    idx => Some(cp.get_class_name(idx)?.to_string()),
                },
                inner_name: match inner_name_index {
                    0 => None,
                    idx => Some(cp.get_utf8(idx)?.to_string()),
                },
                access_flags,
            })
        })?;
        Ok(Self { classes })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodRef {
    pub name: String,
    pub descriptor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnclosingMethod {
    pub class: String,
    pub method: Option<MethodRef>,
}

impl AttributeRecord for EnclosingMethod {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let class = cp.get_class_name(reader.read_u2()?)?.to_string();
        let method = match reader.read_u2()? {
            0 => None,
            idx => {
                let (name, descriptor) = cp.get_name_and_type(idx)?;
                Some(MethodRef {
                    name: name.to_string(),
                    descriptor: descriptor.to_string(),
                })
            }
        };
        Ok(Self { class, method })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exceptions {
    pub exceptions: Vec<String>,
}

impl AttributeRecord for Exceptions {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        Ok(Self {
            exceptions: read_class_names(reader, cp)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermittedSubclasses {
    pub classes: Vec<String>,
}

impl AttributeRecord for PermittedSubclasses {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        Ok(Self {
            classes: read_class_names(reader, cp)?,
        })
    }
}

/// Eclipse's `MissingTypes` attribute: types the compiler could not resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingTypes {
    pub types: Vec<String>,
}

impl AttributeRecord for MissingTypes {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        Ok(Self {
            types: read_class_names(reader, cp)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodParameter {
    pub name: Option<String>,
    pub access_flags: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodParameters {
    pub parameters: Vec<MethodParameter>,
}

impl AttributeRecord for MethodParameters {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let count = reader.read_u1()? as usize;
        let parameters = read_table(reader, count, |r| {
            let name = match r.read_u2()? {
                0 => None,
                idx => Some(cp.get_utf8(idx)?.to_string()),
            };
            Ok(MethodParameter {
                name,
                access_flags: r.read_u2()?,
            })
        })?;
        Ok(Self { parameters })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalVariableTypeEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name: String,
    pub signature: String,
    pub index: u16,
}

impl AttributeRecord for LocalVariableTypeEntry {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        Ok(Self {
            start_pc: reader.read_u2()?,
            length: reader.read_u2()?,
            name: cp.get_utf8(reader.read_u2()?)?.to_string(),
            signature: cp.get_utf8(reader.read_u2()?)?.to_string(),
            index: reader.read_u2()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalVariableTypeTable {
    pub entries: Vec<LocalVariableTypeEntry>,
}

impl AttributeRecord for LocalVariableTypeTable {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        Ok(Self {
            entries: read_table(reader, count, |r| LocalVariableTypeEntry::read(r, cp))?,
        })
    }
}

/// Body of `Runtime{Visible,Invisible}Annotations`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    pub annotations: Vec<Annotation>,
}

impl AttributeRecord for Annotations {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        Ok(Self {
            annotations: read_table(reader, count, |r| Annotation::read(r, cp))?,
        })
    }
}

/// Body of `Runtime{Visible,Invisible}ParameterAnnotations`; one list per
/// parameter, with a one-byte parameter count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterAnnotations {
    pub parameters: Vec<Vec<Annotation>>,
}

impl AttributeRecord for ParameterAnnotations {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let count = reader.read_u1()? as usize;
        Ok(Self {
            parameters: read_table(reader, count, |r| Annotations::read(r, cp).map(|a| a.annotations))?,
        })
    }
}

/// Body of `Runtime{Visible,Invisible}TypeAnnotations`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeAnnotations {
    pub annotations: Vec<TypeAnnotation>,
}

impl AttributeRecord for TypeAnnotations {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        Ok(Self {
            annotations: read_table(reader, count, |r| TypeAnnotation::read(r, cp))?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// `None` for a `finally` handler.
    pub catch_type: Option<String>,
}

/// `Code` attribute. Bytecode is skipped; only the nested attributes the
/// indexer cares about are decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code_length: u32,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<Attribute>,
}

impl AttributeRecord for Code {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let max_stack = reader.read_u2()?;
        let max_locals = reader.read_u2()?;
        let code_length = reader.read_u4()?;
        reader.skip(code_length as usize)?;
        let exception_count = reader.read_u2()? as usize;
        let exception_table = read_table(reader, exception_count, |r| {
            Ok(ExceptionTableEntry {
                start_pc: r.read_u2()?,
                end_pc: r.read_u2()?,
                handler_pc: r.read_u2()?,
                catch_type: match r.read_u2()? {
                    0 => None,
                    idx => Some(cp.get_class_name(idx)?.to_string()),
                },
            })
        })?;
        let attribute_count = reader.read_u2()? as usize;
        let attributes = read_table(reader, attribute_count, |r| Attribute::read(r, cp))?;
        Ok(Self {
            max_stack,
            max_locals,
            code_length,
            exception_table,
            attributes,
        })
    }
}

impl Code {
    pub fn stack_map_table(&self) -> Option<&StackMapTable> {
        self.attributes.iter().find_map(|attr| match attr {
            Attribute::StackMapTable(table) => Some(table),
            _ => None,
        })
    }

    pub fn local_variable_type_table(&self) -> Option<&LocalVariableTypeTable> {
        self.attributes.iter().find_map(|attr| match attr {
            Attribute::LocalVariableTypeTable(table) => Some(table),
            _ => None,
        })
    }

    /// Visible and invisible type annotations on instructions in this method body.
    pub fn type_annotations(&self) -> impl Iterator<Item = &TypeAnnotation> {
        self.attributes
            .iter()
            .flat_map(|attr| -> &[TypeAnnotation] {
                match attr {
                    Attribute::RuntimeVisibleTypeAnnotations(anns)
                    | Attribute::RuntimeInvisibleTypeAnnotations(anns) => &anns.annotations,
                    _ => &[],
                }
            })
    }
}

/// One decoded `attribute_info`.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    SourceFile(SourceFile),
    Signature(String),
    Deprecated,
    Synthetic,
    InnerClasses(InnerClasses),
    EnclosingMethod(EnclosingMethod),
    RuntimeVisibleAnnotations(Annotations),
    RuntimeInvisibleAnnotations(Annotations),
    RuntimeVisibleParameterAnnotations(ParameterAnnotations),
    RuntimeInvisibleParameterAnnotations(ParameterAnnotations),
    RuntimeVisibleTypeAnnotations(TypeAnnotations),
    RuntimeInvisibleTypeAnnotations(TypeAnnotations),
    AnnotationDefault(ElementValue),
    Exceptions(Exceptions),
    MethodParameters(MethodParameters),
    /// Constant-pool index; its type depends on the field descriptor.
    ConstantValue(u16),
    PermittedSubclasses(PermittedSubclasses),
    MissingTypes(MissingTypes),
    Code(Code),
    LocalVariableTypeTable(LocalVariableTypeTable),
    StackMapTable(StackMapTable),
    Unknown { name: String, length: u32 },
}

impl Attribute {
    /// Reads a full `attribute_info`, header included, and checks that the body
    /// consumed exactly the declared length.
    pub fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let name = cp.get_utf8(reader.read_u2()?)?;
        let length = reader.read_u4()?;
        let mut body = Reader::new(reader.read_bytes(length as usize)?);
        let sub = &mut body;

        let attribute = match name {
            "SourceFile" => Attribute::SourceFile(SourceFile::read(sub, cp)?),
            "Signature" => Attribute::Signature(cp.get_utf8(sub.read_u2()?)?.to_string()),
            "Deprecated" => Attribute::Deprecated,
            "Synthetic" => Attribute::Synthetic,
            "InnerClasses" => Attribute::InnerClasses(InnerClasses::read(sub, cp)?),
            "EnclosingMethod" => Attribute::EnclosingMethod(EnclosingMethod::read(sub, cp)?),
            "RuntimeVisibleAnnotations" => {
                Attribute::RuntimeVisibleAnnotations(Annotations::read(sub, cp)?)
            }
            "RuntimeInvisibleAnnotations" => {
                Attribute::RuntimeInvisibleAnnotations(Annotations::read(sub, cp)?)
            }
            "RuntimeVisibleParameterAnnotations" => {
                Attribute::RuntimeVisibleParameterAnnotations(ParameterAnnotations::read(sub, cp)?)
            }
            "RuntimeInvisibleParameterAnnotations" => {
                Attribute::RuntimeInvisibleParameterAnnotations(ParameterAnnotations::read(
                    sub, cp,
                )?)
            }
            "RuntimeVisibleTypeAnnotations" => {
                Attribute::RuntimeVisibleTypeAnnotations(TypeAnnotations::read(sub, cp)?)
            }
            "RuntimeInvisibleTypeAnnotations" => {
                Attribute::RuntimeInvisibleTypeAnnotations(TypeAnnotations::read(sub, cp)?)
            }
            "AnnotationDefault" => Attribute::AnnotationDefault(ElementValue::read(sub, cp)?),
            "Exceptions" => Attribute::Exceptions(Exceptions::read(sub, cp)?),
            "MethodParameters" => Attribute::MethodParameters(MethodParameters::read(sub, cp)?),
            "ConstantValue" => Attribute::ConstantValue(sub.read_u2()?),
            "PermittedSubclasses" => {
                Attribute::PermittedSubclasses(PermittedSubclasses::read(sub, cp)?)
            }
            "MissingTypes" => Attribute::MissingTypes(MissingTypes::read(sub, cp)?),
            "Code" => Attribute::Code(Code::read(sub, cp)?),
            "LocalVariableTypeTable" => {
                Attribute::LocalVariableTypeTable(LocalVariableTypeTable::read(sub, cp)?)
            }
            "StackMapTable" => Attribute::StackMapTable(StackMapTable::read(sub, cp)?),
            _ => {
                return Ok(Attribute::Unknown {
                    name: name.to_string(),
                    length,
                })
            }
        };
        body.ensure_empty("attribute")?;
        Ok(attribute)
    }

    /// Decodes the attribute whose header starts at `offset`.
    pub fn decode(buf: &[u8], offset: usize, cp: &dyn ConstantPoolResolver) -> Result<(Self, usize)> {
        let mut reader = Reader::at(buf, offset)?;
        let attribute = Self::read(&mut reader, cp)?;
        Ok((attribute, reader.position() - offset))
    }
}
