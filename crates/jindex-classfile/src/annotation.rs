use crate::attribute::AttributeRecord;
use crate::constant_pool::ConstantPoolResolver;
use crate::error::{ClassFormatError, Result};
use crate::reader::Reader;

/// An `annotation` structure: a type descriptor plus name/value pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    /// Field descriptor of the annotation type (`Ljava/lang/Deprecated;`).
    pub type_descriptor: String,
    pub elements: Vec<(String, ElementValue)>,
}

impl AttributeRecord for Annotation {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let type_descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();

        let num_element_value_pairs = reader.read_u2()? as usize;
        let mut elements = Vec::with_capacity(num_element_value_pairs);
        for _ in 0..num_element_value_pairs {
            let name = cp.get_utf8(reader.read_u2()?)?.to_string();
            let value = ElementValue::read(reader, cp)?;
            elements.push((name, value));
        }

        Ok(Self {
            type_descriptor,
            elements,
        })
    }
}

impl Annotation {
    pub fn internal_name(&self) -> Option<&str> {
        descriptor_to_internal_name(&self.type_descriptor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Const(ConstValue),
    Enum {
        type_descriptor: String,
        const_name: String,
    },
    /// A class literal, stored as its return descriptor (`Ljava/lang/String;`, `I`, `V`).
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    pub fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let tag = reader.read_u1()? as char;
        let value = match tag {
            'B' => ConstValue::Byte(cp.get_integer(reader.read_u2()?)? as i8),
            'C' => ConstValue::Char(cp.get_integer(reader.read_u2()?)? as u16),
            'I' => ConstValue::Int(cp.get_integer(reader.read_u2()?)?),
            'S' => ConstValue::Short(cp.get_integer(reader.read_u2()?)? as i16),
            'Z' => ConstValue::Boolean(cp.get_integer(reader.read_u2()?)? != 0),
            'D' => ConstValue::Double(cp.get_double(reader.read_u2()?)?),
            'F' => ConstValue::Float(cp.get_float(reader.read_u2()?)?),
            'J' => ConstValue::Long(cp.get_long(reader.read_u2()?)?),
            's' => ConstValue::String(cp.get_utf8(reader.read_u2()?)?.to_string()),
            'e' => {
                let type_name_index = reader.read_u2()?;
                let const_name_index = reader.read_u2()?;
                return Ok(ElementValue::Enum {
                    type_descriptor: cp.get_utf8(type_name_index)?.to_string(),
                    const_name: cp.get_utf8(const_name_index)?.to_string(),
                });
            }
            'c' => {
                let class_info_index = reader.read_u2()?;
                return Ok(ElementValue::Class(
                    cp.get_utf8(class_info_index)?.to_string(),
                ));
            }
            '@' => {
                return Ok(ElementValue::Annotation(Box::new(Annotation::read(
                    reader, cp,
                )?)))
            }
            '[' => {
                let num_values = reader.read_u2()? as usize;
                let mut values = Vec::with_capacity(num_values);
                for _ in 0..num_values {
                    values.push(ElementValue::read(reader, cp)?);
                }
                return Ok(ElementValue::Array(values));
            }
            other => return Err(ClassFormatError::InvalidElementValueTag(other)),
        };
        Ok(ElementValue::Const(value))
    }
}

/// A primitive or string constant, from an element value or a `ConstantValue`
/// attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Byte(i8),
    /// A UTF-16 code unit; may be a lone surrogate.
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
}

pub fn descriptor_to_internal_name(desc: &str) -> Option<&str> {
    desc.strip_prefix('L').and_then(|rest| rest.strip_suffix(';'))
}
