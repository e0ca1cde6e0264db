use crate::error::{ClassFormatError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Base(BaseType),
    Object(String),
    Array(Box<FieldType>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    Void,
    Type(FieldType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    pub return_type: ReturnType,
}

pub fn parse_field_descriptor(desc: &str) -> Result<FieldType> {
    let (ty, rest) = parse_field_type(desc)?;
    if !rest.is_empty() {
        return Err(ClassFormatError::InvalidDescriptor(desc.to_string()));
    }
    Ok(ty)
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor> {
    let (params, return_part) = split_method_descriptor(desc)?;
    let params = params
        .into_iter()
        .map(parse_field_descriptor)
        .collect::<Result<Vec<_>>>()?;
    let return_type = if return_part == "V" {
        ReturnType::Void
    } else {
        ReturnType::Type(parse_field_descriptor(return_part)?)
    };
    Ok(MethodDescriptor {
        params,
        return_type,
    })
}

/// Splits `(IJ[Ljava/lang/String;)V` into `["I", "J", "[Ljava/lang/String;"]`
/// and `"V"` without allocating the individual descriptors.
pub fn split_method_descriptor(desc: &str) -> Result<(Vec<&str>, &str)> {
    let invalid = || ClassFormatError::InvalidDescriptor(desc.to_string());
    let mut rest = desc.strip_prefix('(').ok_or_else(invalid)?;
    let mut params = Vec::new();
    loop {
        if let Some(after) = rest.strip_prefix(')') {
            rest = after;
            break;
        }
        if rest.is_empty() {
            return Err(invalid());
        }
        let (_, after) = parse_field_type(rest)?;
        params.push(&rest[..rest.len() - after.len()]);
        rest = after;
    }

    if rest == "V" {
        return Ok((params, rest));
    }
    let (_, after) = parse_field_type(rest)?;
    if !after.is_empty() {
        return Err(invalid());
    }
    Ok((params, rest))
}

/// Converts an internal name (`java/lang/String`) to a field descriptor
/// (`Ljava/lang/String;`). Array names are already descriptors.
pub fn internal_name_to_descriptor(name: &str) -> String {
    if name.starts_with('[') {
        name.to_string()
    } else {
        format!("L{name};")
    }
}

fn parse_field_type(input: &str) -> Result<(FieldType, &str)> {
    let bytes = input.as_bytes();
    if bytes.is_empty() {
        return Err(ClassFormatError::InvalidDescriptor(input.to_string()));
    }
    match bytes[0] as char {
        'B' => Ok((FieldType::Base(BaseType::Byte), &input[1..])),
        'C' => Ok((FieldType::Base(BaseType::Char), &input[1..])),
        'D' => Ok((FieldType::Base(BaseType::Double), &input[1..])),
        'F' => Ok((FieldType::Base(BaseType::Float), &input[1..])),
        'I' => Ok((FieldType::Base(BaseType::Int), &input[1..])),
        'J' => Ok((FieldType::Base(BaseType::Long), &input[1..])),
        'S' => Ok((FieldType::Base(BaseType::Short), &input[1..])),
        'Z' => Ok((FieldType::Base(BaseType::Boolean), &input[1..])),
        'L' => match input.find(';') {
            Some(end) if end > 1 => {
                Ok((FieldType::Object(input[1..end].to_string()), &input[end + 1..]))
            }
            _ => Err(ClassFormatError::InvalidDescriptor(input.to_string())),
        },
        '[' => {
            let (component, rest) = parse_field_type(&input[1..])?;
            Ok((FieldType::Array(Box::new(component)), rest))
        }
        _ => Err(ClassFormatError::InvalidDescriptor(input.to_string())),
    }
}
