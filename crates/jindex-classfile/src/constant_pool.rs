use crate::error::{ClassFormatError, Result};
use crate::reader::Reader;

/// One decoded constant-pool entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CpInfo {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class {
        name_index: u16,
    },
    String {
        string_index: u16,
    },
    Fieldref {
        class_index: u16,
        name_and_type_index: u16,
    },
    Methodref {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodref {
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    MethodHandle {
        reference_kind: u8,
        reference_index: u16,
    },
    MethodType {
        descriptor_index: u16,
    },
    Dynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    Module {
        name_index: u16,
    },
    Package {
        name_index: u16,
    },
}

impl CpInfo {
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELDREF: u8 = 9;
    pub const METHODREF: u8 = 10;
    pub const INTERFACE_METHODREF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
    pub const METHOD_HANDLE: u8 = 15;
    pub const METHOD_TYPE: u8 = 16;
    pub const DYNAMIC: u8 = 17;
    pub const INVOKE_DYNAMIC: u8 = 18;
    pub const MODULE: u8 = 19;
    pub const PACKAGE: u8 = 20;

    pub fn kind(&self) -> &'static str {
        match self {
            CpInfo::Utf8(_) => "Utf8",
            CpInfo::Integer(_) => "Integer",
            CpInfo::Float(_) => "Float",
            CpInfo::Long(_) => "Long",
            CpInfo::Double(_) => "Double",
            CpInfo::Class { .. } => "Class",
            CpInfo::String { .. } => "String",
            CpInfo::Fieldref { .. } => "Fieldref",
            CpInfo::Methodref { .. } => "Methodref",
            CpInfo::InterfaceMethodref { .. } => "InterfaceMethodref",
            CpInfo::NameAndType { .. } => "NameAndType",
            CpInfo::MethodHandle { .. } => "MethodHandle",
            CpInfo::MethodType { .. } => "MethodType",
            CpInfo::Dynamic { .. } => "Dynamic",
            CpInfo::InvokeDynamic { .. } => "InvokeDynamic",
            CpInfo::Module { .. } => "Module",
            CpInfo::Package { .. } => "Package",
        }
    }

    /// `Long` and `Double` take two constant-pool slots.
    fn is_wide(&self) -> bool {
        matches!(self, CpInfo::Long(_) | CpInfo::Double(_))
    }

    fn parse(reader: &mut Reader<'_>) -> Result<Self> {
        let tag = reader.read_u1()?;
        let info = match tag {
            Self::UTF8 => {
                let len = reader.read_u2()? as usize;
                CpInfo::Utf8(decode_modified_utf8(reader.read_bytes(len)?)?)
            }
            Self::INTEGER => CpInfo::Integer(reader.read_u4()? as i32),
            Self::FLOAT => CpInfo::Float(f32::from_bits(reader.read_u4()?)),
            Self::LONG => {
                let high = reader.read_u4()? as u64;
                let low = reader.read_u4()? as u64;
                CpInfo::Long(((high << 32) | low) as i64)
            }
            Self::DOUBLE => {
                let high = reader.read_u4()? as u64;
                let low = reader.read_u4()? as u64;
                CpInfo::Double(f64::from_bits((high << 32) | low))
            }
            Self::CLASS => CpInfo::Class {
                name_index: reader.read_u2()?,
            },
            Self::STRING => CpInfo::String {
                string_index: reader.read_u2()?,
            },
            Self::FIELDREF => CpInfo::Fieldref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            Self::METHODREF => CpInfo::Methodref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            Self::INTERFACE_METHODREF => CpInfo::InterfaceMethodref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            Self::NAME_AND_TYPE => CpInfo::NameAndType {
                name_index: reader.read_u2()?,
                descriptor_index: reader.read_u2()?,
            },
            Self::METHOD_HANDLE => CpInfo::MethodHandle {
                reference_kind: reader.read_u1()?,
                reference_index: reader.read_u2()?,
            },
            Self::METHOD_TYPE => CpInfo::MethodType {
                descriptor_index: reader.read_u2()?,
            },
            Self::DYNAMIC => CpInfo::Dynamic {
                bootstrap_method_attr_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            Self::INVOKE_DYNAMIC => CpInfo::InvokeDynamic {
                bootstrap_method_attr_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            Self::MODULE => CpInfo::Module {
                name_index: reader.read_u2()?,
            },
            Self::PACKAGE => CpInfo::Package {
                name_index: reader.read_u2()?,
            },
            other => return Err(ClassFormatError::InvalidConstantPoolTag(other)),
        };
        Ok(info)
    }
}

/// Maps a 1-based constant-pool index to a typed entry.
///
/// Attribute decoders only see the pool through this trait. The typed helpers
/// fail with [`ClassFormatError::ConstantPoolTypeMismatch`] when the entry has
/// the wrong kind.
pub trait ConstantPoolResolver {
    fn entry(&self, index: u16) -> Result<&CpInfo>;

    fn get_utf8(&self, index: u16) -> Result<&str> {
        match self.entry(index)? {
            CpInfo::Utf8(value) => Ok(value),
            other => Err(mismatch(index, "Utf8", other)),
        }
    }

    /// Resolves a `CONSTANT_Class` entry to its internal name (`java/lang/Object`).
    fn get_class_name(&self, index: u16) -> Result<&str> {
        match self.entry(index)? {
            CpInfo::Class { name_index } => self.get_utf8(*name_index),
            other => Err(mismatch(index, "Class", other)),
        }
    }

    fn get_string_constant(&self, index: u16) -> Result<&str> {
        match self.entry(index)? {
            CpInfo::String { string_index } => self.get_utf8(*string_index),
            CpInfo::Utf8(value) => Ok(value),
            other => Err(mismatch(index, "String", other)),
        }
    }

    fn get_integer(&self, index: u16) -> Result<i32> {
        match self.entry(index)? {
            CpInfo::Integer(value) => Ok(*value),
            other => Err(mismatch(index, "Integer", other)),
        }
    }

    fn get_long(&self, index: u16) -> Result<i64> {
        match self.entry(index)? {
            CpInfo::Long(value) => Ok(*value),
            other => Err(mismatch(index, "Long", other)),
        }
    }

    fn get_float(&self, index: u16) -> Result<f32> {
        match self.entry(index)? {
            CpInfo::Float(value) => Ok(*value),
            other => Err(mismatch(index, "Float", other)),
        }
    }

    fn get_double(&self, index: u16) -> Result<f64> {
        match self.entry(index)? {
            CpInfo::Double(value) => Ok(*value),
            other => Err(mismatch(index, "Double", other)),
        }
    }

    /// Resolves a `CONSTANT_NameAndType` entry to `(name, descriptor)`.
    fn get_name_and_type(&self, index: u16) -> Result<(&str, &str)> {
        match self.entry(index)? {
            CpInfo::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.get_utf8(*name_index)?, self.get_utf8(*descriptor_index)?)),
            other => Err(mismatch(index, "NameAndType", other)),
        }
    }
}

fn mismatch(index: u16, expected: &'static str, found: &CpInfo) -> ClassFormatError {
    ClassFormatError::ConstantPoolTypeMismatch {
        index,
        expected,
        found: found.kind(),
    }
}

/// The constant pool of one class file.
///
/// Slot 0 and the slot following each `Long`/`Double` are unusable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantPool {
    entries: Vec<Option<CpInfo>>,
}

impl ConstantPool {
    pub fn parse(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count.max(1));
        entries.push(None);
        while entries.len() < count {
            let info = CpInfo::parse(reader)?;
            let wide = info.is_wide();
            entries.push(Some(info));
            if wide {
                entries.push(None);
            }
        }
        if entries.len() > count.max(1) {
            // A wide entry in the last slot claims a slot past the declared count.
            return Err(ClassFormatError::InvalidConstantPoolIndex(count as u16));
        }
        Ok(Self { entries })
    }

    /// Builds a pool from entries in slot order, starting at index 1.
    pub fn from_entries(infos: impl IntoIterator<Item = CpInfo>) -> Self {
        let mut entries = vec![None];
        for info in infos {
            let wide = info.is_wide();
            entries.push(Some(info));
            if wide {
                entries.push(None);
            }
        }
        Self { entries }
    }

    /// The `constant_pool_count` value: number of slots including slot 0.
    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

impl ConstantPoolResolver for ConstantPool {
    fn entry(&self, index: u16) -> Result<&CpInfo> {
        self.entries
            .get(index as usize)
            .and_then(Option::as_ref)
            .ok_or(ClassFormatError::InvalidConstantPoolIndex(index))
    }
}

/// Decodes the JVM's modified UTF-8 (`0xC0 0x80` for NUL, surrogate pairs as
/// two three-byte sequences).
pub(crate) fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    if bytes.is_ascii() && !bytes.contains(&0) {
        return String::from_utf8(bytes.to_vec()).map_err(|_| ClassFormatError::InvalidModifiedUtf8);
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i] as u16;
        if b0 & 0x80 == 0 {
            if b0 == 0 {
                return Err(ClassFormatError::InvalidModifiedUtf8);
            }
            units.push(b0);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = continuation(bytes, i + 1)?;
            units.push(((b0 & 0x1F) << 6) | b1);
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            let b1 = continuation(bytes, i + 1)?;
            let b2 = continuation(bytes, i + 2)?;
            units.push(((b0 & 0x0F) << 12) | (b1 << 6) | b2);
            i += 3;
        } else {
            return Err(ClassFormatError::InvalidModifiedUtf8);
        }
    }
    String::from_utf16(&units).map_err(|_| ClassFormatError::InvalidModifiedUtf8)
}

fn continuation(bytes: &[u8], idx: usize) -> Result<u16> {
    match bytes.get(idx) {
        Some(b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
        _ => Err(ClassFormatError::InvalidModifiedUtf8),
    }
}
