use crate::attribute::AttributeRecord;
use crate::constant_pool::ConstantPoolResolver;
use crate::error::{ClassFormatError, Result};
use crate::reader::Reader;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VerificationType {
    #[default]
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,
    UninitializedThis,
    /// Internal name of the class, resolved through the constant pool.
    Object(String),
    /// Offset of the `new` instruction that created the object.
    Uninitialized(u16),
}

impl VerificationType {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let ty = match reader.read_u1()? {
            0 => VerificationType::Top,
            1 => VerificationType::Integer,
            2 => VerificationType::Float,
            3 => VerificationType::Double,
            4 => VerificationType::Long,
            5 => VerificationType::Null,
            6 => VerificationType::UninitializedThis,
            7 => VerificationType::Object(cp.get_class_name(reader.read_u2()?)?.to_string()),
            8 => VerificationType::Uninitialized(reader.read_u2()?),
            other => return Err(ClassFormatError::UnknownVerificationType(other)),
        };
        Ok(ty)
    }
}

fn read_verification_types(
    reader: &mut Reader<'_>,
    cp: &dyn ConstantPoolResolver,
    count: usize,
) -> Result<Vec<VerificationType>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(VerificationType::read(reader, cp)?);
    }
    Ok(out)
}

/// One `stack_map_frame`.
///
/// `same_frame` and `same_frame_extended` both decode to [`StackMapFrame::Same`];
/// likewise for the two `same_locals_1_stack_item` forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackMapFrame {
    Same {
        offset_delta: u16,
    },
    SameLocals1StackItem {
        offset_delta: u16,
        stack: VerificationType,
    },
    Chop {
        offset_delta: u16,
        /// Number of trailing locals removed (1..=3).
        chopped: u8,
    },
    Append {
        offset_delta: u16,
        locals: Vec<VerificationType>,
    },
    Full {
        offset_delta: u16,
        locals: Vec<VerificationType>,
        stack: Vec<VerificationType>,
    },
}

impl Default for StackMapFrame {
    fn default() -> Self {
        StackMapFrame::Same { offset_delta: 0 }
    }
}

impl StackMapFrame {
    pub fn offset_delta(&self) -> u16 {
        match self {
            StackMapFrame::Same { offset_delta }
            | StackMapFrame::SameLocals1StackItem { offset_delta, .. }
            | StackMapFrame::Chop { offset_delta, .. }
            | StackMapFrame::Append { offset_delta, .. }
            | StackMapFrame::Full { offset_delta, .. } => *offset_delta,
        }
    }

    /// Locals declared by this frame (appended or full).
    pub fn locals(&self) -> &[VerificationType] {
        match self {
            StackMapFrame::Append { locals, .. } | StackMapFrame::Full { locals, .. } => locals,
            _ => &[],
        }
    }

    pub fn stack(&self) -> &[VerificationType] {
        match self {
            StackMapFrame::SameLocals1StackItem { stack, .. } => std::slice::from_ref(stack),
            StackMapFrame::Full { stack, .. } => stack,
            _ => &[],
        }
    }
}

impl AttributeRecord for StackMapFrame {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let frame_type = reader.read_u1()?;
        let frame = match frame_type {
            0..=63 => StackMapFrame::Same {
                offset_delta: frame_type as u16,
            },
            64..=127 => StackMapFrame::SameLocals1StackItem {
                offset_delta: (frame_type - 64) as u16,
                stack: VerificationType::read(reader, cp)?,
            },
            247 => StackMapFrame::SameLocals1StackItem {
                offset_delta: reader.read_u2()?,
                stack: VerificationType::read(reader, cp)?,
            },
            248..=250 => StackMapFrame::Chop {
                offset_delta: reader.read_u2()?,
                chopped: 251 - frame_type,
            },
            251 => StackMapFrame::Same {
                offset_delta: reader.read_u2()?,
            },
            252..=254 => {
                let offset_delta = reader.read_u2()?;
                let locals = read_verification_types(reader, cp, (frame_type - 251) as usize)?;
                StackMapFrame::Append {
                    offset_delta,
                    locals,
                }
            }
            255 => {
                let offset_delta = reader.read_u2()?;
                let num_locals = reader.read_u2()? as usize;
                let locals = read_verification_types(reader, cp, num_locals)?;
                let num_stack = reader.read_u2()? as usize;
                let stack = read_verification_types(reader, cp, num_stack)?;
                StackMapFrame::Full {
                    offset_delta,
                    locals,
                    stack,
                }
            }
            other => return Err(ClassFormatError::UnknownFrameType(other)),
        };
        Ok(frame)
    }
}

/// Body of a `StackMapTable` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackMapTable {
    pub frames: Vec<StackMapFrame>,
}

impl AttributeRecord for StackMapTable {
    fn read(reader: &mut Reader<'_>, cp: &dyn ConstantPoolResolver) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        let mut frames = Vec::with_capacity(count);
        for _ in 0..count {
            frames.push(StackMapFrame::read(reader, cp)?);
        }
        Ok(Self { frames })
    }
}
