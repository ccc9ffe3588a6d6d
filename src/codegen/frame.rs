//! StackMapTable frames: wire encoding plus conversion to and from absolute frame states

use super::error::{ClassFormatError, ClassFormatResult};
use super::reader::ByteReader;

/// VerificationTypeInfo as defined in JVMS 4.7.4
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VerificationType {
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,
    UninitializedThis,
    Object(u16),        // cpool index to CONSTANT_Class
    Uninitialized(u16), // offset of the `new` instruction
}

impl VerificationType {
    /// Long and Double occupy two local or stack slots
    pub fn is_wide(&self) -> bool {
        matches!(self, VerificationType::Long | VerificationType::Double)
    }

    pub fn write_to(&self, bytes: &mut Vec<u8>) {
        match self {
            VerificationType::Top => bytes.push(0),
            VerificationType::Integer => bytes.push(1),
            VerificationType::Float => bytes.push(2),
            VerificationType::Double => bytes.push(3),
            VerificationType::Long => bytes.push(4),
            VerificationType::Null => bytes.push(5),
            VerificationType::UninitializedThis => bytes.push(6),
            VerificationType::Object(cp_index) => {
                bytes.push(7);
                bytes.extend_from_slice(&cp_index.to_be_bytes());
            }
            VerificationType::Uninitialized(offset) => {
                bytes.push(8);
                bytes.extend_from_slice(&offset.to_be_bytes());
            }
        }
    }

    fn read(reader: &mut ByteReader<'_>) -> ClassFormatResult<Self> {
        Ok(match reader.u8()? {
            0 => VerificationType::Top,
            1 => VerificationType::Integer,
            2 => VerificationType::Float,
            3 => VerificationType::Double,
            4 => VerificationType::Long,
            5 => VerificationType::Null,
            6 => VerificationType::UninitializedThis,
            7 => VerificationType::Object(reader.u16()?),
            8 => VerificationType::Uninitialized(reader.u16()?),
            other => return Err(ClassFormatError::InvalidVerificationType(other)),
        })
    }
}

/// StackMapFrame variants as defined in JVMS 4.7.4
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackMapFrame {
    Same { offset_delta: u16 },
    SameLocals1StackItem { offset_delta: u16, stack: VerificationType },
    Chop { k: u8, offset_delta: u16 },
    Append { offset_delta: u16, locals: Vec<VerificationType> },
    Full { offset_delta: u16, locals: Vec<VerificationType>, stack: Vec<VerificationType> },
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

    /// Compact and extended encodings are chosen from the delta
    pub fn write_to(&self, bytes: &mut Vec<u8>) {
        match self {
            StackMapFrame::Same { offset_delta } => {
                if *offset_delta <= 63 {
                    bytes.push(*offset_delta as u8);
                } else {
                    bytes.push(251);
                    bytes.extend_from_slice(&offset_delta.to_be_bytes());
                }
            }
            StackMapFrame::SameLocals1StackItem { offset_delta, stack } => {
                if *offset_delta <= 63 {
                    bytes.push(64 + *offset_delta as u8);
                } else {
                    bytes.push(247);
                    bytes.extend_from_slice(&offset_delta.to_be_bytes());
                }
                stack.write_to(bytes);
            }
            StackMapFrame::Chop { k, offset_delta } => {
                bytes.push(251 - *k);
                bytes.extend_from_slice(&offset_delta.to_be_bytes());
            }
            StackMapFrame::Append { offset_delta, locals } => {
                bytes.push(251 + locals.len() as u8);
                bytes.extend_from_slice(&offset_delta.to_be_bytes());
                for local in locals {
                    local.write_to(bytes);
                }
            }
            StackMapFrame::Full { offset_delta, locals, stack } => {
                bytes.push(255);
                bytes.extend_from_slice(&offset_delta.to_be_bytes());
                bytes.extend_from_slice(&(locals.len() as u16).to_be_bytes());
                for local in locals {
                    local.write_to(bytes);
                }
                bytes.extend_from_slice(&(stack.len() as u16).to_be_bytes());
                for item in stack {
                    item.write_to(bytes);
                }
            }
        }
    }

    fn read(reader: &mut ByteReader<'_>) -> ClassFormatResult<Self> {
        let tag = reader.u8()?;
        Ok(match tag {
            0..=63 => StackMapFrame::Same { offset_delta: tag as u16 },
            64..=127 => StackMapFrame::SameLocals1StackItem {
                offset_delta: (tag - 64) as u16,
                stack: VerificationType::read(reader)?,
            },
            247 => StackMapFrame::SameLocals1StackItem {
                offset_delta: reader.u16()?,
                stack: VerificationType::read(reader)?,
            },
            248..=250 => StackMapFrame::Chop { k: 251 - tag, offset_delta: reader.u16()? },
            251 => StackMapFrame::Same { offset_delta: reader.u16()? },
            252..=254 => {
                let offset_delta = reader.u16()?;
                let locals = (0..tag - 251)
                    .map(|_| VerificationType::read(reader))
                    .collect::<ClassFormatResult<_>>()?;
                StackMapFrame::Append { offset_delta, locals }
            }
            255 => {
                let offset_delta = reader.u16()?;
                let local_count = reader.u16()?;
                let locals = (0..local_count)
                    .map(|_| VerificationType::read(reader))
                    .collect::<ClassFormatResult<_>>()?;
                let stack_count = reader.u16()?;
                let stack = (0..stack_count)
                    .map(|_| VerificationType::read(reader))
                    .collect::<ClassFormatResult<_>>()?;
                StackMapFrame::Full { offset_delta, locals, stack }
            }
            other => return Err(ClassFormatError::InvalidFrameType(other)),
        })
    }
}

/// Parse the body of a StackMapTable attribute
pub fn parse_stack_map_table(info: &[u8]) -> ClassFormatResult<Vec<StackMapFrame>> {
    let mut reader = ByteReader::new(info);
    let count = reader.u16()?;
    (0..count).map(|_| StackMapFrame::read(&mut reader)).collect()
}

pub fn stack_map_table_to_bytes(frames: &[StackMapFrame]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(frames.len() as u16).to_be_bytes());
    for frame in frames {
        frame.write_to(&mut bytes);
    }
    bytes
}

/// Verifier state at one bytecode offset.
///
/// Locals and stack use the frame encoding where a Long or Double is a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameState {
    pub pc: u32,
    pub locals: Vec<VerificationType>,
    pub stack: Vec<VerificationType>,
}

/// Expand the delta encoded table into absolute states
pub fn decode_frames(frames: &[StackMapFrame], initial_locals: &[VerificationType]) -> Vec<FrameState> {
    let mut states = Vec::with_capacity(frames.len());
    let mut locals = initial_locals.to_vec();
    let mut previous: Option<u32> = None;
    for frame in frames {
        let delta = frame.offset_delta() as u32;
        let pc = match previous {
            None => delta,
            Some(pc) => pc + delta + 1,
        };
        let stack = match frame {
            StackMapFrame::Same { .. } => Vec::new(),
            StackMapFrame::SameLocals1StackItem { stack, .. } => vec![stack.clone()],
            StackMapFrame::Chop { k, .. } => {
                let keep = locals.len().saturating_sub(*k as usize);
                locals.truncate(keep);
                Vec::new()
            }
            StackMapFrame::Append { locals: added, .. } => {
                locals.extend(added.iter().cloned());
                Vec::new()
            }
            StackMapFrame::Full { locals: full, stack, .. } => {
                locals = full.clone();
                stack.clone()
            }
        };
        states.push(FrameState { pc, locals: locals.clone(), stack });
        previous = Some(pc);
    }
    states
}

/// Re-encode absolute states, picking the most compact frame kind for each
pub fn encode_frames(states: &[FrameState], initial_locals: &[VerificationType]) -> Vec<StackMapFrame> {
    let mut frames = Vec::with_capacity(states.len());
    let mut previous_locals = initial_locals;
    let mut previous_pc: Option<u32> = None;
    for state in states {
        let offset_delta = match previous_pc {
            None => state.pc,
            Some(pc) => state.pc - pc - 1,
        } as u16;
        let locals = state.locals.as_slice();
        let frame = if locals == previous_locals && state.stack.is_empty() {
            StackMapFrame::Same { offset_delta }
        } else if locals == previous_locals && state.stack.len() == 1 {
            StackMapFrame::SameLocals1StackItem { offset_delta, stack: state.stack[0].clone() }
        } else if state.stack.is_empty()
            && locals.len() > previous_locals.len()
            && locals.len() - previous_locals.len() <= 3
            && locals.starts_with(previous_locals)
        {
            StackMapFrame::Append { offset_delta, locals: locals[previous_locals.len()..].to_vec() }
        } else if state.stack.is_empty()
            && locals.len() < previous_locals.len()
            && previous_locals.len() - locals.len() <= 3
            && previous_locals.starts_with(locals)
        {
            StackMapFrame::Chop { k: (previous_locals.len() - locals.len()) as u8, offset_delta }
        } else {
            StackMapFrame::Full { offset_delta, locals: locals.to_vec(), stack: state.stack.clone() }
        };
        frames.push(frame);
        previous_locals = locals;
        previous_pc = Some(state.pc);
    }
    frames
}

/// Convert a slot-indexed vector (wide values followed by a Top) into frame entries,
/// trimming trailing Top locals
pub fn slots_to_frame_locals(slots: &[VerificationType]) -> Vec<VerificationType> {
    let mut out = slots_to_frame_stack(slots);
    while matches!(out.last(), Some(VerificationType::Top)) {
        out.pop();
    }
    out
}

/// Convert a slot-indexed operand stack into frame entries
pub fn slots_to_frame_stack(slots: &[VerificationType]) -> Vec<VerificationType> {
    let mut out = Vec::with_capacity(slots.len());
    let mut i = 0;
    while i < slots.len() {
        let item = slots[i].clone();
        i += if item.is_wide() { 2 } else { 1 };
        out.push(item);
    }
    out
}

/// Human-readable rendering of a frame table with absolute offsets
pub fn describe_frames(states: &[FrameState]) -> Vec<String> {
    states
        .iter()
        .map(|s| format!("@{:>4} locals={:?} stack={:?}", s.pc, s.locals, s.stack))
        .collect()
}
