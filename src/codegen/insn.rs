//! Instruction-level decoding, layout and encoding of method bytecode
//!
//! Decoded instructions carry branch targets as [`Label`]s. After [`decode`]
//! a label is an absolute bytecode offset; the patcher rewrites labels into
//! instruction indices before calling [`layout`] and [`encode`].

use super::constpool::ConstantPool;
use super::error::{ClassFormatError, ClassFormatResult};
use super::opcodes::{self, *};
use super::reader::ByteReader;

pub type Label = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    None,
    /// bipush value, ldc constant index, newarray element type
    Byte(u8),
    /// sipush value or a constant pool index
    Short(u16),
    Local { index: u16, wide: bool },
    Iinc { index: u16, delta: i16, wide: bool },
    Branch(Label),
    BranchWide(Label),
    TableSwitch { default: Label, low: i32, targets: Vec<Label> },
    LookupSwitch { default: Label, pairs: Vec<(i32, Label)> },
    InvokeInterface { index: u16, count: u8 },
    InvokeDynamic { index: u16 },
    MultiANewArray { index: u16, dims: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insn {
    pub opcode: u8,
    pub operand: Operand,
}

impl Insn {
    pub fn simple(opcode: u8) -> Self {
        Self { opcode, operand: Operand::None }
    }

    /// Branch targets referenced by this instruction
    pub fn labels(&self) -> Vec<Label> {
        match &self.operand {
            Operand::Branch(target) | Operand::BranchWide(target) => vec![*target],
            Operand::TableSwitch { default, targets, .. } => {
                std::iter::once(*default).chain(targets.iter().copied()).collect()
            }
            Operand::LookupSwitch { default, pairs } => {
                std::iter::once(*default).chain(pairs.iter().map(|(_, t)| *t)).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Rewrite every branch target through `f`
    pub fn map_labels<F>(&mut self, mut f: F) -> ClassFormatResult<()>
    where
        F: FnMut(Label) -> ClassFormatResult<Label>,
    {
        match &mut self.operand {
            Operand::Branch(target) | Operand::BranchWide(target) => *target = f(*target)?,
            Operand::TableSwitch { default, targets, .. } => {
                *default = f(*default)?;
                for target in targets.iter_mut() {
                    *target = f(*target)?;
                }
            }
            Operand::LookupSwitch { default, pairs } => {
                *default = f(*default)?;
                for (_, target) in pairs.iter_mut() {
                    *target = f(*target)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Encoded size when placed at `pc`
    pub fn size_at(&self, pc: u32) -> u32 {
        let padding = (4 - (pc + 1) % 4) % 4;
        match &self.operand {
            Operand::None => 1,
            Operand::Byte(_) => 2,
            Operand::Short(_) => 3,
            Operand::Local { wide: false, .. } => 2,
            Operand::Local { wide: true, .. } => 4,
            Operand::Iinc { wide: false, .. } => 3,
            Operand::Iinc { wide: true, .. } => 6,
            Operand::Branch(_) => 3,
            Operand::BranchWide(_) => 5,
            Operand::TableSwitch { targets, .. } => 1 + padding + 12 + 4 * targets.len() as u32,
            Operand::LookupSwitch { pairs, .. } => 1 + padding + 8 + 8 * pairs.len() as u32,
            Operand::InvokeInterface { .. } | Operand::InvokeDynamic { .. } => 5,
            Operand::MultiANewArray { .. } => 4,
        }
    }

    pub fn is_unconditional_exit(&self) -> bool {
        matches!(
            self.opcode,
            IRETURN | LRETURN | FRETURN | DRETURN | ARETURN | RETURN | ATHROW | GOTO | GOTO_W | RET
        ) || matches!(self.operand, Operand::TableSwitch { .. } | Operand::LookupSwitch { .. })
    }

    /// Render as a javap-like line, resolving constant pool operands
    pub fn render(&self, cp: &ConstantPool) -> String {
        let name = opcodes::mnemonic(self.opcode);
        match &self.operand {
            Operand::None => name.to_owned(),
            Operand::Byte(value) => match self.opcode {
                BIPUSH => format!("{name} {}", *value as i8),
                LDC => format!("{name} {}", cp.describe(*value as u16)),
                _ => format!("{name} {value}"),
            },
            Operand::Short(value) => match self.opcode {
                SIPUSH => format!("{name} {}", *value as i16),
                _ => format!("{name} {}", cp.describe(*value)),
            },
            Operand::Local { index, .. } => format!("{name} {index}"),
            Operand::Iinc { index, delta, .. } => format!("{name} {index} {delta}"),
            Operand::Branch(target) | Operand::BranchWide(target) => format!("{name} {target}"),
            Operand::TableSwitch { default, low, targets } => {
                format!("{name} {low}..{} default {default}", low + targets.len() as i32 - 1)
            }
            Operand::LookupSwitch { default, pairs } => {
                format!("{name} {} cases default {default}", pairs.len())
            }
            Operand::InvokeInterface { index, count } => format!("{name} {} {count}", cp.describe(*index)),
            Operand::InvokeDynamic { index } => format!("{name} #{index}"),
            Operand::MultiANewArray { index, dims } => format!("{name} {} {dims}", cp.describe(*index)),
        }
    }
}

fn operand_of(opcode: u8, pc: usize, reader: &mut ByteReader<'_>) -> ClassFormatResult<Operand> {
    let at = |offset: i64| -> ClassFormatResult<Label> {
        let target = pc as i64 + offset;
        if target < 0 || target > u32::MAX as i64 {
            return Err(ClassFormatError::InvalidBranchTarget { target });
        }
        Ok(target as Label)
    };
    Ok(match opcode {
        BIPUSH | LDC | NEWARRAY => Operand::Byte(reader.u8()?),
        SIPUSH | LDC_W | LDC2_W | GETSTATIC..=INVOKESTATIC | NEW | ANEWARRAY | CHECKCAST | INSTANCEOF => {
            Operand::Short(reader.u16()?)
        }
        ILOAD..=ALOAD | ISTORE..=ASTORE | RET => Operand::Local { index: reader.u8()? as u16, wide: false },
        IINC => Operand::Iinc { index: reader.u8()? as u16, delta: reader.u8()? as i8 as i16, wide: false },
        IFEQ..=JSR | IFNULL | IFNONNULL => Operand::Branch(at(reader.i16()? as i64)?),
        GOTO_W | JSR_W => Operand::BranchWide(at(reader.i32()? as i64)?),
        TABLESWITCH => {
            reader.skip((4 - (pc + 1) % 4) % 4)?;
            let default = at(reader.i32()? as i64)?;
            let low = reader.i32()?;
            let high = reader.i32()?;
            let count = (high as i64 - low as i64 + 1).max(0) as usize;
            let mut targets = Vec::with_capacity(count);
            for _ in 0..count {
                targets.push(at(reader.i32()? as i64)?);
            }
            Operand::TableSwitch { default, low, targets }
        }
        LOOKUPSWITCH => {
            reader.skip((4 - (pc + 1) % 4) % 4)?;
            let default = at(reader.i32()? as i64)?;
            let count = reader.i32()?.max(0) as usize;
            let mut pairs = Vec::with_capacity(count);
            for _ in 0..count {
                let key = reader.i32()?;
                pairs.push((key, at(reader.i32()? as i64)?));
            }
            Operand::LookupSwitch { default, pairs }
        }
        INVOKEINTERFACE => {
            let index = reader.u16()?;
            let count = reader.u8()?;
            reader.u8()?;
            Operand::InvokeInterface { index, count }
        }
        INVOKEDYNAMIC => {
            let index = reader.u16()?;
            reader.u16()?;
            Operand::InvokeDynamic { index }
        }
        MULTIANEWARRAY => Operand::MultiANewArray { index: reader.u16()?, dims: reader.u8()? },
        _ if opcode <= LAST_OPCODE && opcode != WIDE => Operand::None,
        _ => return Err(ClassFormatError::UnknownOpcode { opcode, pc }),
    })
}

/// Decode a code array into `(pc, instruction)` pairs; branch labels are absolute offsets
pub fn decode(code: &[u8]) -> ClassFormatResult<Vec<(u32, Insn)>> {
    let mut reader = ByteReader::new(code);
    let mut insns = Vec::new();
    while !reader.is_at_end() {
        let pc = reader.position();
        let opcode = reader.u8()?;
        let insn = if opcode == WIDE {
            let inner = reader.u8()?;
            let index = reader.u16()?;
            let operand = match inner {
                IINC => Operand::Iinc { index, delta: reader.i16()?, wide: true },
                ILOAD..=ALOAD | ISTORE..=ASTORE | RET => Operand::Local { index, wide: true },
                other => return Err(ClassFormatError::UnknownOpcode { opcode: other, pc }),
            };
            Insn { opcode: inner, operand }
        } else {
            Insn { opcode, operand: operand_of(opcode, pc, &mut reader)? }
        };
        insns.push((pc as u32, insn));
    }
    Ok(insns)
}

/// Compute instruction offsets; the returned vector has one extra entry holding the code length
pub fn layout(insns: &[Insn]) -> Vec<u32> {
    let mut pcs = Vec::with_capacity(insns.len() + 1);
    let mut pc = 0u32;
    for insn in insns {
        pcs.push(pc);
        pc += insn.size_at(pc);
    }
    pcs.push(pc);
    pcs
}

/// Encode instructions whose labels are indices into `pcs` (as produced by [`layout`])
pub fn encode(insns: &[Insn], pcs: &[u32]) -> ClassFormatResult<Vec<u8>> {
    let total = pcs.last().copied().unwrap_or(0) as usize;
    if total > u16::MAX as usize {
        return Err(ClassFormatError::CodeTooLarge(total));
    }
    let mut code = Vec::with_capacity(total);
    for (i, insn) in insns.iter().enumerate() {
        let pc = pcs[i];
        let offset = |label: Label| -> ClassFormatResult<i64> {
            let target = pcs
                .get(label as usize)
                .ok_or(ClassFormatError::InvalidBranchTarget { target: label as i64 })?;
            Ok(*target as i64 - pc as i64)
        };
        match &insn.operand {
            Operand::Local { wide: true, index } => {
                code.push(WIDE);
                code.push(insn.opcode);
                code.extend_from_slice(&index.to_be_bytes());
                continue;
            }
            Operand::Iinc { wide: true, index, delta } => {
                code.push(WIDE);
                code.push(insn.opcode);
                code.extend_from_slice(&index.to_be_bytes());
                code.extend_from_slice(&delta.to_be_bytes());
                continue;
            }
            _ => code.push(insn.opcode),
        }
        match &insn.operand {
            Operand::None | Operand::Local { wide: true, .. } | Operand::Iinc { wide: true, .. } => {}
            Operand::Byte(value) => code.push(*value),
            Operand::Short(value) => code.extend_from_slice(&value.to_be_bytes()),
            Operand::Local { index, .. } => code.push(*index as u8),
            Operand::Iinc { index, delta, .. } => {
                code.push(*index as u8);
                code.push(*delta as i8 as u8);
            }
            Operand::Branch(label) => {
                let delta = offset(*label)?;
                if delta < i16::MIN as i64 || delta > i16::MAX as i64 {
                    return Err(ClassFormatError::BranchTooFar { offset: delta });
                }
                code.extend_from_slice(&(delta as i16).to_be_bytes());
            }
            Operand::BranchWide(label) => code.extend_from_slice(&(offset(*label)? as i32).to_be_bytes()),
            Operand::TableSwitch { default, low, targets } => {
                code.resize(code.len() + ((4 - (pc + 1) % 4) % 4) as usize, 0);
                code.extend_from_slice(&(offset(*default)? as i32).to_be_bytes());
                code.extend_from_slice(&low.to_be_bytes());
                code.extend_from_slice(&(low + targets.len() as i32 - 1).to_be_bytes());
                for target in targets {
                    code.extend_from_slice(&(offset(*target)? as i32).to_be_bytes());
                }
            }
            Operand::LookupSwitch { default, pairs } => {
                code.resize(code.len() + ((4 - (pc + 1) % 4) % 4) as usize, 0);
                code.extend_from_slice(&(offset(*default)? as i32).to_be_bytes());
                code.extend_from_slice(&(pairs.len() as i32).to_be_bytes());
                for (key, target) in pairs {
                    code.extend_from_slice(&key.to_be_bytes());
                    code.extend_from_slice(&(offset(*target)? as i32).to_be_bytes());
                }
            }
            Operand::InvokeInterface { index, count } => {
                code.extend_from_slice(&index.to_be_bytes());
                code.push(*count);
                code.push(0);
            }
            Operand::InvokeDynamic { index } => {
                code.extend_from_slice(&index.to_be_bytes());
                code.extend_from_slice(&[0, 0]);
            }
            Operand::MultiANewArray { index, dims } => {
                code.extend_from_slice(&index.to_be_bytes());
                code.push(*dims);
            }
        }
    }
    Ok(code)
}

/// javap-style listing of a code array
pub fn disassemble(code: &[u8], cp: &ConstantPool) -> ClassFormatResult<Vec<(u32, String)>> {
    Ok(decode(code)?.into_iter().map(|(pc, insn)| (pc, insn.render(cp))).collect())
}
