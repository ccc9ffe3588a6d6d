//! Rewriting of existing method bodies
//!
//! A body is decoded into instructions whose branch targets, exception
//! ranges, debug tables and verifier frames refer to instruction indices.
//! Edits splice instructions in; re-encoding recomputes every offset,
//! including switch padding and `Uninitialized` frame entries.

use std::collections::HashMap;

use super::attribute::{
    line_numbers_to_bytes, local_variables_to_bytes, parse_line_numbers, parse_local_variables, AttributeInfo,
    CodeAttribute, ExceptionTableEntry, LineNumberEntry, LocalVariableEntry,
};
use super::constpool::ConstantPool;
use super::defs::attribute_names;
use super::error::{ClassFormatError, ClassFormatResult};
use super::frame::{decode_frames, encode_frames, parse_stack_map_table, stack_map_table_to_bytes, FrameState};
use super::frame::VerificationType as VT;
use super::gen::EmittedCode;
use super::insn::{self, Insn};
use super::opcodes::POP;

#[derive(Debug, Clone, PartialEq)]
struct IndexedFrame {
    index: usize,
    locals: Vec<VT>,
    stack: Vec<VT>,
}

impl IndexedFrame {
    fn map<F>(&self, f: &F) -> ClassFormatResult<IndexedFrame>
    where
        F: Fn(usize) -> ClassFormatResult<usize>,
    {
        let convert = |items: &[VT]| -> ClassFormatResult<Vec<VT>> {
            items
                .iter()
                .map(|vt| match vt {
                    VT::Uninitialized(at) => Ok(VT::Uninitialized(f(*at as usize)? as u16)),
                    other => Ok(other.clone()),
                })
                .collect()
        };
        Ok(IndexedFrame { index: f(self.index)?, locals: convert(&self.locals)?, stack: convert(&self.stack)? })
    }
}

/// Straight-line or branching code ready to be spliced into another body
#[derive(Debug, Clone)]
pub struct Fragment {
    insns: Vec<Insn>,
    frames: Vec<IndexedFrame>,
    max_stack: u16,
    max_locals: u16,
}

fn index_map(decoded: &[(u32, Insn)], code_len: usize) -> HashMap<u32, usize> {
    let mut map: HashMap<u32, usize> = decoded.iter().enumerate().map(|(i, (pc, _))| (*pc, i)).collect();
    map.insert(code_len as u32, decoded.len());
    map
}

fn lookup(map: &HashMap<u32, usize>, pc: u32) -> ClassFormatResult<usize> {
    map.get(&pc).copied().ok_or(ClassFormatError::InvalidBranchTarget { target: pc as i64 })
}

fn frame_at_pc(state: &FrameState, map: &HashMap<u32, usize>) -> ClassFormatResult<IndexedFrame> {
    let raw = IndexedFrame { index: state.pc as usize, locals: state.locals.clone(), stack: state.stack.clone() };
    raw.map(&|pc| lookup(map, pc as u32))
}

impl Fragment {
    pub fn from_emitted(emitted: &EmittedCode) -> ClassFormatResult<Self> {
        let decoded = insn::decode(&emitted.code)?;
        let map = index_map(&decoded, emitted.code.len());
        let mut insns = Vec::with_capacity(decoded.len());
        for (_, mut insn) in decoded {
            insn.map_labels(|pc| lookup(&map, pc).map(|i| i as u32))?;
            insns.push(insn);
        }
        let frames = emitted.frames.iter().map(|f| frame_at_pc(f, &map)).collect::<ClassFormatResult<_>>()?;
        Ok(Self { insns, frames, max_stack: emitted.max_stack, max_locals: emitted.max_locals })
    }

    pub fn len(&self) -> usize {
        self.insns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Handler {
    start: usize,
    end: usize,
    handler: usize,
    catch_type: u16,
}

#[derive(Debug, Clone, Copy)]
struct LocalRange {
    start: usize,
    end: usize,
    entry: LocalVariableEntry,
}

/// A method body with every offset expressed as an instruction index
#[derive(Debug, Clone)]
struct Body {
    insns: Vec<Insn>,
    max_stack: u16,
    max_locals: u16,
    handlers: Vec<Handler>,
    frames: Vec<IndexedFrame>,
    lines: Vec<(usize, u16)>,
    local_vars: Vec<LocalRange>,
    local_types: Vec<LocalRange>,
    other: Vec<AttributeInfo>,
}

impl Body {
    fn decode(code: &CodeAttribute, cp: &ConstantPool, initial_locals: &[VT]) -> ClassFormatResult<Self> {
        let decoded = insn::decode(&code.code)?;
        let map = index_map(&decoded, code.code.len());
        let mut insns = Vec::with_capacity(decoded.len());
        for (_, mut insn) in decoded {
            insn.map_labels(|pc| lookup(&map, pc).map(|i| i as u32))?;
            insns.push(insn);
        }
        let handlers = code
            .exception_table
            .iter()
            .map(|e| {
                Ok(Handler {
                    start: lookup(&map, e.start_pc as u32)?,
                    end: lookup(&map, e.end_pc as u32)?,
                    handler: lookup(&map, e.handler_pc as u32)?,
                    catch_type: e.catch_type,
                })
            })
            .collect::<ClassFormatResult<_>>()?;

        let mut body = Body {
            insns,
            max_stack: code.max_stack,
            max_locals: code.max_locals,
            handlers,
            frames: Vec::new(),
            lines: Vec::new(),
            local_vars: Vec::new(),
            local_types: Vec::new(),
            other: Vec::new(),
        };
        let ranges = |entries: Vec<LocalVariableEntry>| -> ClassFormatResult<Vec<LocalRange>> {
            entries
                .into_iter()
                .map(|entry| {
                    Ok(LocalRange {
                        start: lookup(&map, entry.start_pc as u32)?,
                        end: lookup(&map, entry.start_pc as u32 + entry.length as u32)?,
                        entry,
                    })
                })
                .collect()
        };
        for attribute in &code.attributes {
            match cp.utf8(attribute.name_index)? {
                attribute_names::STACK_MAP_TABLE => {
                    let states = decode_frames(&parse_stack_map_table(&attribute.info)?, initial_locals);
                    body.frames = states.iter().map(|s| frame_at_pc(s, &map)).collect::<ClassFormatResult<_>>()?;
                }
                attribute_names::LINE_NUMBER_TABLE => {
                    for entry in parse_line_numbers(&attribute.info)? {
                        body.lines.push((lookup(&map, entry.start_pc as u32)?, entry.line_number));
                    }
                }
                attribute_names::LOCAL_VARIABLE_TABLE => {
                    body.local_vars.extend(ranges(parse_local_variables(&attribute.info)?)?);
                }
                attribute_names::LOCAL_VARIABLE_TYPE_TABLE => {
                    body.local_types.extend(ranges(parse_local_variables(&attribute.info)?)?);
                }
                _ => body.other.push(attribute.clone()),
            }
        }
        Ok(body)
    }

    fn encode(mut self, cp: &mut ConstantPool, initial_locals: &[VT], emit_frames: bool) -> ClassFormatResult<CodeAttribute> {
        let pcs = insn::layout(&self.insns);
        let code = insn::encode(&self.insns, &pcs)?;
        let pc = |index: usize| -> ClassFormatResult<u16> {
            pcs.get(index)
                .map(|p| *p as u16)
                .ok_or(ClassFormatError::InvalidBranchTarget { target: index as i64 })
        };

        let mut attribute = CodeAttribute::new(self.max_stack, self.max_locals, code);
        for h in &self.handlers {
            attribute
                .exception_table
                .push(ExceptionTableEntry::new(pc(h.start)?, pc(h.end)?, pc(h.handler)?, h.catch_type));
        }

        if !self.lines.is_empty() {
            let entries = self
                .lines
                .iter()
                .map(|(index, line)| Ok(LineNumberEntry { start_pc: pc(*index)?, line_number: *line }))
                .collect::<ClassFormatResult<Vec<_>>>()?;
            let name = cp.add_utf8(attribute_names::LINE_NUMBER_TABLE);
            attribute.attributes.push(AttributeInfo::new(name, line_numbers_to_bytes(&entries)));
        }
        for (ranges, attr_name) in [
            (&self.local_vars, attribute_names::LOCAL_VARIABLE_TABLE),
            (&self.local_types, attribute_names::LOCAL_VARIABLE_TYPE_TABLE),
        ] {
            if ranges.is_empty() {
                continue;
            }
            let entries = ranges
                .iter()
                .map(|r| {
                    let start = pc(r.start)?;
                    Ok(LocalVariableEntry { start_pc: start, length: pc(r.end)? - start, ..r.entry })
                })
                .collect::<ClassFormatResult<Vec<_>>>()?;
            let name = cp.add_utf8(attr_name);
            attribute.attributes.push(AttributeInfo::new(name, local_variables_to_bytes(&entries)));
        }

        self.frames.sort_by_key(|f| f.index);
        self.frames.dedup_by_key(|f| f.index);
        if emit_frames && !self.frames.is_empty() {
            let states = self
                .frames
                .iter()
                .map(|f| {
                    let at = f.map(&|index| pc(index).map(|p| p as usize))?;
                    Ok(FrameState { pc: at.index as u32, locals: at.locals, stack: at.stack })
                })
                .collect::<ClassFormatResult<Vec<_>>>()?;
            let name = cp.add_utf8(attribute_names::STACK_MAP_TABLE);
            let table = stack_map_table_to_bytes(&encode_frames(&states, initial_locals));
            attribute.attributes.push(AttributeInfo::new(name, table));
        }
        attribute.attributes.extend(self.other);
        Ok(attribute)
    }
}

/// Place `prologue` before the first instruction of `code`
pub fn insert_prologue(
    code: &CodeAttribute,
    prologue: &Fragment,
    cp: &mut ConstantPool,
    initial_locals: &[VT],
    emit_frames: bool,
) -> ClassFormatResult<CodeAttribute> {
    let mut body = Body::decode(code, cp, initial_locals)?;
    let shift = prologue.len();
    let moved = |index: usize| -> ClassFormatResult<usize> { Ok(index + shift) };

    let mut insns = prologue.insns.clone();
    for mut insn in body.insns.drain(..) {
        insn.map_labels(|label| Ok(label + shift as u32))?;
        insns.push(insn);
    }
    body.insns = insns;

    for h in body.handlers.iter_mut() {
        h.start += shift;
        h.end += shift;
        h.handler += shift;
    }
    for (index, _) in body.lines.iter_mut() {
        *index += shift;
    }
    for range in body.local_vars.iter_mut().chain(body.local_types.iter_mut()) {
        // entries live from method entry keep covering the prologue
        if range.start != 0 {
            range.start += shift;
        }
        range.end += shift;
    }

    let original_frames = body.frames.iter().map(|f| f.map(&moved)).collect::<ClassFormatResult<Vec<_>>>()?;
    let mut frames: Vec<IndexedFrame> = prologue
        .frames
        .iter()
        .filter(|f| !original_frames.iter().any(|o| o.index == f.index))
        .cloned()
        .collect();
    frames.extend(original_frames);
    body.frames = frames;

    body.max_stack = body.max_stack.max(prologue.max_stack);
    body.max_locals = body.max_locals.max(prologue.max_locals);
    body.encode(cp, initial_locals, emit_frames)
}

/// Replace every instruction with `return_opcode` by `pop` followed by `replacement`
pub fn replace_returns(
    code: &CodeAttribute,
    return_opcode: u8,
    replacement: &Fragment,
    cp: &mut ConstantPool,
    initial_locals: &[VT],
    emit_frames: bool,
) -> ClassFormatResult<CodeAttribute> {
    let mut body = Body::decode(code, cp, initial_locals)?;
    let expansion = replacement.len() + 1;

    let mut remap = Vec::with_capacity(body.insns.len() + 1);
    let mut next = 0usize;
    for insn in &body.insns {
        remap.push(next);
        next += if insn.opcode == return_opcode { expansion } else { 1 };
    }
    remap.push(next);
    let moved = |index: usize| -> ClassFormatResult<usize> {
        remap.get(index).copied().ok_or(ClassFormatError::InvalidBranchTarget { target: index as i64 })
    };

    let mut insns = Vec::with_capacity(next);
    let mut frames = Vec::new();
    for (old, mut insn) in body.insns.drain(..).enumerate() {
        if insn.opcode == return_opcode {
            let start = remap[old];
            insns.push(Insn::simple(POP));
            for mut spliced in replacement.insns.iter().cloned() {
                spliced.map_labels(|label| Ok(label + start as u32 + 1))?;
                insns.push(spliced);
            }
            for frame in &replacement.frames {
                frames.push(frame.map(&|index| Ok(index + start + 1))?);
            }
        } else {
            insn.map_labels(|label| moved(label as usize).map(|i| i as u32))?;
            insns.push(insn);
        }
    }
    body.insns = insns;

    for h in body.handlers.iter_mut() {
        h.start = moved(h.start)?;
        h.end = moved(h.end)?;
        h.handler = moved(h.handler)?;
    }
    for (index, _) in body.lines.iter_mut() {
        *index = moved(*index)?;
    }
    for range in body.local_vars.iter_mut().chain(body.local_types.iter_mut()) {
        range.start = moved(range.start)?;
        range.end = moved(range.end)?;
    }
    for frame in &body.frames {
        frames.push(frame.map(&moved)?);
    }
    body.frames = frames;

    body.max_stack = body.max_stack.saturating_add(replacement.max_stack);
    body.max_locals = body.max_locals.max(replacement.max_locals);
    body.encode(cp, initial_locals, emit_frames)
}
