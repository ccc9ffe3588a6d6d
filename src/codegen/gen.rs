//! Lowering of statement trees to bytecode
//!
//! The emitter simulates the operand stack and local slots while it writes
//! instructions, so `max_stack`/`max_locals` fall out of emission and a
//! verifier frame can be recorded at every branch target.

use std::collections::BTreeMap;

use crate::ast::TypeName;
use crate::error::{Error, Result};

use super::constpool::ConstantPool;
use super::defs::CONSTRUCTOR_METHOD_NAME;
use super::descriptor::{method_descriptor, parameter_slots};
use super::frame::{slots_to_frame_locals, slots_to_frame_stack, FrameState, VerificationType as VT};
use super::opcodes::{array_types::*, *};
use super::tree::{ArithOp, CompareOp, Expr, FieldRef, InvokeKind, MethodRef, Stmt};

/// Signature and ownership of the method being emitted
#[derive(Debug, Clone)]
pub struct MethodContext {
    pub class_name: TypeName,
    pub params: Vec<TypeName>,
    pub ret: TypeName,
    pub is_static: bool,
    pub is_constructor: bool,
}

impl MethodContext {
    pub fn new(class_name: TypeName, params: Vec<TypeName>, ret: TypeName) -> Self {
        Self { class_name, params, ret, is_static: false, is_constructor: false }
    }

    pub fn constructor(class_name: TypeName, params: Vec<TypeName>) -> Self {
        Self { class_name, params, ret: TypeName::void(), is_static: false, is_constructor: true }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Local slot and type of a 1-based parameter
    pub fn param_slot(&self, index: u16) -> Option<(u16, &TypeName)> {
        let position = (index as usize).checked_sub(1)?;
        let ty = self.params.get(position)?;
        let base = if self.is_static { 0 } else { 1 };
        Some((base + parameter_slots(&self.params[..position]), ty))
    }

    /// Slot-indexed locals on method entry
    pub fn initial_slots(&self, cp: &mut ConstantPool) -> Vec<VT> {
        let mut slots = Vec::new();
        if !self.is_static {
            if self.is_constructor {
                slots.push(VT::UninitializedThis);
            } else {
                slots.push(VT::Object(cp.add_class(&self.class_name.internal_name())));
            }
        }
        for param in &self.params {
            push_slots(&mut slots, verification_type(cp, param));
        }
        slots
    }

    /// Entry locals in frame encoding
    pub fn initial_frame_locals(&self, cp: &mut ConstantPool) -> Vec<VT> {
        slots_to_frame_locals(&self.initial_slots(cp))
    }
}

pub fn verification_type(cp: &mut ConstantPool, ty: &TypeName) -> VT {
    if ty.is_null() {
        return VT::Null;
    }
    if ty.is_int_like() {
        return VT::Integer;
    }
    match ty.as_str() {
        "long" => VT::Long,
        "float" => VT::Float,
        "double" => VT::Double,
        _ => VT::Object(cp.add_class(&ty.internal_name())),
    }
}

fn push_slots(slots: &mut Vec<VT>, vt: VT) {
    let wide = vt.is_wide();
    slots.push(vt);
    if wide {
        slots.push(VT::Top);
    }
}

/// Bytecode produced for a body or fragment
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedCode {
    pub code: Vec<u8>,
    pub max_stack: u16,
    pub max_locals: u16,
    pub frames: Vec<FrameState>,
}

/// Lower a complete method body; a reachable end of a void method gets an implicit `return`
pub fn emit_method(cp: &mut ConstantPool, ctx: &MethodContext, body: &[Stmt]) -> Result<EmittedCode> {
    let mut gen = Gen::new(cp, ctx);
    gen.emit_block(body)?;
    if gen.reachable {
        if !ctx.ret.is_void() {
            return Err(Error::codegen(format!("missing return statement in method returning {}", ctx.ret)));
        }
        gen.op(RETURN);
        gen.reachable = false;
    }
    gen.finish()
}

/// Lower a fragment that falls through into code placed after it
pub fn emit_fragment(cp: &mut ConstantPool, ctx: &MethodContext, body: &[Stmt]) -> Result<EmittedCode> {
    let mut gen = Gen::new(cp, ctx);
    gen.emit_block(body)?;
    if !gen.reachable {
        let pc = gen.pc();
        let entry = State { locals: gen.entry_locals.clone(), stack: Vec::new() };
        gen.frames.insert(pc, entry);
    }
    gen.finish()
}

#[derive(Debug, Clone, PartialEq)]
struct State {
    locals: Vec<VT>,
    stack: Vec<VT>,
}

#[derive(Debug, Default)]
struct LabelInfo {
    pc: Option<u32>,
    state: Option<State>,
    fixups: Vec<u32>,
}

#[derive(Debug, Clone, Copy)]
struct LabelId(usize);

struct Gen<'a> {
    cp: &'a mut ConstantPool,
    ctx: &'a MethodContext,
    code: Vec<u8>,
    state: State,
    entry_locals: Vec<VT>,
    reachable: bool,
    max_stack: usize,
    max_locals: usize,
    next_local: u16,
    labels: Vec<LabelInfo>,
    named_locals: Vec<(String, u16, TypeName)>,
    frames: BTreeMap<u32, State>,
}

impl<'a> Gen<'a> {
    fn new(cp: &'a mut ConstantPool, ctx: &'a MethodContext) -> Self {
        let locals = ctx.initial_slots(cp);
        let max_locals = locals.len();
        Self {
            cp,
            ctx,
            code: Vec::new(),
            entry_locals: locals.clone(),
            state: State { locals, stack: Vec::new() },
            reachable: true,
            max_stack: 0,
            max_locals,
            next_local: max_locals as u16,
            labels: Vec::new(),
            named_locals: Vec::new(),
            frames: BTreeMap::new(),
        }
    }

    fn pc(&self) -> u32 {
        self.code.len() as u32
    }

    fn op(&mut self, opcode: u8) {
        self.code.push(opcode);
    }

    fn op_u8(&mut self, opcode: u8, value: u8) {
        self.code.push(opcode);
        self.code.push(value);
    }

    fn op_u16(&mut self, opcode: u8, value: u16) {
        self.code.push(opcode);
        self.code.extend_from_slice(&value.to_be_bytes());
    }

    fn push(&mut self, vt: VT) {
        push_slots(&mut self.state.stack, vt);
        self.max_stack = self.max_stack.max(self.state.stack.len());
    }

    fn push_type(&mut self, ty: &TypeName) {
        if !ty.is_void() {
            let vt = verification_type(self.cp, ty);
            self.push(vt);
        }
    }

    fn pop(&mut self, slots: usize) -> Result<()> {
        let len = self.state.stack.len();
        if len < slots {
            return Err(Error::codegen(format!("operand stack underflow in {}", self.ctx.class_name)));
        }
        self.state.stack.truncate(len - slots);
        Ok(())
    }

    fn type_of(&self, expr: &Expr) -> Result<TypeName> {
        expr.value_type(&self.ctx.class_name, &self.ctx.params)
            .ok_or_else(|| Error::codegen(format!("cannot type expression `{expr}`")))
    }

    fn replace_all(&mut self, from: &VT, to: &VT) {
        for slot in self.state.locals.iter_mut().chain(self.state.stack.iter_mut()) {
            if slot == from {
                *slot = to.clone();
            }
        }
    }

    fn set_local(&mut self, slot: u16, vt: VT) {
        let wide = vt.is_wide();
        let needed = slot as usize + if wide { 2 } else { 1 };
        if self.state.locals.len() < needed {
            self.state.locals.resize(needed, VT::Top);
        }
        self.state.locals[slot as usize] = vt;
        if wide {
            self.state.locals[slot as usize + 1] = VT::Top;
        }
        self.max_locals = self.max_locals.max(needed);
    }

    fn local_op(&mut self, short_base: u8, opcode: u8, slot: u16) {
        if slot <= 3 {
            self.op(short_base + slot as u8);
        } else if slot <= u8::MAX as u16 {
            self.op_u8(opcode, slot as u8);
        } else {
            self.op(WIDE);
            self.op_u16(opcode, slot);
        }
    }

    fn load(&mut self, ty: &TypeName, slot: u16) {
        let (short_base, opcode) = if ty.is_int_like() {
            (ILOAD_0, ILOAD)
        } else {
            match ty.as_str() {
                "long" => (LLOAD_0, LLOAD),
                "float" => (FLOAD_0, FLOAD),
                "double" => (DLOAD_0, DLOAD),
                _ => (ALOAD_0, ALOAD),
            }
        };
        self.local_op(short_base, opcode, slot);
        self.push_type(ty);
    }

    fn store(&mut self, ty: &TypeName, slot: u16) -> Result<()> {
        let (short_base, opcode) = if ty.is_int_like() {
            (ISTORE_0, ISTORE)
        } else {
            match ty.as_str() {
                "long" => (LSTORE_0, LSTORE),
                "float" => (FSTORE_0, FSTORE),
                "double" => (DSTORE_0, DSTORE),
                _ => (ASTORE_0, ASTORE),
            }
        };
        self.pop(ty.slot_size() as usize)?;
        self.local_op(short_base, opcode, slot);
        let vt = verification_type(self.cp, ty);
        self.set_local(slot, vt);
        Ok(())
    }

    fn ldc(&mut self, index: u16) {
        if index <= u8::MAX as u16 {
            self.op_u8(LDC, index as u8);
        } else {
            self.op_u16(LDC_W, index);
        }
    }

    fn push_int(&mut self, value: i32) {
        match value {
            -1..=5 => self.op((ICONST_0 as i32 + value) as u8),
            -128..=127 => self.op_u8(BIPUSH, value as i8 as u8),
            -32768..=32767 => self.op_u16(SIPUSH, value as i16 as u16),
            _ => {
                let index = self.cp.add_integer(value);
                self.ldc(index);
            }
        }
        self.push(VT::Integer);
    }

    fn new_label(&mut self) -> LabelId {
        self.labels.push(LabelInfo::default());
        LabelId(self.labels.len() - 1)
    }

    fn branch(&mut self, opcode: u8, label: LabelId, pops: usize) -> Result<()> {
        self.pop(pops)?;
        let pc = self.pc();
        self.op_u16(opcode, 0);
        let state = self.state.clone();
        let info = &mut self.labels[label.0];
        info.state = Some(match info.state.take() {
            Some(existing) => merge(existing, state)?,
            None => state,
        });
        info.fixups.push(pc);
        if opcode == GOTO {
            self.reachable = false;
        }
        Ok(())
    }

    fn place(&mut self, label: LabelId) -> Result<()> {
        let pc = self.pc();
        let incoming = self.labels[label.0].state.clone();
        let targeted = !self.labels[label.0].fixups.is_empty();
        self.labels[label.0].pc = Some(pc);
        let state = match (self.reachable, incoming) {
            (true, Some(jumped)) => merge(self.state.clone(), jumped)?,
            (true, None) => return Ok(()),
            (false, Some(jumped)) => jumped,
            (false, None) => return Ok(()),
        };
        if targeted {
            self.frames.insert(pc, state.clone());
        }
        self.state = state;
        self.reachable = true;
        Ok(())
    }

    fn finish(mut self) -> Result<EmittedCode> {
        for info in &self.labels {
            if info.fixups.is_empty() {
                continue;
            }
            let target = info.pc.ok_or_else(|| Error::internal("branch to a label that was never placed"))?;
            for &at in &info.fixups {
                let offset = target as i64 - at as i64;
                if offset < i16::MIN as i64 || offset > i16::MAX as i64 {
                    return Err(Error::codegen(format!("branch offset {offset} out of range")));
                }
                let bytes = (offset as i16).to_be_bytes();
                self.code[at as usize + 1] = bytes[0];
                self.code[at as usize + 2] = bytes[1];
            }
        }
        if self.code.len() > u16::MAX as usize {
            return Err(Error::codegen(format!("code too large: {} bytes", self.code.len())));
        }
        let frames = self
            .frames
            .into_iter()
            .map(|(pc, state)| FrameState {
                pc,
                locals: slots_to_frame_locals(&state.locals),
                stack: slots_to_frame_stack(&state.stack),
            })
            .collect();
        Ok(EmittedCode {
            code: self.code,
            max_stack: self.max_stack as u16,
            max_locals: self.max_locals as u16,
            frames,
        })
    }

    fn emit_block(&mut self, body: &[Stmt]) -> Result<()> {
        for stmt in body {
            if !self.reachable {
                return Err(Error::codegen(format!("unreachable statement `{stmt}`")));
            }
            self.emit_stmt(stmt)?;
        }
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::SetField { target, field, value } => {
                self.emit_expr(target)?;
                self.emit_expr(value)?;
                let index = self.field_ref(field);
                self.op_u16(PUTFIELD, index);
                self.pop(1 + field.ty.slot_size() as usize)
            }
            Stmt::DeclareLocal { name, ty, value } => {
                self.emit_expr(value)?;
                let slot = self.next_local;
                self.next_local += ty.slot_size();
                self.named_locals.push((name.clone(), slot, ty.clone()));
                self.store(ty, slot)
            }
            Stmt::SetLocal { name, value } => {
                let (slot, ty) = self.lookup_local(name)?;
                self.emit_expr(value)?;
                self.store(&ty, slot)
            }
            Stmt::Expr(expr) => {
                self.emit_expr(expr)?;
                match self.type_of(expr)?.slot_size() {
                    0 => Ok(()),
                    1 => {
                        self.op(POP);
                        self.pop(1)
                    }
                    _ => {
                        self.op(POP2);
                        self.pop(2)
                    }
                }
            }
            Stmt::If { cond, then } => {
                let skip = self.new_label();
                self.emit_cond(cond, skip)?;
                self.emit_block(then)?;
                self.place(skip)
            }
            Stmt::Return(None) => {
                if !self.ctx.ret.is_void() {
                    return Err(Error::codegen(format!("missing return value of type {}", self.ctx.ret)));
                }
                self.op(RETURN);
                self.reachable = false;
                Ok(())
            }
            Stmt::Return(Some(expr)) => {
                let ret = self.ctx.ret.clone();
                let opcode = if ret.is_void() {
                    return Err(Error::codegen("void method cannot return a value"));
                } else if ret.is_int_like() {
                    IRETURN
                } else {
                    match ret.as_str() {
                        "long" => LRETURN,
                        "float" => FRETURN,
                        "double" => DRETURN,
                        _ => ARETURN,
                    }
                };
                self.emit_expr(expr)?;
                self.op(opcode);
                self.pop(ret.slot_size() as usize)?;
                self.reachable = false;
                Ok(())
            }
            Stmt::Throw(expr) => {
                self.emit_expr(expr)?;
                self.op(ATHROW);
                self.pop(1)?;
                self.reachable = false;
                Ok(())
            }
            Stmt::SuperInit { owner, params, args } => {
                self.emit_this()?;
                self.emit_args(params, args)?;
                let descriptor = method_descriptor(params, &TypeName::void());
                let index = self.cp.add_method_ref(&owner.internal_name(), CONSTRUCTOR_METHOD_NAME, &descriptor);
                self.op_u16(INVOKESPECIAL, index);
                self.pop(parameter_slots(params) as usize + 1)?;
                let this = VT::Object(self.cp.add_class(&self.ctx.class_name.internal_name()));
                self.replace_all(&VT::UninitializedThis, &this);
                Ok(())
            }
        }
    }

    fn lookup_local(&self, name: &str) -> Result<(u16, TypeName)> {
        self.named_locals
            .iter()
            .rev()
            .find(|(n, _, _)| n == name)
            .map(|(_, slot, ty)| (*slot, ty.clone()))
            .ok_or_else(|| Error::codegen(format!("unknown local variable `{name}`")))
    }

    fn field_ref(&mut self, field: &FieldRef) -> u16 {
        self.cp.add_field_ref(&field.owner.internal_name(), &field.name, &field.ty.descriptor())
    }

    fn emit_this(&mut self) -> Result<()> {
        if self.ctx.is_static {
            return Err(Error::codegen("`this` is not available in a static method"));
        }
        self.op(ALOAD_0);
        let vt = self.state.locals.first().cloned().unwrap_or(VT::Top);
        self.push(vt);
        Ok(())
    }

    fn emit_args(&mut self, params: &[TypeName], args: &[Expr]) -> Result<()> {
        if params.len() != args.len() {
            return Err(Error::codegen(format!(
                "expected {} arguments but found {}",
                params.len(),
                args.len()
            )));
        }
        for arg in args {
            self.emit_expr(arg)?;
        }
        Ok(())
    }

    fn emit_invoke(&mut self, kind: InvokeKind, method: &MethodRef, target: Option<&Expr>, args: &[Expr]) -> Result<()> {
        if kind != InvokeKind::Static {
            let target = target.ok_or_else(|| Error::codegen(format!("call to {} needs a receiver", method.name)))?;
            self.emit_expr(target)?;
        }
        self.emit_args(&method.params, args)?;
        let owner = method.owner.internal_name();
        let descriptor = method.descriptor();
        let index = if method.interface {
            self.cp.add_interface_method_ref(&owner, &method.name, &descriptor)
        } else {
            self.cp.add_method_ref(&owner, &method.name, &descriptor)
        };
        let arg_slots = parameter_slots(&method.params) as usize;
        match kind {
            InvokeKind::Static => self.op_u16(INVOKESTATIC, index),
            InvokeKind::Virtual => self.op_u16(INVOKEVIRTUAL, index),
            InvokeKind::Special => self.op_u16(INVOKESPECIAL, index),
            InvokeKind::Interface => {
                self.op_u16(INVOKEINTERFACE, index);
                self.code.push((arg_slots + 1) as u8);
                self.code.push(0);
            }
        }
        let receiver = if kind == InvokeKind::Static { 0 } else { 1 };
        self.pop(arg_slots + receiver)?;
        self.push_type(&method.ret);
        Ok(())
    }

    fn emit_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::This => self.emit_this(),
            Expr::Param(index) => {
                let (slot, ty) = self
                    .ctx
                    .param_slot(*index)
                    .map(|(slot, ty)| (slot, ty.clone()))
                    .ok_or_else(|| Error::codegen(format!("parameter ${index} does not exist")))?;
                self.load(&ty, slot);
                Ok(())
            }
            Expr::Local { name, .. } => {
                let (slot, ty) = self.lookup_local(name)?;
                self.load(&ty, slot);
                Ok(())
            }
            Expr::Null => {
                self.op(ACONST_NULL);
                self.push(VT::Null);
                Ok(())
            }
            Expr::Bool(value) => {
                self.push_int(*value as i32);
                Ok(())
            }
            Expr::Int(value) => {
                self.push_int(*value);
                Ok(())
            }
            Expr::Str(value) => {
                let index = self.cp.add_string(value);
                self.ldc(index);
                self.push_type(&TypeName::string());
                Ok(())
            }
            Expr::GetField { target, field } => {
                self.emit_expr(target)?;
                let index = self.field_ref(field);
                self.op_u16(GETFIELD, index);
                self.pop(1)?;
                self.push_type(&field.ty);
                Ok(())
            }
            Expr::GetStatic(field) => {
                let index = self.field_ref(field);
                self.op_u16(GETSTATIC, index);
                self.push_type(&field.ty);
                Ok(())
            }
            Expr::Invoke { kind, method, target, args } => self.emit_invoke(*kind, method, target.as_deref(), args),
            Expr::New { class, params, args } => {
                let new_pc = self.pc() as u16;
                let class_index = self.cp.add_class(&class.internal_name());
                self.op_u16(NEW, class_index);
                self.push(VT::Uninitialized(new_pc));
                self.op(DUP);
                self.push(VT::Uninitialized(new_pc));
                self.emit_args(params, args)?;
                let descriptor = method_descriptor(params, &TypeName::void());
                let index = self.cp.add_method_ref(&class.internal_name(), CONSTRUCTOR_METHOD_NAME, &descriptor);
                self.op_u16(INVOKESPECIAL, index);
                self.pop(parameter_slots(params) as usize + 1)?;
                self.replace_all(&VT::Uninitialized(new_pc), &VT::Object(class_index));
                Ok(())
            }
            Expr::NewArray { element, items } => self.emit_new_array(element, items),
            Expr::Cast { ty, value } => {
                if ty.is_primitive() {
                    return Err(Error::codegen(format!("cannot cast to primitive type {ty}")));
                }
                self.emit_expr(value)?;
                let index = self.cp.add_class(&ty.internal_name());
                self.op_u16(CHECKCAST, index);
                self.pop(1)?;
                self.push_type(ty);
                Ok(())
            }
            Expr::Boxed { value, from } => {
                let wrapper = from.boxed().ok_or_else(|| Error::codegen(format!("cannot box {from}")))?;
                self.emit_expr(value)?;
                let descriptor = method_descriptor(std::slice::from_ref(from), &wrapper);
                let index = self.cp.add_method_ref(&wrapper.internal_name(), "valueOf", &descriptor);
                self.op_u16(INVOKESTATIC, index);
                self.pop(from.slot_size() as usize)?;
                self.push_type(&wrapper);
                Ok(())
            }
            Expr::Unboxed { value, to } => {
                let wrapper = to.boxed().ok_or_else(|| Error::codegen(format!("cannot unbox to {to}")))?;
                self.emit_expr(value)?;
                let descriptor = method_descriptor(&[], to);
                let name = format!("{to}Value");
                let index = self.cp.add_method_ref(&wrapper.internal_name(), &name, &descriptor);
                self.op_u16(INVOKEVIRTUAL, index);
                self.pop(1)?;
                self.push_type(to);
                Ok(())
            }
            Expr::Arith { op, lhs, rhs } => {
                self.emit_expr(lhs)?;
                self.emit_expr(rhs)?;
                self.op(match op {
                    ArithOp::Add => IADD,
                    ArithOp::Mul => IMUL,
                });
                self.pop(2)?;
                self.push(VT::Integer);
                Ok(())
            }
            Expr::And(_) | Expr::Compare { .. } => {
                let when_false = self.new_label();
                let end = self.new_label();
                self.emit_cond(expr, when_false)?;
                self.push_int(1);
                self.branch(GOTO, end, 0)?;
                self.place(when_false)?;
                self.push_int(0);
                self.place(end)
            }
        }
    }

    fn emit_new_array(&mut self, element: &TypeName, items: &[Expr]) -> Result<()> {
        self.push_int(items.len() as i32);
        if element.is_primitive() {
            let atype = match element.as_str() {
                "boolean" => T_BOOLEAN,
                "char" => T_CHAR,
                "float" => T_FLOAT,
                "double" => T_DOUBLE,
                "byte" => T_BYTE,
                "short" => T_SHORT,
                "long" => T_LONG,
                _ => T_INT,
            };
            self.op_u8(NEWARRAY, atype);
        } else {
            let index = self.cp.add_class(&element.internal_name());
            self.op_u16(ANEWARRAY, index);
        }
        self.pop(1)?;
        let array = element.array_of();
        self.push_type(&array);
        let store = match element.as_str() {
            "boolean" | "byte" => BASTORE,
            "char" => CASTORE,
            "short" => SASTORE,
            "int" => IASTORE,
            "long" => LASTORE,
            "float" => FASTORE,
            "double" => DASTORE,
            _ => AASTORE,
        };
        for (i, item) in items.iter().enumerate() {
            self.op(DUP);
            self.push_type(&array);
            self.push_int(i as i32);
            self.emit_expr(item)?;
            self.op(store);
            self.pop(2 + element.slot_size() as usize)?;
        }
        Ok(())
    }

    /// Emit a jump to `when_false` taken when `cond` evaluates to false
    fn emit_cond(&mut self, cond: &Expr, when_false: LabelId) -> Result<()> {
        match cond {
            Expr::And(items) => {
                for item in items {
                    self.emit_cond(item, when_false)?;
                }
                Ok(())
            }
            Expr::Bool(true) => Ok(()),
            Expr::Bool(false) => self.branch(GOTO, when_false, 0),
            Expr::Compare { op, lhs, rhs } => {
                let equal = *op == CompareOp::Eq;
                if matches!(**rhs, Expr::Null) || matches!(**lhs, Expr::Null) {
                    let operand = if matches!(**rhs, Expr::Null) { lhs } else { rhs };
                    self.emit_expr(operand)?;
                    return self.branch(if equal { IFNONNULL } else { IFNULL }, when_false, 1);
                }
                let ty = self.type_of(lhs)?;
                self.emit_expr(lhs)?;
                self.emit_expr(rhs)?;
                if ty.is_reference() {
                    self.branch(if equal { IF_ACMPNE } else { IF_ACMPEQ }, when_false, 2)
                } else if ty.is_int_like() {
                    self.branch(if equal { IF_ICMPNE } else { IF_ICMPEQ }, when_false, 2)
                } else {
                    let compare = match ty.as_str() {
                        "long" => LCMP,
                        "float" => FCMPL,
                        _ => DCMPL,
                    };
                    self.op(compare);
                    self.pop(2 * ty.slot_size() as usize)?;
                    self.push(VT::Integer);
                    self.branch(if equal { IFNE } else { IFEQ }, when_false, 1)
                }
            }
            other => {
                self.emit_expr(other)?;
                self.branch(IFEQ, when_false, 1)
            }
        }
    }
}

fn merge(a: State, b: State) -> Result<State> {
    if a.stack.len() != b.stack.len() {
        return Err(Error::codegen("inconsistent operand stack height at branch target"));
    }
    let mut stack = Vec::with_capacity(a.stack.len());
    for (x, y) in a.stack.into_iter().zip(b.stack) {
        stack.push(match (x, y) {
            (x, y) if x == y => x,
            (VT::Null, other @ VT::Object(_)) | (other @ VT::Object(_), VT::Null) => other,
            (x, y) => {
                return Err(Error::codegen(format!("incompatible stack entries {x:?} and {y:?} at branch target")))
            }
        });
    }
    let locals = a
        .locals
        .into_iter()
        .zip(b.locals)
        .map(|(x, y)| if x == y { x } else { VT::Top })
        .collect();
    Ok(State { locals, stack })
}
