//! Mutable view of one class in the pool

use tracing::trace;

use crate::ast::TypeName;
use crate::codegen::attribute::{AttributeInfo, CodeAttribute};
use crate::codegen::class::ClassFile;
use crate::codegen::defs::{attribute_names, CONSTRUCTOR_METHOD_NAME, FIRST_STACK_MAP_VERSION};
use crate::codegen::descriptor::{method_descriptor, parse_field_descriptor, parse_method_descriptor};
use crate::codegen::field::FieldInfo;
use crate::codegen::flag::access_flags::*;
use crate::codegen::frame::{encode_frames, stack_map_table_to_bytes};
use crate::codegen::gen::{emit_fragment, emit_method, MethodContext};
use crate::codegen::method::MethodInfo;
use crate::codegen::opcodes::{ARETURN, DRETURN, FRETURN, IRETURN, LRETURN};
use crate::codegen::patch::{insert_prologue, replace_returns, Fragment};
use crate::codegen::reader::read_class;
use crate::codegen::tree::Stmt;
use crate::codegen::writer::class_file_to_bytes;
use crate::error::{Error, Result};

/// A method as declared in a class file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub owner: TypeName,
    pub name: String,
    pub params: Vec<TypeName>,
    pub ret: TypeName,
    pub access_flags: u16,
}

impl MethodSig {
    pub fn descriptor(&self) -> String {
        method_descriptor(&self.params, &self.ret)
    }

    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags & ACC_ABSTRACT != 0
    }

    pub fn is_varargs(&self) -> bool {
        self.access_flags & ACC_VARARGS != 0
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_METHOD_NAME
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSig {
    pub owner: TypeName,
    pub name: String,
    pub ty: TypeName,
    pub access_flags: u16,
}

#[derive(Debug, Clone)]
pub struct ClassHandle {
    name: TypeName,
    file: ClassFile,
    /// Declaration-only class built from the type model; never patched or emitted
    stub: bool,
}

impl ClassHandle {
    /// A fresh public class extending `java.lang.Object`
    pub fn new(name: TypeName, major_version: u16) -> Self {
        let file = ClassFile::new(major_version, ACC_PUBLIC | ACC_SUPER, &name.internal_name(), Some("java/lang/Object"));
        Self { name, file, stub: false }
    }

    pub fn new_interface(name: TypeName, major_version: u16) -> Self {
        let file = ClassFile::new(
            major_version,
            ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT,
            &name.internal_name(),
            Some("java/lang/Object"),
        );
        Self { name, file, stub: false }
    }

    pub fn from_class_file(file: ClassFile) -> Result<Self> {
        let name = TypeName::from_internal(file.this_name()?);
        Ok(Self { name, file, stub: false })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_class_file(read_class(bytes)?)
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn is_stub(&self) -> bool {
        self.stub
    }

    pub(crate) fn mark_stub(&mut self) {
        self.stub = true;
    }

    /// Fails for declaration stubs, which have no compiled form to patch or write out
    pub fn ensure_compiled(&self) -> Result<()> {
        if self.stub {
            return Err(Error::missing(format!("compiled class {}", self.name)));
        }
        Ok(())
    }

    pub fn simple_name(&self) -> &str {
        self.name.simple_name()
    }

    pub fn package(&self) -> &str {
        self.name.package()
    }

    pub fn class_file(&self) -> &ClassFile {
        &self.file
    }

    pub fn major_version(&self) -> u16 {
        self.file.major_version
    }

    pub fn access_flags(&self) -> u16 {
        self.file.access_flags
    }

    pub fn set_access_flags(&mut self, access_flags: u16) {
        self.file.access_flags = access_flags;
    }

    pub fn is_interface(&self) -> bool {
        self.file.access_flags & ACC_INTERFACE != 0
    }

    pub fn superclass(&self) -> Result<Option<TypeName>> {
        Ok(self.file.super_name()?.map(TypeName::from_internal))
    }

    pub fn interfaces(&self) -> Result<Vec<TypeName>> {
        Ok(self.file.interface_names()?.into_iter().map(TypeName::from_internal).collect())
    }

    pub fn set_superclass(&mut self, superclass: &TypeName) {
        self.file.super_class = self.file.constant_pool.add_class(&superclass.internal_name());
    }

    /// Only `java.lang.Object` has no superclass
    pub fn clear_superclass(&mut self) {
        self.file.super_class = 0;
    }

    /// Add an implemented interface unless it is already listed
    pub fn add_interface(&mut self, interface: &TypeName) {
        let index = self.file.constant_pool.add_class(&interface.internal_name());
        if !self.file.interfaces.contains(&index) {
            self.file.interfaces.push(index);
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.file.find_field(name).is_some()
    }

    pub fn fields(&self) -> Result<Vec<FieldSig>> {
        let cp = &self.file.constant_pool;
        self.file
            .fields
            .iter()
            .map(|f| {
                Ok(FieldSig {
                    owner: self.name.clone(),
                    name: cp.utf8(f.name_index)?.to_string(),
                    ty: parse_field_descriptor(cp.utf8(f.descriptor_index)?)?,
                    access_flags: f.access_flags,
                })
            })
            .collect()
    }

    pub fn add_field(&mut self, access_flags: u16, name: &str, ty: &TypeName) -> Result<()> {
        if self.has_field(name) {
            return Err(Error::DuplicateMember {
                class: self.name.to_string(),
                name: name.to_string(),
                descriptor: ty.descriptor(),
            });
        }
        let cp = &mut self.file.constant_pool;
        let field = FieldInfo::new(access_flags, cp.add_utf8(name), cp.add_utf8(&ty.descriptor()));
        self.file.fields.push(field);
        trace!(class = %self.name, field = name, ty = %ty, "added field");
        Ok(())
    }

    /// Every declared method and constructor
    pub fn methods(&self) -> Result<Vec<MethodSig>> {
        let cp = &self.file.constant_pool;
        self.file
            .methods
            .iter()
            .map(|m| {
                let (params, ret) = parse_method_descriptor(cp.utf8(m.descriptor_index)?)?;
                Ok(MethodSig {
                    owner: self.name.clone(),
                    name: cp.utf8(m.name_index)?.to_string(),
                    params,
                    ret,
                    access_flags: m.access_flags,
                })
            })
            .collect()
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Result<Option<MethodSig>> {
        Ok(self.methods()?.into_iter().find(|m| m.name == name && m.descriptor() == descriptor))
    }

    pub fn has_method(&self, name: &str, descriptor: &str) -> bool {
        self.file.find_method(name, descriptor).is_some()
    }

    pub fn constructors(&self) -> Result<Vec<MethodSig>> {
        Ok(self.methods()?.into_iter().filter(MethodSig::is_constructor).collect())
    }

    pub fn has_constructor(&self, params: &[TypeName]) -> bool {
        self.has_method(CONSTRUCTOR_METHOD_NAME, &method_descriptor(params, &TypeName::void()))
    }

    fn duplicate(&self, name: &str, descriptor: String) -> Error {
        Error::DuplicateMember { class: self.name.to_string(), name: name.to_string(), descriptor }
    }

    fn frames_enabled(&self) -> bool {
        self.file.major_version >= FIRST_STACK_MAP_VERSION
    }

    fn context(&self, name: &str, params: Vec<TypeName>, ret: TypeName, access_flags: u16) -> MethodContext {
        let ctx = if name == CONSTRUCTOR_METHOD_NAME {
            MethodContext::constructor(self.name.clone(), params)
        } else {
            MethodContext::new(self.name.clone(), params, ret)
        };
        ctx.with_static(access_flags & ACC_STATIC != 0)
    }

    /// Declare a method without a body (abstract or native)
    pub fn declare_method(&mut self, access_flags: u16, name: &str, params: &[TypeName], ret: &TypeName) -> Result<()> {
        let descriptor = method_descriptor(params, ret);
        if self.has_method(name, &descriptor) {
            return Err(self.duplicate(name, descriptor));
        }
        let cp = &mut self.file.constant_pool;
        let method = MethodInfo::new(access_flags, cp.add_utf8(name), cp.add_utf8(&descriptor));
        self.file.methods.push(method);
        Ok(())
    }

    /// Compile `body` into a new method
    pub fn add_method(
        &mut self,
        access_flags: u16,
        name: &str,
        params: &[TypeName],
        ret: &TypeName,
        body: &[Stmt],
    ) -> Result<()> {
        let descriptor = method_descriptor(params, ret);
        if self.has_method(name, &descriptor) {
            return Err(self.duplicate(name, descriptor));
        }
        let ctx = self.context(name, params.to_vec(), ret.clone(), access_flags);
        let frames_enabled = self.frames_enabled();
        let cp = &mut self.file.constant_pool;
        let emitted = emit_method(cp, &ctx, body)?;

        let mut code = CodeAttribute::new(emitted.max_stack, emitted.max_locals, emitted.code);
        if frames_enabled && !emitted.frames.is_empty() {
            let initial = ctx.initial_frame_locals(cp);
            let table = stack_map_table_to_bytes(&encode_frames(&emitted.frames, &initial));
            code.attributes.push(AttributeInfo::new(cp.add_utf8(attribute_names::STACK_MAP_TABLE), table));
        }
        let mut method = MethodInfo::new(access_flags, cp.add_utf8(name), cp.add_utf8(&descriptor));
        method.set_code(cp, &code);
        self.file.methods.push(method);
        trace!(class = %self.name, method = name, descriptor = %descriptor, "added method");
        Ok(())
    }

    fn existing_code(&self, name: &str, descriptor: &str) -> Result<(usize, MethodContext, CodeAttribute)> {
        self.ensure_compiled()?;
        let index = self
            .file
            .find_method(name, descriptor)
            .ok_or_else(|| Error::missing(format!("{}.{}{}", self.name, name, descriptor)))?;
        let method = &self.file.methods[index];
        let code = method
            .code(&self.file.constant_pool)?
            .ok_or_else(|| Error::codegen(format!("method {}.{}{} has no body", self.name, name, descriptor)))?;
        let (params, ret) = parse_method_descriptor(descriptor)?;
        Ok((index, self.context(name, params, ret, method.access_flags), code))
    }

    /// Run `body` before the existing body of a method
    pub fn insert_before(&mut self, name: &str, descriptor: &str, body: &[Stmt]) -> Result<()> {
        let (index, ctx, code) = self.existing_code(name, descriptor)?;
        let frames_enabled = self.frames_enabled();
        let cp = &mut self.file.constant_pool;
        let fragment = Fragment::from_emitted(&emit_fragment(cp, &ctx, body)?)?;
        let initial = ctx.initial_frame_locals(cp);
        let patched = insert_prologue(&code, &fragment, cp, &initial, frames_enabled)?;
        self.file.methods[index].set_code(cp, &patched);
        trace!(class = %self.name, method = name, "inserted prologue");
        Ok(())
    }

    /// Discard the value at every return of a method and return the result of `body` instead;
    /// `body` must end in a return statement
    pub fn rewrite_returns(&mut self, name: &str, descriptor: &str, body: &[Stmt]) -> Result<()> {
        let (index, ctx, code) = self.existing_code(name, descriptor)?;
        let return_opcode = if ctx.ret.is_void() {
            return Err(Error::codegen(format!("cannot rewrite returns of void method {name}")));
        } else if ctx.ret.is_int_like() {
            IRETURN
        } else {
            match ctx.ret.as_str() {
                "long" => LRETURN,
                "float" => FRETURN,
                "double" => DRETURN,
                _ => ARETURN,
            }
        };
        if ctx.ret.is_wide() {
            return Err(Error::codegen(format!("cannot rewrite returns of wide-valued method {name}")));
        }
        let frames_enabled = self.frames_enabled();
        let cp = &mut self.file.constant_pool;
        let replacement = Fragment::from_emitted(&emit_method(cp, &ctx, body)?)?;
        let initial = ctx.initial_frame_locals(cp);
        let patched = replace_returns(&code, return_opcode, &replacement, cp, &initial, frames_enabled)?;
        self.file.methods[index].set_code(cp, &patched);
        trace!(class = %self.name, method = name, "rewrote returns");
        Ok(())
    }

    pub fn to_bytecode(&self) -> Result<Vec<u8>> {
        Ok(class_file_to_bytes(&self.file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::defs::major_versions::JAVA_8;
    use crate::codegen::insn::disassemble;
    use crate::codegen::tree::{Expr, FieldRef};

    fn listing(handle: &ClassHandle, name: &str, descriptor: &str) -> Vec<String> {
        let file = handle.class_file();
        let index = file.find_method(name, descriptor).unwrap();
        let code = file.methods[index].code(&file.constant_pool).unwrap().unwrap();
        disassemble(&code.code, &file.constant_pool).unwrap().into_iter().map(|(_, t)| t).collect()
    }

    #[test]
    fn test_new_class_round_trip() {
        let mut handle = ClassHandle::new(TypeName::new("demo.PersonImpl"), JAVA_8);
        handle.add_interface(&TypeName::new("demo.Person"));
        handle.add_interface(&TypeName::new("demo.Person"));
        handle.add_field(ACC_PRIVATE, "name", &TypeName::string()).unwrap();
        let field = FieldRef::new(handle.name().clone(), "name", TypeName::string());
        handle
            .add_method(
                ACC_PUBLIC,
                "getName",
                &[],
                &TypeName::string(),
                &[Stmt::Return(Some(Expr::get_field(Expr::This, field)))],
            )
            .unwrap();

        let reloaded = ClassHandle::from_bytes(&handle.to_bytecode().unwrap()).unwrap();
        assert_eq!(reloaded.name(), &TypeName::new("demo.PersonImpl"));
        assert_eq!(reloaded.interfaces().unwrap(), vec![TypeName::new("demo.Person")]);
        assert_eq!(reloaded.superclass().unwrap(), Some(TypeName::object()));
        assert!(reloaded.has_field("name"));
        assert!(reloaded.has_method("getName", "()Ljava/lang/String;"));
        assert_eq!(
            listing(&reloaded, "getName", "()Ljava/lang/String;"),
            vec!["aload_0", "getfield demo/PersonImpl.name:Ljava/lang/String;", "areturn"]
        );
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let mut handle = ClassHandle::new(TypeName::new("demo.A"), JAVA_8);
        handle.add_field(ACC_PRIVATE, "x", &TypeName::int()).unwrap();
        assert!(matches!(handle.add_field(ACC_PRIVATE, "x", &TypeName::int()), Err(Error::DuplicateMember { .. })));
        handle.declare_method(ACC_PUBLIC | ACC_ABSTRACT, "x", &[], &TypeName::int()).unwrap();
        assert!(handle.declare_method(ACC_PUBLIC | ACC_ABSTRACT, "x", &[], &TypeName::int()).is_err());
    }

    #[test]
    fn test_insert_before_runs_first() {
        let mut handle = ClassHandle::new(TypeName::new("demo.Service"), JAVA_8);
        let body = vec![Stmt::Return(Some(Expr::Int(1)))];
        handle.add_method(ACC_PUBLIC, "run", &[TypeName::string()], &TypeName::int(), &body).unwrap();
        let guard = vec![Stmt::If {
            cond: Expr::eq(Expr::Param(1), Expr::Null),
            then: vec![Stmt::Throw(Expr::new_object(
                TypeName::new("java.lang.IllegalStateException"),
                vec![],
                vec![],
            ))],
        }];
        handle.insert_before("run", "(Ljava/lang/String;)I", &guard).unwrap();
        let lines = listing(&handle, "run", "(Ljava/lang/String;)I");
        assert_eq!(lines[0], "aload_1");
        assert!(lines[1].starts_with("ifnonnull"));
        assert_eq!(&lines[lines.len() - 2..], ["iconst_1", "ireturn"]);
    }

    #[test]
    fn test_insert_before_requires_body() {
        let mut handle = ClassHandle::new(TypeName::new("demo.Service"), JAVA_8);
        handle.declare_method(ACC_PUBLIC | ACC_NATIVE, "run", &[], &TypeName::void()).unwrap();
        assert!(matches!(handle.insert_before("run", "()V", &[]), Err(Error::CodeGen { .. })));
        assert!(matches!(handle.insert_before("stop", "()V", &[]), Err(Error::MissingSymbol { .. })));

        handle.mark_stub();
        match handle.insert_before("run", "()V", &[]) {
            Err(Error::MissingSymbol { name }) => assert_eq!(name, "compiled class demo.Service"),
            other => panic!("expected a missing compiled class, got {other:?}"),
        }
    }
}
