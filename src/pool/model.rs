//! Declaration stubs derived from the type model
//!
//! Used when a model type cannot be found as a compiled class. Stubs carry
//! the declared signatures so resolution works, but no bodies. The pool
//! marks them, and patching or emitting a marked class is a missing-symbol
//! error.

use crate::ast::{TypeDecl, TypeModel, TypeName};
use crate::codegen::defs::CONSTRUCTOR_METHOD_NAME;
use crate::codegen::flag::access_flags::*;
use crate::error::Result;

use super::classpath::ClassPath;
use super::handle::ClassHandle;

pub struct ModelClassPath {
    model: TypeModel,
    major_version: u16,
}

impl ModelClassPath {
    pub fn new(model: TypeModel, major_version: u16) -> Self {
        Self { model, major_version }
    }
}

/// Declaration-only class for a model type
pub fn stub_for(decl: &TypeDecl, major_version: u16) -> Result<ClassHandle> {
    let name = decl.name();
    let mut handle = if decl.is_interface() {
        ClassHandle::new_interface(name, major_version)
    } else {
        let mut handle = ClassHandle::new(name, major_version);
        if decl.is_abstract {
            handle.set_access_flags(handle.access_flags() | ACC_ABSTRACT);
        }
        if let Some(superclass) = &decl.superclass {
            handle.set_superclass(superclass);
        }
        handle
    };
    for interface in &decl.interfaces {
        handle.add_interface(interface);
    }
    if !decl.is_interface() {
        for constructor in decl.effective_constructors() {
            handle.declare_method(ACC_PUBLIC | ACC_NATIVE, CONSTRUCTOR_METHOD_NAME, &constructor.param_types(), &TypeName::void())?;
        }
    }
    for method in &decl.methods {
        let mut flags = ACC_PUBLIC;
        flags |= if method.is_abstract { ACC_ABSTRACT } else { ACC_NATIVE };
        if method.is_static {
            flags |= ACC_STATIC;
        }
        if handle.has_method(&method.name, &method.descriptor()) {
            continue;
        }
        handle.declare_method(flags, &method.name, &method.param_types(), &method.return_type)?;
    }
    Ok(handle)
}

impl ClassPath for ModelClassPath {
    fn open_class(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.model.get(name) {
            Some(decl) => Ok(Some(stub_for(decl, self.major_version)?.to_bytecode()?)),
            None => Ok(None),
        }
    }

    fn describe(&self) -> String {
        format!("model:{} types", self.model.len())
    }

    fn provides_stubs(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{MethodDecl, ParamDecl, TypeKind};
    use crate::codegen::defs::major_versions::JAVA_8;

    #[test]
    fn test_stub_carries_signatures() {
        let mut base = TypeDecl::new("demo.Base", TypeKind::Class);
        base.is_abstract = true;
        base.methods.push(MethodDecl::new("getName", TypeName::string(), vec![]));
        let mut run = MethodDecl::new("run", "void", vec![ParamDecl::new("count", "int")]);
        run.is_abstract = false;
        base.methods.push(run);
        let mut model = TypeModel::new();
        model.insert(base);

        let mut layer = ModelClassPath::new(model, JAVA_8);
        let handle = ClassHandle::from_bytes(&layer.open_class("demo.Base").unwrap().unwrap()).unwrap();
        assert!(handle.has_constructor(&[]));
        assert!(handle.method("getName", "()Ljava/lang/String;").unwrap().unwrap().is_abstract());
        let run = handle.method("run", "(I)V").unwrap().unwrap();
        assert_eq!(run.access_flags & ACC_NATIVE, ACC_NATIVE);
        assert!(layer.open_class("demo.Other").unwrap().is_none());
    }

    #[test]
    fn test_pool_marks_stubs() {
        let mut model = TypeModel::new();
        model.insert(TypeDecl::new("demo.Base", TypeKind::Class));
        let mut pool = crate::pool::ClassPool::with_system(JAVA_8, false);
        pool.push_layer(Box::new(ModelClassPath::new(model, JAVA_8)));

        let base = pool.get("demo.Base").unwrap();
        assert!(base.is_stub());
        assert!(matches!(base.ensure_compiled(), Err(crate::error::Error::MissingSymbol { .. })));
        assert!(!pool.get("java.lang.Object").unwrap().is_stub());
    }
}
