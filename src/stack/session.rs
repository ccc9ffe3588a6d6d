//! Per-run generation context
//!
//! A session lives for exactly one compile invocation and is passed by
//! `&mut` through analysis and realization. The current type, class and
//! action slots are only set while a type is being realized; reading one
//! that is unset is a bug in the caller and fails with an error naming it.

use std::sync::Arc;

use crate::ast::{TypeDecl, TypeModel, TypeName};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::pool::{ClassHandle, ClassPool, Resolver};
use crate::result::ClassResult;

use super::classes::ClassStack;

pub struct Session {
    config: Config,
    model: TypeModel,
    pool: ClassPool,
    classes: ClassStack,
    current_type: Option<Arc<TypeDecl>>,
    current_class: Option<ClassHandle>,
    current_action: Option<String>,
}

fn unset(slot: &str) -> Error {
    Error::internal(format!("generation session has no {slot}"))
}

impl Session {
    pub fn new(config: Config, model: TypeModel, pool: ClassPool) -> Self {
        Self {
            config,
            model,
            pool,
            classes: ClassStack::new(),
            current_type: None,
            current_class: None,
            current_action: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn model(&self) -> &TypeModel {
        &self.model
    }

    pub fn pool(&mut self) -> &mut ClassPool {
        &mut self.pool
    }

    pub fn classes(&self) -> &ClassStack {
        &self.classes
    }

    /// Results emitted so far, in order
    pub fn results(&self) -> Arc<Vec<ClassResult>> {
        self.classes.snapshot()
    }

    pub fn current_type(&self) -> Result<&Arc<TypeDecl>> {
        self.current_type.as_ref().ok_or_else(|| unset("current type"))
    }

    pub fn set_current_type(&mut self, decl: Arc<TypeDecl>) {
        self.current_type = Some(decl);
    }

    pub fn current_class(&self) -> Result<&ClassHandle> {
        self.current_class.as_ref().ok_or_else(|| unset("current class"))
    }

    pub fn current_class_mut(&mut self) -> Result<&mut ClassHandle> {
        self.current_class.as_mut().ok_or_else(|| unset("current class"))
    }

    pub fn set_current_class(&mut self, handle: ClassHandle) {
        self.current_class = Some(handle);
    }

    pub fn take_current_class(&mut self) -> Result<ClassHandle> {
        self.current_class.take().ok_or_else(|| unset("current class"))
    }

    pub fn current_action(&self) -> Result<&str> {
        self.current_action.as_deref().ok_or_else(|| unset("current action"))
    }

    pub fn set_current_action(&mut self, action: impl Into<String>) {
        self.current_action = Some(action.into());
    }

    /// Drop every per-type slot
    pub fn clear_current(&mut self) {
        self.current_type = None;
        self.current_class = None;
        self.current_action = None;
    }

    /// Template resolver scoped to a method of the current class
    pub fn resolver(&mut self, params: Vec<TypeName>) -> Result<Resolver<'_>> {
        let current = self.current_class.as_ref().ok_or_else(|| unset("current class"))?;
        Ok(Resolver::new(&mut self.pool, current.name().clone(), params).with_current(current))
    }

    /// Supertype declaration, from the model when it is known there, else from the pool
    pub fn declaration_of(&mut self, name: &TypeName) -> Result<Option<Arc<TypeDecl>>> {
        if let Some(decl) = self.model.get(name.as_str()) {
            return Ok(Some(Arc::clone(decl)));
        }
        match self.pool.find(name.as_str())? {
            Some(handle) => Ok(Some(Arc::new(TypeDecl::from_class_file(handle.class_file())?))),
            None => Ok(None),
        }
    }

    pub fn into_results(self) -> Vec<ClassResult> {
        Vec::clone(&self.classes.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeKind;
    use crate::codegen::defs::major_versions::JAVA_8;

    fn session() -> Session {
        Session::new(Config::new(), TypeModel::new(), ClassPool::with_system(JAVA_8, false))
    }

    #[test]
    fn test_unset_slots_fail_fast() {
        let session = session();
        let err = session.current_class().unwrap_err();
        assert!(err.to_string().contains("current class"));
        assert!(matches!(session.current_type(), Err(Error::Internal { .. })));
        assert!(session.current_action().is_err());
    }

    #[test]
    fn test_slots_round_trip() {
        let mut session = session();
        session.set_current_type(Arc::new(TypeDecl::new("demo.Person", TypeKind::Interface)));
        session.set_current_class(ClassHandle::new(TypeName::new("demo.PersonImpl"), JAVA_8));
        session.set_current_action("field name");
        assert_eq!(session.current_type().unwrap().simple_name(), "Person");
        assert_eq!(session.current_action().unwrap(), "field name");
        assert_eq!(session.take_current_class().unwrap().simple_name(), "PersonImpl");
        session.clear_current();
        assert!(session.current_type().is_err());
    }

    #[test]
    fn test_declaration_of_falls_back_to_pool() {
        let mut session = session();
        let decl = session.declaration_of(&TypeName::new("java.lang.RuntimeException")).unwrap().unwrap();
        assert_eq!(decl.superclass, Some(TypeName::new("java.lang.Exception")));
        assert!(session.declaration_of(&TypeName::new("demo.Nope")).unwrap().is_none());
    }
}
