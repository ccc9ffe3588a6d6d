//! Static factory methods bound to a generated implementation
//!
//! The factory lives in a separate, possibly pre-existing class. A missing
//! method is added; an existing static one keeps its body but has every
//! return replaced by construction of the implementation when the binding
//! asks for it. The patched factory class replaces any earlier result for
//! the same class, so several types may share one factory.

use tracing::debug;

use crate::ast::{FactoryDirective, TypeName};
use crate::codegen::descriptor::method_descriptor;
use crate::codegen::flag::access_flags::{ACC_PUBLIC, ACC_STATIC};
use crate::codegen::tree::{Expr, Stmt};
use crate::error::{Error, Result};
use crate::result::ClassResult;
use crate::stack::Session;

use super::Generator;

#[derive(Debug, Clone)]
pub struct FactoryGenerator {
    directive: FactoryDirective,
    /// Declared return type of the factory
    source_type: TypeName,
    params: Vec<TypeName>,
}

impl FactoryGenerator {
    pub fn new(directive: FactoryDirective, source_type: TypeName, params: Vec<TypeName>) -> Self {
        Self { directive, source_type, params }
    }
}

impl Generator for FactoryGenerator {
    fn apply_to(&self, session: &mut Session) -> Result<()> {
        let FactoryDirective { location, method, override_return } = &self.directive;
        if location.is_empty() || method.is_empty() {
            return Err(Error::config(format!(
                "factory binding of {} needs both a location and a method name",
                self.source_type
            )));
        }
        let implementation = session.current_class()?.name().clone();
        let location = TypeName::new(location.as_str());
        let descriptor = method_descriptor(&self.params, &self.source_type);
        let args = (1..=self.params.len() as u16).map(Expr::Param).collect();
        let body = vec![Stmt::Return(Some(Expr::new_object(implementation.clone(), self.params.clone(), args)))];

        let factory = if location == implementation {
            session.current_class_mut()?
        } else {
            session.pool().get_or_create(&location)?
        };
        factory.ensure_compiled()?;
        match factory.method(method, &descriptor)? {
            Some(existing) if !existing.is_static() => {
                return Err(Error::config(format!(
                    "existing factory method {location}.{method}{descriptor} is not static"
                )));
            }
            Some(_) if *override_return => {
                factory.rewrite_returns(method, &descriptor, &body)?;
                debug!(factory = %location, method = %method, "rewrote factory returns");
            }
            Some(_) => {
                debug!(factory = %location, method = %method, "keeping existing factory method");
                return Ok(());
            }
            None => {
                factory.add_method(ACC_PUBLIC | ACC_STATIC, method, &self.params, &self.source_type, &body)?;
                debug!(factory = %location, method = %method, "added factory method");
            }
        }

        if location != implementation {
            let result = ClassResult::builder()
                .package_class_name(location.as_str())?
                .bytecode(factory.to_bytecode()?)
                .build()?;
            session.classes().replace_or_push(result);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("factory {}.{} -> {}", self.directive.location, self.directive.method, self.source_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeModel;
    use crate::codegen::defs::major_versions::JAVA_8;
    use crate::config::Config;
    use crate::pool::{ClassHandle, ClassPool};

    fn session() -> Session {
        let mut session = Session::new(Config::new(), TypeModel::new(), ClassPool::with_system(JAVA_8, false));
        session.set_current_class(ClassHandle::new(TypeName::new("demo.PersonImpl"), JAVA_8));
        session
    }

    fn binding(location: &str, method: &str) -> FactoryDirective {
        FactoryDirective { location: location.into(), method: method.into(), override_return: true }
    }

    #[test]
    fn test_creates_factory_class() {
        let mut session = session();
        let generator = FactoryGenerator::new(binding("demo.Factory", "person"), TypeName::new("demo.Person"), vec![TypeName::string()]);
        generator.apply_to(&mut session).unwrap();
        let result = session.classes().get("demo.Factory").unwrap();
        let factory = ClassHandle::from_bytes(result.bytecode()).unwrap();
        let method = factory.method("person", "(Ljava/lang/String;)Ldemo/Person;").unwrap().unwrap();
        assert!(method.is_static());
    }

    #[test]
    fn test_shared_factory_is_replaced() {
        let mut session = session();
        FactoryGenerator::new(binding("demo.Factory", "a"), TypeName::new("demo.A"), vec![]).apply_to(&mut session).unwrap();
        FactoryGenerator::new(binding("demo.Factory", "b"), TypeName::new("demo.B"), vec![]).apply_to(&mut session).unwrap();
        assert_eq!(session.classes().len(), 1);
        let factory = ClassHandle::from_bytes(session.classes().get("demo.Factory").unwrap().bytecode()).unwrap();
        assert!(factory.has_method("a", "()Ldemo/A;") && factory.has_method("b", "()Ldemo/B;"));
    }

    #[test]
    fn test_rejects_bad_bindings() {
        let mut session = session();
        let empty = FactoryGenerator::new(binding("", "create"), TypeName::new("demo.Person"), vec![]);
        assert!(matches!(empty.apply_to(&mut session), Err(Error::Config { .. })));

        let mut existing = ClassHandle::new(TypeName::new("demo.Factory"), JAVA_8);
        existing
            .add_method(ACC_PUBLIC, "create", &[], &TypeName::new("demo.Person"), &[Stmt::Return(Some(Expr::Null))])
            .unwrap();
        session.pool().insert(existing);
        let instance = FactoryGenerator::new(binding("demo.Factory", "create"), TypeName::new("demo.Person"), vec![]);
        assert!(matches!(instance.apply_to(&mut session), Err(Error::Config { .. })));
    }

    #[test]
    fn test_stub_factory_is_not_emitted() {
        let mut session = session();
        let mut stub = ClassHandle::new(TypeName::new("demo.Factory"), JAVA_8);
        stub.mark_stub();
        session.pool().insert(stub);
        let generator = FactoryGenerator::new(binding("demo.Factory", "person"), TypeName::new("demo.Person"), vec![]);
        assert!(matches!(generator.apply_to(&mut session), Err(Error::MissingSymbol { .. })));
        assert!(session.classes().is_empty());
    }
}
