//! Accessor, mutator and invocation-chain methods

use tracing::debug;

use crate::ast::{InvokeDirective, MethodDecl, ReturnMode};
use crate::codegen::flag::access_flags::ACC_PUBLIC;
use crate::codegen::tree::{Expr, FieldRef, Stmt};
use crate::error::{Error, Result};
use crate::parser::{parse_template, parse_wrap};
use crate::stack::Session;

use super::member::MemberDescriptor;
use super::{adapt, current_is_subtype, Generator};

/// True when the method is already present; logs the skip
fn already_declared(session: &Session, method: &MethodDecl) -> Result<bool> {
    let class = session.current_class()?;
    if class.has_method(&method.name, &method.descriptor()) {
        debug!(class = %class.name(), method = %method.name, "method already declared");
        return Ok(true);
    }
    Ok(false)
}

fn add_public(session: &mut Session, method: &MethodDecl, body: &[Stmt]) -> Result<()> {
    let params = method.param_types();
    session.current_class_mut()?.add_method(ACC_PUBLIC, &method.name, &params, &method.return_type, body)
}

/// `return this.f;`, or the wrap template applied to `this.f`
#[derive(Debug, Clone)]
pub struct AccessorGenerator {
    member: MemberDescriptor,
}

impl AccessorGenerator {
    pub fn new(member: MemberDescriptor) -> Self {
        Self { member }
    }
}

impl Generator for AccessorGenerator {
    fn apply_to(&self, session: &mut Session) -> Result<()> {
        let accessor = self.member.accessor();
        if already_declared(session, accessor)? {
            return Ok(());
        }
        let owner = session.current_class()?.name().clone();
        let field = Expr::get_field(Expr::This, self.member.field_ref(&owner));
        let value = match accessor.directives.wrap() {
            Some(wrap) => {
                let template = parse_wrap(&wrap.template)?;
                let (value, ty) = {
                    let mut resolver = session
                        .resolver(Vec::new())?
                        .with_placeholder(field, self.member.declared_type().clone());
                    resolver.resolve(&template)?
                };
                adapt(session.pool(), value, &ty, self.member.exposed_type())?
            }
            None => field,
        };
        add_public(session, accessor, &[Stmt::Return(Some(value))])
    }

    fn describe(&self) -> String {
        format!("accessor {}", self.member)
    }
}

/// `this.f = $1;` returning nothing or the receiver
#[derive(Debug, Clone)]
pub struct MutatorGenerator {
    storage_name: String,
    method: MethodDecl,
}

impl MutatorGenerator {
    pub fn new(storage_name: impl Into<String>, method: MethodDecl) -> Self {
        Self { storage_name: storage_name.into(), method }
    }
}

impl Generator for MutatorGenerator {
    fn apply_to(&self, session: &mut Session) -> Result<()> {
        if already_declared(session, &self.method)? {
            return Ok(());
        }
        let param = self
            .method
            .params
            .first()
            .map(|p| p.ty.clone())
            .ok_or_else(|| Error::internal(format!("mutator {} takes no parameter", self.method.name)))?;
        let class = session.current_class()?;
        let owner = class.name().clone();
        let field_ty = class
            .fields()?
            .into_iter()
            .find(|f| f.name == self.storage_name)
            .map_or_else(|| param.clone(), |f| f.ty);
        let value = adapt(session.pool(), Expr::Param(1), &param, &field_ty)?;

        let mut body = vec![Stmt::SetField {
            target: Expr::This,
            field: FieldRef::new(owner.clone(), self.storage_name.as_str(), field_ty),
            value,
        }];
        let ret = &self.method.return_type;
        if ret.is_void() {
            body.push(Stmt::Return(None));
        } else if ret.is_reference() && current_is_subtype(session, ret)? {
            body.push(Stmt::Return(Some(Expr::This)));
        } else {
            return Err(Error::codegen(format!(
                "mutator {} returns {ret}, which {owner} cannot be returned as",
                self.method.name
            )));
        }
        add_public(session, &self.method, &body)
    }

    fn describe(&self) -> String {
        format!("mutator {} -> {}", self.method.name, self.storage_name)
    }
}

/// Runs a fixed list of invocation templates in order
#[derive(Debug, Clone)]
pub struct InvokeGenerator {
    method: MethodDecl,
    directive: InvokeDirective,
}

impl InvokeGenerator {
    pub fn new(method: MethodDecl, directive: InvokeDirective) -> Self {
        Self { method, directive }
    }
}

impl Generator for InvokeGenerator {
    fn apply_to(&self, session: &mut Session) -> Result<()> {
        if already_declared(session, &self.method)? {
            return Ok(());
        }
        let params = self.method.param_types();
        let ret = &self.method.return_type;
        let count = self.directive.invocations.len();
        let mut body = Vec::with_capacity(count + 1);
        for (i, source) in self.directive.invocations.iter().enumerate() {
            let template = parse_template(source)?;
            let (call, ty) = session.resolver(params.clone())?.resolve(&template)?;
            let last = i + 1 == count;
            if last && self.directive.returns == ReturnMode::MethodCall && !ret.is_void() {
                body.push(Stmt::Return(Some(adapt(session.pool(), call, &ty, ret)?)));
            } else {
                body.push(Stmt::Expr(call));
            }
        }

        match self.directive.returns {
            ReturnMode::MethodCall if count == 0 => {
                return Err(Error::config(format!(
                    "{} returns the last invocation but has no invocations",
                    self.method.name
                )));
            }
            ReturnMode::MethodCall if !ret.is_void() => {}
            ReturnMode::SelfRef => {
                if !ret.is_reference() || !current_is_subtype(session, ret)? {
                    return Err(Error::codegen(format!(
                        "{} returns {ret}, which the receiver cannot be returned as",
                        self.method.name
                    )));
                }
                body.push(Stmt::Return(Some(Expr::This)));
            }
            _ if ret.is_void() => body.push(Stmt::Return(None)),
            _ => {
                return Err(Error::config(format!(
                    "{} returns {ret} but its invocation chain returns nothing",
                    self.method.name
                )));
            }
        }
        add_public(session, &self.method, &body)
    }

    fn describe(&self) -> String {
        format!("invoke {} ({} calls)", self.method.name, self.directive.invocations.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ParamDecl, TypeModel, TypeName, WrapDirective};
    use crate::codegen::defs::major_versions::JAVA_8;
    use crate::codegen::flag::access_flags::ACC_PRIVATE;
    use crate::codegen::insn::disassemble;
    use crate::config::Config;
    use crate::pool::{ClassHandle, ClassPool};

    fn session_with(class: ClassHandle) -> Session {
        let mut session = Session::new(Config::new(), TypeModel::new(), ClassPool::with_system(JAVA_8, false));
        session.set_current_class(class);
        session
    }

    fn person() -> ClassHandle {
        let mut class = ClassHandle::new(TypeName::new("demo.PersonImpl"), JAVA_8);
        class.add_interface(&TypeName::new("java.lang.CharSequence"));
        class.add_field(ACC_PRIVATE, "name", &TypeName::string()).unwrap();
        class
    }

    fn listing(session: &Session, name: &str, descriptor: &str) -> Vec<String> {
        let file = session.current_class().unwrap().class_file();
        let index = file.find_method(name, descriptor).unwrap();
        let code = file.methods[index].code(&file.constant_pool).unwrap().unwrap();
        disassemble(&code.code, &file.constant_pool).unwrap().into_iter().map(|(_, t)| t).collect()
    }

    #[test]
    fn test_accessor_reads_field() {
        let mut session = session_with(person());
        let member = MemberDescriptor::new("name", MethodDecl::new("getName", "java.lang.String", vec![]));
        AccessorGenerator::new(member.clone()).apply_to(&mut session).unwrap();
        AccessorGenerator::new(member).apply_to(&mut session).unwrap();
        assert_eq!(
            listing(&session, "getName", "()Ljava/lang/String;"),
            vec!["aload_0", "getfield demo/PersonImpl.name:Ljava/lang/String;", "areturn"]
        );
    }

    #[test]
    fn test_wrapped_accessor() {
        let mut session = session_with(person());
        let mut getter = MethodDecl::new("getName", "java.util.Optional<java.lang.String>", vec![]);
        let wrap = WrapDirective {
            template: "java.util.Optional.ofNullable(%s)".into(),
            stored_type: "java.lang.String".into(),
        };
        getter.directives.wrap = Some(wrap.clone());
        let member = MemberDescriptor::wrapped("name", getter, &wrap);
        AccessorGenerator::new(member).apply_to(&mut session).unwrap();
        let lines = listing(&session, "getName", "()Ljava/util/Optional;");
        assert!(lines.iter().any(|l| l.contains("java/util/Optional.ofNullable")));
    }

    #[test]
    fn test_mutator_variants() {
        let mut session = session_with(person());
        let setter = MethodDecl::new("setName", "void", vec![ParamDecl::new("name", "java.lang.String")]);
        MutatorGenerator::new("name", setter).apply_to(&mut session).unwrap();
        assert_eq!(
            listing(&session, "setName", "(Ljava/lang/String;)V"),
            vec!["aload_0", "aload_1", "putfield demo/PersonImpl.name:Ljava/lang/String;", "return"]
        );

        let chained = MethodDecl::new("name", "java.lang.CharSequence", vec![ParamDecl::new("name", "java.lang.String")]);
        MutatorGenerator::new("name", chained).apply_to(&mut session).unwrap();
        let lines = listing(&session, "name", "(Ljava/lang/String;)Ljava/lang/CharSequence;");
        assert_eq!(&lines[lines.len() - 2..], ["aload_0", "areturn"]);

        let wrong = MethodDecl::new("rename", "int", vec![ParamDecl::new("name", "java.lang.String")]);
        assert!(MutatorGenerator::new("name", wrong).apply_to(&mut session).is_err());
    }

    #[test]
    fn test_invocation_chain_return_modes() {
        let mut session = session_with(person());
        let directive = InvokeDirective {
            invocations: vec!["java.util.Objects.requireNonNull($1)".into(), "java.lang.String.valueOf($1)".into()],
            returns: ReturnMode::MethodCall,
        };
        let method = MethodDecl::new("describe", "java.lang.String", vec![ParamDecl::new("value", "java.lang.Object")]);
        InvokeGenerator::new(method, directive).apply_to(&mut session).unwrap();
        let lines = listing(&session, "describe", "(Ljava/lang/Object;)Ljava/lang/String;");
        assert!(lines.contains(&"pop".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("areturn"));

        let none = InvokeDirective { invocations: vec!["java.lang.String.valueOf($1)".into()], returns: ReturnMode::None };
        let method = MethodDecl::new("touch", "java.lang.String", vec![ParamDecl::new("value", "java.lang.Object")]);
        assert!(matches!(InvokeGenerator::new(method, none).apply_to(&mut session), Err(Error::Config { .. })));
    }
}
