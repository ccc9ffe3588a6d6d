//! Null-check guards inserted at the top of an existing method body

use tracing::{debug, warn};

use crate::ast::{MethodDecl, NonNullDirective, NonNullHandler, TypeName};
use crate::codegen::defs::CONSTRUCTOR_METHOD_NAME;
use crate::codegen::descriptor::method_descriptor;
use crate::codegen::tree::{Expr, MethodRef, Stmt};
use crate::consts::{APACHE_VALIDATE, GUAVA_PRECONDITIONS};
use crate::error::{Error, Result};
use crate::pool::ClassPool;
use crate::stack::Session;

use super::Generator;

#[derive(Debug, Clone)]
pub struct NonNullGenerator {
    method: String,
    params: Vec<TypeName>,
    ret: TypeName,
    guards: Vec<(u16, NonNullDirective)>,
}

/// Message with the parameter index substituted for `{0}`
pub fn format_message(template: &str, index: u16) -> String {
    template.replace("{0}", &index.to_string())
}

impl NonNullGenerator {
    pub fn new(method: &MethodDecl) -> Self {
        Self {
            method: method.name.clone(),
            params: method.param_types(),
            ret: method.return_type.clone(),
            guards: method.non_null_params().into_iter().map(|(i, d)| (i, d.clone())).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// One statement per guarded reference parameter; primitives are skipped
    pub fn guards(&self, pool: &mut ClassPool) -> Result<Vec<Stmt>> {
        let mut body = Vec::with_capacity(self.guards.len());
        for (index, directive) in &self.guards {
            let ty = &self.params[*index as usize - 1];
            if ty.is_primitive() {
                warn!(method = %self.method, index, ty = %ty, "skipping null check of primitive parameter");
                continue;
            }
            body.push(guard(pool, *index, directive)?);
        }
        Ok(body)
    }
}

fn require_class(pool: &mut ClassPool, name: &str) -> Result<TypeName> {
    match pool.find(name)? {
        Some(handle) => Ok(handle.name().clone()),
        None => Err(Error::missing(name)),
    }
}

fn guard(pool: &mut ClassPool, index: u16, directive: &NonNullDirective) -> Result<Stmt> {
    let message = Expr::str(format_message(directive.message(), index));
    let object = TypeName::object();
    let string = TypeName::string();
    let no_args = Expr::NewArray { element: object.clone(), items: Vec::new() };
    let check = |owner: TypeName, name: &str| {
        let params = vec![object.clone(), string.clone(), object.array_of()];
        let method = MethodRef::new(owner, name, params, object.clone());
        Stmt::Expr(Expr::invoke_static(method, vec![Expr::Param(index), message.clone(), no_args.clone()]))
    };
    match directive.handler {
        NonNullHandler::Custom => {
            let exception = require_class(pool, directive.exception())?;
            let init = method_descriptor(&[string.clone()], &TypeName::void());
            if !pool.get(exception.as_str())?.has_method(CONSTRUCTOR_METHOD_NAME, &init) {
                return Err(Error::config(format!("{exception} has no constructor taking a message")));
            }
            Ok(Stmt::If {
                cond: Expr::eq(Expr::Param(index), Expr::Null),
                then: vec![Stmt::Throw(Expr::new_object(exception, vec![string.clone()], vec![message.clone()]))],
            })
        }
        NonNullHandler::GuavaPreconditions => Ok(check(require_class(pool, GUAVA_PRECONDITIONS)?, "checkNotNull")),
        NonNullHandler::ApacheValidate => Ok(check(require_class(pool, APACHE_VALIDATE)?, "notNull")),
    }
}

impl Generator for NonNullGenerator {
    fn apply_to(&self, session: &mut Session) -> Result<()> {
        let body = self.guards(session.pool())?;
        if body.is_empty() {
            return Ok(());
        }
        let descriptor = method_descriptor(&self.params, &self.ret);
        let class = session.current_class_mut()?;
        class.insert_before(&self.method, &descriptor, &body)?;
        debug!(class = %class.name(), method = %self.method, guards = body.len(), "inserted null checks");
        Ok(())
    }

    fn describe(&self) -> String {
        let indices: Vec<String> = self.guards.iter().map(|(i, _)| format!("${i}")).collect();
        format!("non-null {}({})", self.method, indices.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ParamDecl;
    use crate::codegen::defs::major_versions::JAVA_8;
    use crate::codegen::tree::render_body;

    fn method(handler: NonNullHandler) -> MethodDecl {
        let mut name = ParamDecl::new("name", "java.lang.String");
        name.non_null = Some(NonNullDirective { handler, ..Default::default() });
        let mut age = ParamDecl::new("age", "int");
        age.non_null = Some(NonNullDirective::default());
        MethodDecl::new("rename", "void", vec![age, name])
    }

    #[test]
    fn test_default_guard_formats_index_once() {
        let mut pool = ClassPool::with_system(JAVA_8, false);
        let body = NonNullGenerator::new(&method(NonNullHandler::Custom)).guards(&mut pool).unwrap();
        assert_eq!(
            render_body(&body),
            "if ($2 == null) { throw new java.lang.NullPointerException(\"Argument index 2 must not be null\"); }"
        );
    }

    #[test]
    fn test_library_guards() {
        let mut pool = ClassPool::with_system(JAVA_8, false);
        let body = NonNullGenerator::new(&method(NonNullHandler::GuavaPreconditions)).guards(&mut pool).unwrap();
        assert_eq!(
            render_body(&body),
            "com.google.common.base.Preconditions.checkNotNull($2, \"Argument index 2 must not be null\", new java.lang.Object[]{});"
        );
        let body = NonNullGenerator::new(&method(NonNullHandler::ApacheValidate)).guards(&mut pool).unwrap();
        assert!(render_body(&body).starts_with("org.apache.commons.lang3.Validate.notNull($2"));
    }

    #[test]
    fn test_unknown_exception_is_missing() {
        let mut pool = ClassPool::with_system(JAVA_8, false);
        let mut param = ParamDecl::new("name", "java.lang.String");
        param.non_null = Some(NonNullDirective { exception: "demo.NoSuchException".into(), ..Default::default() });
        let method = MethodDecl::new("rename", "void", vec![param]);
        let err = NonNullGenerator::new(&method).guards(&mut pool).unwrap_err();
        assert!(matches!(err, Error::MissingSymbol { .. }));
    }
}
