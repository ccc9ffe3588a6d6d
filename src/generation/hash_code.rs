use tracing::debug;

use crate::ast::{HashCodeDirective, TypeName};
use crate::codegen::flag::access_flags::ACC_PUBLIC;
use crate::codegen::tree::{Expr, MethodRef, Stmt};
use crate::consts::{HASH_MULTIPLIER, HASH_SEED, JAVA_UTIL_OBJECTS};
use crate::error::Result;
use crate::stack::Session;

use super::member::MemberDescriptor;
use super::Generator;

const RESULT: &str = "result";

/// `hashCode()` folding every included member into one `Objects.hash` call
#[derive(Debug, Clone)]
pub struct HashCodeGenerator {
    members: Vec<MemberDescriptor>,
    directive: HashCodeDirective,
}

fn accumulate(value: Expr) -> Stmt {
    let result = Expr::local(RESULT, TypeName::int());
    Stmt::SetLocal { name: RESULT.to_string(), value: Expr::add(Expr::mul(result, Expr::Int(HASH_MULTIPLIER)), value) }
}

impl HashCodeGenerator {
    pub fn new(members: Vec<MemberDescriptor>, directive: HashCodeDirective) -> Self {
        Self { members, directive }
    }

    fn included(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.members.iter().filter(|m| !m.is_void() && !m.accessor().directives.hash_code_exclude)
    }

    pub fn body(&self, owner: &TypeName, superclass: &TypeName) -> Vec<Stmt> {
        let mut body = vec![Stmt::DeclareLocal { name: RESULT.to_string(), ty: TypeName::int(), value: Expr::Int(HASH_SEED) }];
        if self.directive.call_super {
            let hash_code = MethodRef::new(superclass.clone(), "hashCode", vec![], TypeName::int());
            body.push(accumulate(Expr::invoke_super(hash_code, vec![])));
        }
        let values: Vec<Expr> = self
            .included()
            .map(|m| {
                let value = m.read_via_accessor(owner, Expr::This);
                if m.exposed_type().is_primitive() {
                    Expr::boxed(value, m.exposed_type().clone())
                } else {
                    value
                }
            })
            .collect();
        if !values.is_empty() {
            let object = TypeName::object();
            let hash = MethodRef::new(JAVA_UTIL_OBJECTS, "hash", vec![object.array_of()], TypeName::int());
            let array = Expr::NewArray { element: object, items: values };
            body.push(accumulate(Expr::invoke_static(hash, vec![array])));
        }
        body.push(Stmt::Return(Some(Expr::local(RESULT, TypeName::int()))));
        body
    }
}

impl Generator for HashCodeGenerator {
    fn apply_to(&self, session: &mut Session) -> Result<()> {
        let class = session.current_class()?;
        if class.has_method("hashCode", "()I") {
            debug!(class = %class.name(), "hashCode already declared");
            return Ok(());
        }
        let owner = class.name().clone();
        let superclass = class.superclass()?.unwrap_or_else(TypeName::object);
        let body = self.body(&owner, &superclass);
        session.current_class_mut()?.add_method(ACC_PUBLIC, "hashCode", &[], &TypeName::int(), &body)
    }

    fn describe(&self) -> String {
        format!("hashCode over {} members", self.included().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MethodDecl;
    use crate::codegen::tree::render_body;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hash_code_body() {
        let mut skipped = MethodDecl::new("getCache", "java.lang.Object", vec![]);
        skipped.directives.hash_code_exclude = true;
        let members = vec![
            MemberDescriptor::new("name", MethodDecl::new("getName", "java.lang.String", vec![])),
            MemberDescriptor::new("age", MethodDecl::new("getAge", "int", vec![])),
            MemberDescriptor::new("cache", skipped),
        ];
        let owner = TypeName::new("demo.PersonImpl");
        let body = HashCodeGenerator::new(members, HashCodeDirective { call_super: true }).body(&owner, &TypeName::object());
        assert_eq!(
            render_body(&body),
            [
                "int result = 1;",
                "result = result * 59 + super.hashCode();",
                "result = result * 59 + java.util.Objects.hash(new java.lang.Object[]{this.getName(), java.lang.Integer.valueOf(this.getAge())});",
                "return result;",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_no_members_returns_seed() {
        let body = HashCodeGenerator::new(Vec::new(), HashCodeDirective::default())
            .body(&TypeName::new("demo.EmptyImpl"), &TypeName::object());
        assert_eq!(render_body(&body), "int result = 1;\nreturn result;");
    }
}
