use tracing::debug;

use crate::ast::{EqualsDirective, TypeName};
use crate::codegen::flag::access_flags::ACC_PUBLIC;
use crate::codegen::tree::{Expr, MethodRef, Stmt};
use crate::consts::{JAVA_LANG_OBJECT, JAVA_UTIL_OBJECTS};
use crate::error::Result;
use crate::stack::Session;

use super::member::MemberDescriptor;
use super::Generator;

const OTHER: &str = "that";

/// `equals(Object)` comparing every included member through its accessor
#[derive(Debug, Clone)]
pub struct EqualsGenerator {
    members: Vec<MemberDescriptor>,
    directive: EqualsDirective,
}

impl EqualsGenerator {
    pub fn new(members: Vec<MemberDescriptor>, directive: EqualsDirective) -> Self {
        Self { members, directive }
    }

    fn included(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.members.iter().filter(|m| !m.is_void() && !m.accessor().directives.equals_exclude)
    }

    fn compare(&self, owner: &TypeName, member: &MemberDescriptor) -> Expr {
        let ours = member.read_via_accessor(owner, Expr::This);
        let theirs = member.read_via_accessor(owner, Expr::local(OTHER, owner.clone()));
        let object = TypeName::object();
        let ty = member.exposed_type();
        if matches!(ty.as_str(), "float" | "double") {
            // NaN equals itself and -0.0 differs from 0.0, as in Float.equals
            let boxed = ty.boxed().unwrap_or_else(|| ty.clone());
            let compare = MethodRef::new(boxed, "compare", vec![ty.clone(), ty.clone()], TypeName::int());
            Expr::eq(Expr::invoke_static(compare, vec![ours, theirs]), Expr::Int(0))
        } else if ty.is_primitive() {
            Expr::eq(ours, theirs)
        } else if self.directive.prevent_nullability_issues {
            let equals = MethodRef::new(JAVA_UTIL_OBJECTS, "equals", vec![object.clone(), object], TypeName::boolean());
            Expr::invoke_static(equals, vec![ours, theirs])
        } else {
            let equals = MethodRef::new(JAVA_LANG_OBJECT, "equals", vec![object], TypeName::boolean());
            Expr::invoke_virtual(ours, equals, vec![theirs])
        }
    }

    /// Body of `equals`; `superclass` receives the optional `super.equals` call
    pub fn body(&self, owner: &TypeName, superclass: &TypeName) -> Vec<Stmt> {
        let object = TypeName::object();
        let get_class = MethodRef::new(JAVA_LANG_OBJECT, "getClass", vec![], TypeName::new("java.lang.Class"));
        let mut body = vec![
            Stmt::If { cond: Expr::eq(Expr::Param(1), Expr::This), then: vec![Stmt::Return(Some(Expr::Bool(true)))] },
            Stmt::If { cond: Expr::eq(Expr::Param(1), Expr::Null), then: vec![Stmt::Return(Some(Expr::Bool(false)))] },
            Stmt::If {
                cond: Expr::ne(
                    Expr::invoke_virtual(Expr::Param(1), get_class.clone(), vec![]),
                    Expr::invoke_virtual(Expr::This, get_class, vec![]),
                ),
                then: vec![Stmt::Return(Some(Expr::Bool(false)))],
            },
        ];

        let mut checks: Vec<Expr> = self.included().map(|m| self.compare(owner, m)).collect();
        if checks.is_empty() {
            body.push(Stmt::Return(Some(Expr::Bool(true))));
            return body;
        }
        if self.directive.call_super {
            let equals = MethodRef::new(superclass.clone(), "equals", vec![object], TypeName::boolean());
            checks.push(Expr::invoke_super(equals, vec![Expr::Param(1)]));
        }
        body.push(Stmt::DeclareLocal {
            name: OTHER.to_string(),
            ty: owner.clone(),
            value: Expr::cast(owner.clone(), Expr::Param(1)),
        });
        body.push(Stmt::Return(Some(Expr::And(checks))));
        body
    }
}

impl Generator for EqualsGenerator {
    fn apply_to(&self, session: &mut Session) -> Result<()> {
        let class = session.current_class()?;
        let params = [TypeName::object()];
        if class.has_method("equals", "(Ljava/lang/Object;)Z") {
            debug!(class = %class.name(), "equals already declared");
            return Ok(());
        }
        let owner = class.name().clone();
        let superclass = class.superclass()?.unwrap_or_else(TypeName::object);
        let body = self.body(&owner, &superclass);
        session.current_class_mut()?.add_method(ACC_PUBLIC, "equals", &params, &TypeName::boolean(), &body)
    }

    fn describe(&self) -> String {
        format!("equals over {} members", self.included().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MethodDecl;
    use crate::codegen::tree::render_body;
    use pretty_assertions::assert_eq;

    fn members() -> Vec<MemberDescriptor> {
        let mut hidden = MethodDecl::new("getSecret", "java.lang.String", vec![]);
        hidden.directives.equals_exclude = true;
        vec![
            MemberDescriptor::new("name", MethodDecl::new("getName", "java.lang.String", vec![])),
            MemberDescriptor::new("age", MethodDecl::new("getAge", "int", vec![])),
            MemberDescriptor::new("secret", hidden),
        ]
    }

    #[test]
    fn test_equals_body() {
        let owner = TypeName::new("demo.PersonImpl");
        let directive = EqualsDirective { call_super: true, prevent_nullability_issues: true };
        let body = EqualsGenerator::new(members(), directive).body(&owner, &TypeName::object());
        assert_eq!(
            render_body(&body),
            [
                "if ($1 == this) { return true; }",
                "if ($1 == null) { return false; }",
                "if ($1.getClass() != this.getClass()) { return false; }",
                "demo.PersonImpl that = ((demo.PersonImpl) $1);",
                "return java.util.Objects.equals(this.getName(), that.getName()) && this.getAge() == that.getAge() && super.equals($1);",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_plain_equals_and_empty_body() {
        let owner = TypeName::new("demo.PersonImpl");
        let directive = EqualsDirective { call_super: true, prevent_nullability_issues: false };
        let body = EqualsGenerator::new(members()[..1].to_vec(), directive.clone()).body(&owner, &TypeName::object());
        assert_eq!(body.last().unwrap().to_string(), "return this.getName().equals(that.getName()) && super.equals($1);");

        let body = EqualsGenerator::new(Vec::new(), directive).body(&owner, &TypeName::object());
        assert_eq!(body.len(), 4);
        assert_eq!(body[3].to_string(), "return true;");
    }

    #[test]
    fn test_floating_point_members_use_compare() {
        let owner = TypeName::new("demo.PointImpl");
        let members = vec![
            MemberDescriptor::new("x", MethodDecl::new("getX", "double", vec![])),
            MemberDescriptor::new("weight", MethodDecl::new("getWeight", "float", vec![])),
        ];
        let body = EqualsGenerator::new(members, EqualsDirective::default()).body(&owner, &TypeName::object());
        assert_eq!(
            body.last().unwrap().to_string(),
            "return java.lang.Double.compare(this.getX(), that.getX()) == 0 && java.lang.Float.compare(this.getWeight(), that.getWeight()) == 0;"
        );
    }
}
