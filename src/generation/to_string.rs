use tracing::debug;

use crate::ast::{ToStringDirective, TypeName};
use crate::codegen::flag::access_flags::ACC_PUBLIC;
use crate::codegen::tree::{Expr, MethodRef, Stmt};
use crate::consts::{GUAVA_MORE_OBJECTS, GUAVA_TO_STRING_HELPER, JAVA_LANG_STRING_BUILDER};
use crate::error::Result;
use crate::stack::Session;

use super::member::MemberDescriptor;
use super::Generator;

/// `toString()` built with a `StringBuilder` or Guava's `ToStringHelper`
#[derive(Debug, Clone)]
pub struct ToStringGenerator {
    members: Vec<MemberDescriptor>,
    directive: ToStringDirective,
}

/// Parameter type of the overload a value of type `ty` is passed to
fn overload_param(ty: &TypeName, strings: bool) -> TypeName {
    match ty.as_str() {
        "java.lang.String" if strings => TypeName::string(),
        "byte" | "short" | "int" => TypeName::int(),
        "boolean" | "char" | "long" | "float" | "double" => ty.clone(),
        _ => TypeName::object(),
    }
}

impl ToStringGenerator {
    pub fn new(members: Vec<MemberDescriptor>, directive: ToStringDirective) -> Self {
        Self { members, directive }
    }

    fn included(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.members.iter().filter(|m| !m.is_void() && !m.accessor().directives.to_string_exclude)
    }

    pub fn body(&self, owner: &TypeName, superclass: &TypeName) -> Vec<Stmt> {
        let value = if self.directive.use_to_string_helper {
            self.helper_chain(owner)
        } else {
            self.builder_chain(owner, superclass)
        };
        vec![Stmt::Return(Some(value))]
    }

    fn builder_chain(&self, owner: &TypeName, superclass: &TypeName) -> Expr {
        let builder = TypeName::new(JAVA_LANG_STRING_BUILDER);
        let append = |target: Expr, value: Expr, ty: &TypeName| {
            let method = MethodRef::new(builder.clone(), "append", vec![overload_param(ty, true)], builder.clone());
            Expr::invoke_virtual(target, method, vec![value])
        };
        let string = TypeName::string();
        let opening = Expr::str(format!("{}{{", owner.simple_name()));
        let mut chain = Expr::new_object(builder.clone(), vec![string.clone()], vec![opening]);
        for (i, member) in self.included().enumerate() {
            if i > 0 {
                chain = append(chain, Expr::str(", "), &string);
            }
            chain = append(chain, Expr::str(format!("{}=", member.storage_name())), &string);
            chain = append(chain, member.read_via_accessor(owner, Expr::This), member.exposed_type());
        }
        chain = append(chain, Expr::str("}"), &string);
        if self.directive.call_super {
            let to_string = MethodRef::new(superclass.clone(), "toString", vec![], string.clone());
            chain = append(chain, Expr::invoke_super(to_string, vec![]), &string);
        }
        let to_string = MethodRef::new(builder, "toString", vec![], string);
        Expr::invoke_virtual(chain, to_string, vec![])
    }

    fn helper_chain(&self, owner: &TypeName) -> Expr {
        let helper = TypeName::new(GUAVA_TO_STRING_HELPER);
        let string = TypeName::string();
        let create = MethodRef::new(GUAVA_MORE_OBJECTS, "toStringHelper", vec![TypeName::object()], helper.clone());
        let mut chain = Expr::invoke_static(create, vec![Expr::This]);
        for member in self.included() {
            let param = overload_param(member.exposed_type(), false);
            let add = MethodRef::new(helper.clone(), "add", vec![string.clone(), param], helper.clone());
            let args = vec![Expr::str(member.storage_name()), member.read_via_accessor(owner, Expr::This)];
            chain = Expr::invoke_virtual(chain, add, args);
        }
        Expr::invoke_virtual(chain, MethodRef::new(helper, "toString", vec![], string), vec![])
    }
}

impl Generator for ToStringGenerator {
    fn apply_to(&self, session: &mut Session) -> Result<()> {
        let class = session.current_class()?;
        if class.has_method("toString", "()Ljava/lang/String;") {
            debug!(class = %class.name(), "toString already declared");
            return Ok(());
        }
        let owner = class.name().clone();
        let superclass = class.superclass()?.unwrap_or_else(TypeName::object);
        let body = self.body(&owner, &superclass);
        session.current_class_mut()?.add_method(ACC_PUBLIC, "toString", &[], &TypeName::string(), &body)
    }

    fn describe(&self) -> String {
        let style = if self.directive.use_to_string_helper { "helper" } else { "builder" };
        format!("toString ({style}) over {} members", self.included().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MethodDecl;
    use pretty_assertions::assert_eq;

    fn members() -> Vec<MemberDescriptor> {
        vec![
            MemberDescriptor::new("name", MethodDecl::new("getName", "java.lang.String", vec![])),
            MemberDescriptor::new("age", MethodDecl::new("getAge", "int", vec![])),
        ]
    }

    #[test]
    fn test_builder_style() {
        let owner = TypeName::new("demo.PersonImpl");
        let body = ToStringGenerator::new(members(), ToStringDirective::default()).body(&owner, &TypeName::object());
        assert_eq!(
            body[0].to_string(),
            "return new java.lang.StringBuilder(\"PersonImpl{\").append(\"name=\").append(this.getName())\
             .append(\", \").append(\"age=\").append(this.getAge()).append(\"}\").toString();"
        );
    }

    #[test]
    fn test_builder_appends_super_after_brace() {
        let owner = TypeName::new("demo.PersonImpl");
        let directive = ToStringDirective { call_super: true, use_to_string_helper: false };
        let body = ToStringGenerator::new(Vec::new(), directive).body(&owner, &TypeName::object());
        assert_eq!(
            body[0].to_string(),
            "return new java.lang.StringBuilder(\"PersonImpl{\").append(\"}\").append(super.toString()).toString();"
        );
    }

    #[test]
    fn test_helper_style() {
        let owner = TypeName::new("demo.PersonImpl");
        let directive = ToStringDirective { call_super: false, use_to_string_helper: true };
        let body = ToStringGenerator::new(members(), directive).body(&owner, &TypeName::object());
        assert_eq!(
            body[0].to_string(),
            "return com.google.common.base.MoreObjects.toStringHelper(this).add(\"name\", this.getName())\
             .add(\"age\", this.getAge()).toString();"
        );
    }
}
