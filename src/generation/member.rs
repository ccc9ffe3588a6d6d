use std::fmt;

use crate::ast::{MethodDecl, TypeName, WrapDirective};
use crate::codegen::tree::{Expr, FieldRef, MethodRef};

/// An accessor contract paired with the field that backs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    storage_name: String,
    /// Type of the backing field
    declared_type: TypeName,
    /// Type returned by the accessor; differs from the field type when wrapped
    exposed_type: TypeName,
    accessor: MethodDecl,
}

impl MemberDescriptor {
    pub fn new(storage_name: impl Into<String>, accessor: MethodDecl) -> Self {
        let ty = accessor.return_type.clone();
        Self { storage_name: storage_name.into(), declared_type: ty.clone(), exposed_type: ty, accessor }
    }

    /// Storage of `wrap.stored_type` exposed through the accessor's declared return type
    pub fn wrapped(storage_name: impl Into<String>, accessor: MethodDecl, wrap: &WrapDirective) -> Self {
        let exposed_type = accessor.return_type.clone();
        Self {
            storage_name: storage_name.into(),
            declared_type: TypeName::new(wrap.stored_type.as_str()),
            exposed_type,
            accessor,
        }
    }

    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    pub fn declared_type(&self) -> &TypeName {
        &self.declared_type
    }

    pub fn exposed_type(&self) -> &TypeName {
        &self.exposed_type
    }

    pub fn accessor(&self) -> &MethodDecl {
        &self.accessor
    }

    pub fn is_optional(&self) -> bool {
        self.accessor.directives.optional_field
    }

    /// Accessors returning void only look like getters
    pub fn is_void(&self) -> bool {
        self.exposed_type.is_void()
    }

    pub fn field_ref(&self, owner: &TypeName) -> FieldRef {
        FieldRef::new(owner.clone(), self.storage_name.as_str(), self.declared_type.clone())
    }

    /// `target.accessor()` dispatched through `owner`
    pub fn read_via_accessor(&self, owner: &TypeName, target: Expr) -> Expr {
        let method = MethodRef::new(owner.clone(), self.accessor.name.as_str(), vec![], self.exposed_type.clone());
        Expr::invoke_virtual(target, method, vec![])
    }
}

impl fmt::Display for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} via {}()", self.declared_type, self.storage_name, self.accessor.name)?;
        if self.declared_type != self.exposed_type {
            write!(f, " as {}", self.exposed_type)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_member_types() {
        let getter = MethodDecl::new("getNickname", "java.util.Optional<java.lang.String>", vec![]);
        let wrap = WrapDirective { template: "java.util.Optional.ofNullable(%s)".into(), stored_type: "java.lang.String".into() };
        let member = MemberDescriptor::wrapped("nickname", getter, &wrap);
        assert_eq!(member.declared_type(), &TypeName::string());
        assert_eq!(member.exposed_type(), &TypeName::new("java.util.Optional"));
        assert_eq!(member.to_string(), "java.lang.String nickname via getNickname() as java.util.Optional");
    }

    #[test]
    fn test_accessor_read() {
        let member = MemberDescriptor::new("age", MethodDecl::new("getAge", "int", vec![]));
        let owner = TypeName::new("demo.PersonImpl");
        assert_eq!(member.read_via_accessor(&owner, Expr::This).to_string(), "this.getAge()");
        assert_eq!(member.field_ref(&owner).ty, TypeName::int());
        assert!(!member.is_optional() && !member.is_void());
    }
}
