//! Synthesizers: one queued action per generated member
//!
//! Each action compiles its member against the session's current class.
//! Members that already exist on the class are left alone, so running the
//! same queue against a pre-populated class adds nothing twice.

pub mod constructor;
pub mod equals;
pub mod factory;
pub mod field;
pub mod hash_code;
pub mod member;
pub mod method;
pub mod non_null;
pub mod to_string;

use crate::ast::TypeName;
use crate::codegen::tree::Expr;
use crate::consts::JAVA_LANG_OBJECT;
use crate::error::{Error, Result};
use crate::pool::ClassPool;
use crate::stack::Session;

pub use constructor::ConstructorGenerator;
pub use equals::EqualsGenerator;
pub use factory::FactoryGenerator;
pub use field::FieldGenerator;
pub use hash_code::HashCodeGenerator;
pub use member::MemberDescriptor;
pub use method::{AccessorGenerator, InvokeGenerator, MutatorGenerator};
pub use non_null::NonNullGenerator;
pub use to_string::ToStringGenerator;

/// A queued generation action
pub trait Generator: Send + Sync {
    fn apply_to(&self, session: &mut Session) -> Result<()>;

    /// Short label for logs and queue dumps
    fn describe(&self) -> String;
}

/// Whether a reference to the class under construction is assignable to `ty`
pub(crate) fn current_is_subtype(session: &mut Session, ty: &TypeName) -> Result<bool> {
    let class = session.current_class()?;
    if class.name() == ty || ty.as_str() == JAVA_LANG_OBJECT {
        return Ok(true);
    }
    let mut roots = class.interfaces()?;
    roots.extend(class.superclass()?);
    for root in roots {
        if session.pool().is_subtype(&root, ty)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Convert a value of type `from` for use where `to` is expected: boxing,
/// unboxing or a checked cast between reference types
pub fn adapt(pool: &mut ClassPool, value: Expr, from: &TypeName, to: &TypeName) -> Result<Expr> {
    if from == to {
        return Ok(value);
    }
    let rendered = value.to_string();
    let mismatch = || Error::codegen(format!("cannot convert `{rendered}` of type {from} to {to}"));
    match (from.is_primitive(), to.is_primitive()) {
        (false, false) => {
            if from.is_void() || to.is_void() {
                return Err(mismatch());
            }
            if pool.is_subtype(from, to)? {
                Ok(value)
            } else {
                Ok(Expr::cast(to.clone(), value))
            }
        }
        (true, true) => {
            if to.as_str() == "int" && from.is_int_like() && from.as_str() != "boolean" {
                Ok(value)
            } else {
                Err(mismatch())
            }
        }
        (true, false) => {
            let wrapper = from.boxed().ok_or_else(mismatch)?;
            if pool.is_subtype(&wrapper, to)? {
                Ok(Expr::boxed(value, from.clone()))
            } else {
                Err(mismatch())
            }
        }
        (false, true) => {
            let wrapper = to.boxed().ok_or_else(mismatch)?;
            let value = if from == &wrapper { value } else { Expr::cast(wrapper, value) };
            Ok(Expr::Unboxed { value: Box::new(value), to: to.clone() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::defs::major_versions::JAVA_8;

    #[test]
    fn test_adapt() {
        let mut pool = ClassPool::with_system(JAVA_8, false);
        let object = TypeName::object();
        let boxed = adapt(&mut pool, Expr::Param(1), &TypeName::int(), &object).unwrap();
        assert_eq!(boxed.to_string(), "java.lang.Integer.valueOf($1)");
        let cast = adapt(&mut pool, Expr::Param(1), &object, &TypeName::string()).unwrap();
        assert_eq!(cast.to_string(), "((java.lang.String) $1)");
        let unboxed = adapt(&mut pool, Expr::Param(1), &object, &TypeName::int()).unwrap();
        assert_eq!(unboxed.to_string(), "((java.lang.Integer) $1).intValue()");
        assert!(adapt(&mut pool, Expr::Param(1), &TypeName::new("long"), &TypeName::int()).is_err());
    }
}
