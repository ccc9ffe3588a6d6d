//! Typed statement and expression tree for synthesized method bodies
//!
//! Synthesizers build bodies from these nodes; [`super::gen`] lowers them to
//! bytecode. `Display` renders a Java-like form used in logs and tests.

use std::fmt;

use crate::ast::TypeName;

use super::descriptor::method_descriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub owner: TypeName,
    pub name: String,
    pub ty: TypeName,
}

impl FieldRef {
    pub fn new(owner: TypeName, name: impl Into<String>, ty: TypeName) -> Self {
        Self { owner, name: name.into(), ty }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    pub owner: TypeName,
    pub name: String,
    pub params: Vec<TypeName>,
    pub ret: TypeName,
    /// Owner is an interface (InterfaceMethodref)
    pub interface: bool,
}

impl MethodRef {
    pub fn new(owner: impl Into<TypeName>, name: impl Into<String>, params: Vec<TypeName>, ret: TypeName) -> Self {
        Self { owner: owner.into(), name: name.into(), params, ret, interface: false }
    }

    pub fn on_interface(mut self) -> Self {
        self.interface = true;
        self
    }

    pub fn descriptor(&self) -> String {
        method_descriptor(&self.params, &self.ret)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
    Static,
    Virtual,
    Interface,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Mul,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    This,
    /// 1-based method parameter
    Param(u16),
    Local { name: String, ty: TypeName },
    Null,
    Bool(bool),
    Int(i32),
    Str(String),
    GetField { target: Box<Expr>, field: FieldRef },
    GetStatic(FieldRef),
    Invoke { kind: InvokeKind, method: MethodRef, target: Option<Box<Expr>>, args: Vec<Expr> },
    New { class: TypeName, params: Vec<TypeName>, args: Vec<Expr> },
    NewArray { element: TypeName, items: Vec<Expr> },
    Cast { ty: TypeName, value: Box<Expr> },
    /// Primitive to wrapper via `valueOf`
    Boxed { value: Box<Expr>, from: TypeName },
    /// Wrapper to primitive via `xxxValue()`
    Unboxed { value: Box<Expr>, to: TypeName },
    And(Vec<Expr>),
    Compare { op: CompareOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Arith { op: ArithOp, lhs: Box<Expr>, rhs: Box<Expr> },
}

impl Expr {
    pub fn local(name: impl Into<String>, ty: TypeName) -> Self {
        Expr::Local { name: name.into(), ty }
    }

    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    pub fn get_field(target: Expr, field: FieldRef) -> Self {
        Expr::GetField { target: Box::new(target), field }
    }

    pub fn invoke_static(method: MethodRef, args: Vec<Expr>) -> Self {
        Expr::Invoke { kind: InvokeKind::Static, method, target: None, args }
    }

    /// invokevirtual, or invokeinterface when the owner is an interface
    pub fn invoke_virtual(target: Expr, method: MethodRef, args: Vec<Expr>) -> Self {
        let kind = if method.interface { InvokeKind::Interface } else { InvokeKind::Virtual };
        Expr::Invoke { kind, method, target: Some(Box::new(target)), args }
    }

    /// Non-virtual call on `this`, used for `super.m(...)`
    pub fn invoke_super(method: MethodRef, args: Vec<Expr>) -> Self {
        Expr::Invoke { kind: InvokeKind::Special, method, target: Some(Box::new(Expr::This)), args }
    }

    pub fn new_object(class: TypeName, params: Vec<TypeName>, args: Vec<Expr>) -> Self {
        Expr::New { class, params, args }
    }

    pub fn cast(ty: TypeName, value: Expr) -> Self {
        Expr::Cast { ty, value: Box::new(value) }
    }

    pub fn boxed(value: Expr, from: TypeName) -> Self {
        Expr::Boxed { value: Box::new(value), from }
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Expr::Compare { op: CompareOp::Eq, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn ne(lhs: Expr, rhs: Expr) -> Self {
        Expr::Compare { op: CompareOp::Ne, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Expr::Arith { op: ArithOp::Add, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn mul(lhs: Expr, rhs: Expr) -> Self {
        Expr::Arith { op: ArithOp::Mul, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    /// Static type of the value this expression leaves on the stack;
    /// `None` when it refers to a parameter that does not exist
    pub fn value_type(&self, this_class: &TypeName, params: &[TypeName]) -> Option<TypeName> {
        Some(match self {
            Expr::This => this_class.clone(),
            Expr::Param(index) => params.get((*index as usize).checked_sub(1)?)?.clone(),
            Expr::Local { ty, .. } => ty.clone(),
            Expr::Null => TypeName::null(),
            Expr::Bool(_) | Expr::And(_) | Expr::Compare { .. } => TypeName::boolean(),
            Expr::Int(_) | Expr::Arith { .. } => TypeName::int(),
            Expr::Str(_) => TypeName::string(),
            Expr::GetField { field, .. } | Expr::GetStatic(field) => field.ty.clone(),
            Expr::Invoke { method, .. } => method.ret.clone(),
            Expr::New { class, .. } => class.clone(),
            Expr::NewArray { element, .. } => element.array_of(),
            Expr::Cast { ty, .. } => ty.clone(),
            Expr::Boxed { from, .. } => from.boxed()?,
            Expr::Unboxed { to, .. } => to.clone(),
        })
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::This => f.write_str("this"),
            Expr::Param(index) => write!(f, "${index}"),
            Expr::Local { name, .. } => f.write_str(name),
            Expr::Null => f.write_str("null"),
            Expr::Bool(value) => write!(f, "{value}"),
            Expr::Int(value) => write!(f, "{value}"),
            Expr::Str(value) => write!(f, "{value:?}"),
            Expr::GetField { target, field } => write!(f, "{target}.{}", field.name),
            Expr::GetStatic(field) => write!(f, "{}.{}", field.owner, field.name),
            Expr::Invoke { kind, method, target, args } => {
                match (kind, target) {
                    (InvokeKind::Static, _) | (_, None) => write!(f, "{}.{}(", method.owner, method.name)?,
                    (InvokeKind::Special, Some(t)) if **t == Expr::This => write!(f, "super.{}(", method.name)?,
                    (_, Some(t)) => write!(f, "{t}.{}(", method.name)?,
                }
                write_joined(f, args, ", ")?;
                f.write_str(")")
            }
            Expr::New { class, args, .. } => {
                write!(f, "new {class}(")?;
                write_joined(f, args, ", ")?;
                f.write_str(")")
            }
            Expr::NewArray { element, items } => {
                write!(f, "new {element}[]{{")?;
                write_joined(f, items, ", ")?;
                f.write_str("}")
            }
            Expr::Cast { ty, value } => write!(f, "(({ty}) {value})"),
            Expr::Boxed { value, from } => match from.boxed() {
                Some(wrapper) => write!(f, "{wrapper}.valueOf({value})"),
                None => write!(f, "{value}"),
            },
            Expr::Unboxed { value, to } => write!(f, "{value}.{to}Value()"),
            Expr::And(items) if items.is_empty() => f.write_str("true"),
            Expr::And(items) => write_joined(f, items, " && "),
            Expr::Compare { op, lhs, rhs } => {
                let symbol = match op {
                    CompareOp::Eq => "==",
                    CompareOp::Ne => "!=",
                };
                write!(f, "{lhs} {symbol} {rhs}")
            }
            Expr::Arith { op: ArithOp::Add, lhs, rhs } => write!(f, "{lhs} + {rhs}"),
            Expr::Arith { op: ArithOp::Mul, lhs, rhs } => {
                let wrap = |e: &Expr| matches!(e, Expr::Arith { op: ArithOp::Add, .. });
                match (wrap(lhs), wrap(rhs)) {
                    (false, false) => write!(f, "{lhs} * {rhs}"),
                    (true, false) => write!(f, "({lhs}) * {rhs}"),
                    (false, true) => write!(f, "{lhs} * ({rhs})"),
                    (true, true) => write!(f, "({lhs}) * ({rhs})"),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    SetField { target: Expr, field: FieldRef, value: Expr },
    DeclareLocal { name: String, ty: TypeName, value: Expr },
    SetLocal { name: String, value: Expr },
    Expr(Expr),
    If { cond: Expr, then: Vec<Stmt> },
    Return(Option<Expr>),
    Throw(Expr),
    /// `super(...)` inside a constructor
    SuperInit { owner: TypeName, params: Vec<TypeName>, args: Vec<Expr> },
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::SetField { target, field, value } => write!(f, "{target}.{} = {value};", field.name),
            Stmt::DeclareLocal { name, ty, value } => write!(f, "{ty} {name} = {value};"),
            Stmt::SetLocal { name, value } => write!(f, "{name} = {value};"),
            Stmt::Expr(expr) => write!(f, "{expr};"),
            Stmt::If { cond, then } => {
                write!(f, "if ({cond}) {{ ")?;
                write_joined(f, then, " ")?;
                f.write_str(" }")
            }
            Stmt::Return(None) => f.write_str("return;"),
            Stmt::Return(Some(expr)) => write!(f, "return {expr};"),
            Stmt::Throw(expr) => write!(f, "throw {expr};"),
            Stmt::SuperInit { args, .. } => {
                f.write_str("super(")?;
                write_joined(f, args, ", ")?;
                f.write_str(");")
            }
        }
    }
}

/// Render a body one statement per line
pub fn render_body(body: &[Stmt]) -> String {
    body.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_guard() {
        let guard = Stmt::If {
            cond: Expr::eq(Expr::Param(1), Expr::Null),
            then: vec![Stmt::Throw(Expr::new_object(
                TypeName::new("java.lang.NullPointerException"),
                vec![TypeName::string()],
                vec![Expr::str("Argument index 1 must not be null")],
            ))],
        };
        assert_eq!(
            guard.to_string(),
            "if ($1 == null) { throw new java.lang.NullPointerException(\"Argument index 1 must not be null\"); }"
        );
    }

    #[test]
    fn test_render_super_and_arith() {
        let hash = MethodRef::new("java.lang.Object", "hashCode", vec![], TypeName::int());
        let expr = Expr::add(
            Expr::mul(Expr::local("result", TypeName::int()), Expr::Int(59)),
            Expr::invoke_super(hash, vec![]),
        );
        assert_eq!(expr.to_string(), "result * 59 + super.hashCode()");
    }

    #[test]
    fn test_value_types() {
        let this = TypeName::new("demo.PersonImpl");
        let params = vec![TypeName::new("long")];
        assert_eq!(Expr::Param(1).value_type(&this, &params), Some(TypeName::new("long")));
        assert_eq!(Expr::Param(2).value_type(&this, &params), None);
        assert_eq!(Expr::Param(0).value_type(&this, &params), None);
        assert_eq!(
            Expr::boxed(Expr::Param(1), TypeName::new("long")).value_type(&this, &params),
            Some(TypeName::new("java.lang.Long"))
        );
    }
}
