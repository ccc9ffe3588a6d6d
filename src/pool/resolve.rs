//! Binding of parsed templates to typed expression trees
//!
//! Names are looked up through the class pool. Method overloads are chosen
//! by the cheapest argument conversion: identity, reference widening and
//! int-like widening are cheap, boxing and unboxing cost more and varargs
//! packing is the last resort.

use tracing::trace;

use crate::ast::TypeName;
use crate::codegen::defs::CONSTRUCTOR_METHOD_NAME;
use crate::codegen::tree::{Expr, FieldRef, MethodRef};
use crate::consts::JAVA_LANG_SIMPLE_TYPES;
use crate::error::{Error, Result};
use crate::parser::TemplateExpr;

use super::handle::{ClassHandle, MethodSig};
use super::ClassPool;

const VARARGS_PENALTY: u32 = 100;

/// Resolution scope of one template: the enclosing class and method signature
pub struct Resolver<'a> {
    pool: &'a mut ClassPool,
    current: Option<&'a ClassHandle>,
    this_class: TypeName,
    params: Vec<TypeName>,
    is_static: bool,
    placeholder: Option<(Expr, TypeName)>,
}

impl<'a> Resolver<'a> {
    pub fn new(pool: &'a mut ClassPool, this_class: TypeName, params: Vec<TypeName>) -> Self {
        Self { pool, current: None, this_class, params, is_static: false, placeholder: None }
    }

    /// Class under construction, consulted before the pool for `this` members
    pub fn with_current(mut self, current: &'a ClassHandle) -> Self {
        self.current = Some(current);
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Value substituted for `%s`
    pub fn with_placeholder(mut self, value: Expr, ty: TypeName) -> Self {
        self.placeholder = Some((value, ty));
        self
    }

    pub fn resolve(&mut self, expr: &TemplateExpr) -> Result<(Expr, TypeName)> {
        let resolved = self.resolve_value(expr)?;
        trace!(template = %expr, resolved = %resolved.0, "resolved template");
        Ok(resolved)
    }

    fn error(expr: &TemplateExpr, message: impl Into<String>) -> Error {
        Error::template(expr.to_string(), message)
    }

    fn resolve_value(&mut self, expr: &TemplateExpr) -> Result<(Expr, TypeName)> {
        match expr {
            TemplateExpr::Placeholder => {
                self.placeholder.clone().ok_or_else(|| Self::error(expr, "`%s` is only allowed in wrap templates"))
            }
            TemplateExpr::This => {
                if self.is_static {
                    return Err(Self::error(expr, "`this` is not available in a static context"));
                }
                Ok((Expr::This, self.this_class.clone()))
            }
            TemplateExpr::Param(index) => {
                let ty = self
                    .params
                    .get(*index as usize - 1)
                    .cloned()
                    .ok_or_else(|| Self::error(expr, format!("method has only {} parameters", self.params.len())))?;
                Ok((Expr::Param(*index), ty))
            }
            TemplateExpr::AllParams => Err(Self::error(expr, "`$$` is only allowed as a call argument")),
            TemplateExpr::Null => Ok((Expr::Null, TypeName::null())),
            TemplateExpr::Bool(value) => Ok((Expr::Bool(*value), TypeName::boolean())),
            TemplateExpr::Int(value) => Ok((Expr::Int(*value), TypeName::int())),
            TemplateExpr::Str(value) => Ok((Expr::str(value.clone()), TypeName::string())),
            TemplateExpr::Path(parts) => self.resolve_path(expr, parts),
            TemplateExpr::Field { target, name } => {
                let (target, ty) = self.resolve_value(target)?;
                self.instance_field(expr, target, &ty, name)
            }
            TemplateExpr::Call { target, name, args } => self.resolve_call(expr, target.as_deref(), name, args),
            TemplateExpr::New { class, args } => {
                let class = self
                    .resolve_class(&class.split('.').map(str::to_string).collect::<Vec<_>>())?
                    .ok_or_else(|| Error::missing(class.as_str()))?;
                let args = self.resolve_args(args)?;
                let candidates = self.pool.methods_named(&class, CONSTRUCTOR_METHOD_NAME)?;
                let candidates: Vec<MethodSig> = candidates.into_iter().filter(|m| m.owner == class).collect();
                let (sig, args) = self.select(expr, &class, CONSTRUCTOR_METHOD_NAME, candidates, args)?;
                Ok((Expr::new_object(class.clone(), sig.params, args), class))
            }
        }
    }

    /// Name of a class denoted by a dotted path, trying `java.lang` for simple names
    fn resolve_class(&mut self, parts: &[String]) -> Result<Option<TypeName>> {
        let joined = parts.join(".");
        if self.pool.find(&joined)?.is_some() {
            return Ok(Some(TypeName::new(joined)));
        }
        if parts.len() == 1 {
            if JAVA_LANG_SIMPLE_TYPES.contains(&joined.as_str()) {
                return Ok(Some(TypeName::new(format!("java.lang.{joined}"))));
            }
            let package = self.this_class.package();
            if !package.is_empty() {
                let sibling = format!("{package}.{joined}");
                if self.pool.find(&sibling)?.is_some() {
                    return Ok(Some(TypeName::new(sibling)));
                }
            }
        }
        Ok(None)
    }

    fn this_roots(&self) -> Result<Vec<TypeName>> {
        match self.current {
            Some(current) => {
                let mut roots = Vec::new();
                if let Some(superclass) = current.superclass()? {
                    roots.push(superclass);
                }
                roots.extend(current.interfaces()?);
                Ok(roots)
            }
            None => Ok(vec![self.this_class.clone()]),
        }
    }

    fn field_of_this(&mut self, name: &str) -> Result<Option<FieldRef>> {
        if let Some(current) = self.current {
            if let Some(field) = current.fields()?.into_iter().find(|f| f.name == name) {
                return Ok(Some(FieldRef::new(self.this_class.clone(), name, field.ty)));
            }
        }
        let roots = self.this_roots()?;
        Ok(self.pool.find_field_in(roots, name)?.map(|f| FieldRef::new(self.this_class.clone(), name, f.ty)))
    }

    fn resolve_path(&mut self, expr: &TemplateExpr, parts: &[String]) -> Result<(Expr, TypeName)> {
        if !self.is_static {
            if let Some(field) = self.field_of_this(&parts[0])? {
                let ty = field.ty.clone();
                let mut value = (Expr::get_field(Expr::This, field), ty);
                for name in &parts[1..] {
                    value = self.instance_field(expr, value.0, &value.1, name)?;
                }
                return Ok(value);
            }
        }
        for split in (1..parts.len()).rev() {
            let Some(class) = self.resolve_class(&parts[..split])? else {
                continue;
            };
            let name = &parts[split];
            let field = self
                .pool
                .find_field(&class, name)?
                .ok_or_else(|| Error::missing(format!("{class}.{name}")))?;
            let ty = field.ty.clone();
            let mut value = (Expr::GetStatic(FieldRef::new(field.owner, name.as_str(), field.ty)), ty);
            for name in &parts[split + 1..] {
                value = self.instance_field(expr, value.0, &value.1, name)?;
            }
            return Ok(value);
        }
        Err(Error::missing(parts.join(".")))
    }

    fn instance_field(&mut self, expr: &TemplateExpr, target: Expr, ty: &TypeName, name: &str) -> Result<(Expr, TypeName)> {
        if !ty.is_reference() || ty.is_array() || ty.is_null() {
            return Err(Self::error(expr, format!("cannot read field `{name}` of {ty}")));
        }
        let field = if *ty == self.this_class {
            self.field_of_this(name)?
        } else {
            self.pool.find_field(ty, name)?.map(|f| FieldRef::new(ty.clone(), name, f.ty))
        };
        let field = field.ok_or_else(|| Error::missing(format!("{ty}.{name}")))?;
        let field_ty = field.ty.clone();
        Ok((Expr::get_field(target, field), field_ty))
    }

    fn resolve_args(&mut self, args: &[TemplateExpr]) -> Result<Vec<(Expr, TypeName)>> {
        let mut resolved = Vec::with_capacity(args.len());
        for arg in args {
            if *arg == TemplateExpr::AllParams {
                for (i, ty) in self.params.iter().enumerate() {
                    resolved.push((Expr::Param(i as u16 + 1), ty.clone()));
                }
            } else {
                resolved.push(self.resolve_value(arg)?);
            }
        }
        Ok(resolved)
    }

    fn resolve_call(
        &mut self,
        expr: &TemplateExpr,
        target: Option<&TemplateExpr>,
        name: &str,
        args: &[TemplateExpr],
    ) -> Result<(Expr, TypeName)> {
        let args = self.resolve_args(args)?;
        match target {
            None => {
                let mut candidates = Vec::new();
                if let Some(current) = self.current {
                    candidates.extend(current.methods()?.into_iter().filter(|m| m.name == name));
                }
                let roots = self.this_roots()?;
                for method in self.pool.collect_methods(roots, name)? {
                    if !candidates.iter().any(|c| c.descriptor() == method.descriptor()) {
                        candidates.push(method);
                    }
                }
                if self.is_static {
                    candidates.retain(MethodSig::is_static);
                }
                let this_class = self.this_class.clone();
                let (sig, args) = self.select(expr, &this_class, name, candidates, args)?;
                if sig.is_static() {
                    Ok(self.static_call(&this_class, sig, args))
                } else {
                    self.instance_call(Expr::This, &this_class, sig, args)
                }
            }
            Some(TemplateExpr::Path(parts)) if !self.path_starts_with_field(parts)? => {
                let class = self.resolve_class(parts)?;
                match class {
                    Some(class) => {
                        let candidates: Vec<MethodSig> =
                            self.pool.methods_named(&class, name)?.into_iter().filter(MethodSig::is_static).collect();
                        let (sig, args) = self.select(expr, &class, name, candidates, args)?;
                        Ok(self.static_call(&class, sig, args))
                    }
                    None => {
                        let (receiver, ty) = self.resolve_path(expr, parts)?;
                        self.call_on(expr, receiver, ty, name, args)
                    }
                }
            }
            Some(target) => {
                let (receiver, ty) = self.resolve_value(target)?;
                self.call_on(expr, receiver, ty, name, args)
            }
        }
    }

    fn path_starts_with_field(&mut self, parts: &[String]) -> Result<bool> {
        Ok(!self.is_static && self.field_of_this(&parts[0])?.is_some())
    }

    fn call_on(
        &mut self,
        expr: &TemplateExpr,
        receiver: Expr,
        ty: TypeName,
        name: &str,
        args: Vec<(Expr, TypeName)>,
    ) -> Result<(Expr, TypeName)> {
        if !ty.is_reference() || ty.is_array() || ty.is_null() {
            return Err(Self::error(expr, format!("cannot call `{name}` on a value of type {ty}")));
        }
        let candidates = if ty == self.this_class && self.current.is_some() {
            let mut candidates: Vec<MethodSig> = Vec::new();
            if let Some(current) = self.current {
                candidates.extend(current.methods()?.into_iter().filter(|m| m.name == name));
            }
            let roots = self.this_roots()?;
            candidates.extend(self.pool.collect_methods(roots, name)?);
            candidates
        } else {
            self.pool.methods_named(&ty, name)?
        };
        let (sig, args) = self.select(expr, &ty, name, candidates, args)?;
        if sig.is_static() {
            return Ok(self.static_call(&sig.owner.clone(), sig, args));
        }
        self.instance_call(receiver, &ty, sig, args)
    }

    fn static_call(&self, owner: &TypeName, sig: MethodSig, args: Vec<Expr>) -> (Expr, TypeName) {
        let ret = sig.ret.clone();
        let method = MethodRef::new(owner.clone(), sig.name, sig.params, sig.ret);
        (Expr::invoke_static(method, args), ret)
    }

    fn instance_call(&mut self, receiver: Expr, owner: &TypeName, sig: MethodSig, args: Vec<Expr>) -> Result<(Expr, TypeName)> {
        let is_interface = match (self.current, owner == &self.this_class) {
            (Some(current), true) => current.is_interface(),
            _ => self.pool.get(owner.as_str())?.is_interface(),
        };
        let ret = sig.ret.clone();
        let mut method = MethodRef::new(owner.clone(), sig.name, sig.params, sig.ret);
        if is_interface {
            method = method.on_interface();
        }
        Ok((Expr::invoke_virtual(receiver, method, args), ret))
    }

    /// Cost of passing a `from` value where `to` is expected
    fn conversion_cost(&mut self, from: &TypeName, to: &TypeName) -> Result<Option<u32>> {
        if from == to {
            return Ok(Some(0));
        }
        if from.is_reference() && to.is_reference() {
            return Ok(self.pool.is_subtype(from, to)?.then_some(1));
        }
        if from.is_primitive() && to.is_primitive() {
            let widens = to.as_str() == "int" && matches!(from.as_str(), "byte" | "short" | "char");
            return Ok(widens.then_some(1));
        }
        if from.is_primitive() {
            return match from.boxed() {
                Some(wrapper) => Ok(self.pool.is_subtype(&wrapper, to)?.then_some(2)),
                None => Ok(None),
            };
        }
        Ok((from.unboxed().as_ref() == Some(to)).then_some(2))
    }

    fn coerce(value: Expr, from: &TypeName, to: &TypeName) -> Expr {
        if from.is_primitive() && to.is_reference() {
            Expr::boxed(value, from.clone())
        } else if from.is_reference() && !from.is_null() && to.is_primitive() {
            Expr::Unboxed { value: Box::new(value), to: to.clone() }
        } else {
            value
        }
    }

    /// Fixed-arity fit: total cost
    fn fixed_cost(&mut self, params: &[TypeName], args: &[(Expr, TypeName)]) -> Result<Option<u32>> {
        if params.len() != args.len() {
            return Ok(None);
        }
        let mut total = 0;
        for (param, (_, arg)) in params.iter().zip(args) {
            match self.conversion_cost(arg, param)? {
                Some(cost) => total += cost,
                None => return Ok(None),
            }
        }
        Ok(Some(total))
    }

    fn varargs_cost(&mut self, params: &[TypeName], args: &[(Expr, TypeName)]) -> Result<Option<u32>> {
        let Some((array, fixed)) = params.split_last() else {
            return Ok(None);
        };
        if args.len() < fixed.len() {
            return Ok(None);
        }
        let Some(mut total) = self.fixed_cost(fixed, &args[..fixed.len()])? else {
            return Ok(None);
        };
        let element = array.element_type();
        for (_, arg) in &args[fixed.len()..] {
            match self.conversion_cost(arg, &element)? {
                Some(cost) => total += cost,
                None => return Ok(None),
            }
        }
        Ok(Some(total + VARARGS_PENALTY))
    }

    /// Pick the cheapest applicable overload and convert the arguments for it
    fn select(
        &mut self,
        expr: &TemplateExpr,
        owner: &TypeName,
        name: &str,
        candidates: Vec<MethodSig>,
        args: Vec<(Expr, TypeName)>,
    ) -> Result<(MethodSig, Vec<Expr>)> {
        let mut best: Option<(u32, bool, MethodSig)> = None;
        for candidate in candidates {
            let fixed = self.fixed_cost(&candidate.params, &args)?;
            let (cost, packed) = match fixed {
                Some(cost) => (cost, false),
                None if candidate.is_varargs() => match self.varargs_cost(&candidate.params, &args)? {
                    Some(cost) => (cost, true),
                    None => continue,
                },
                None => continue,
            };
            if best.as_ref().map_or(true, |(c, _, _)| cost < *c) {
                best = Some((cost, packed, candidate));
            }
        }
        let Some((_, packed, sig)) = best else {
            let types: Vec<String> = args.iter().map(|(_, t)| t.to_string()).collect();
            return Err(Self::error(expr, format!("no applicable method {owner}.{name}({})", types.join(", "))));
        };

        let mut converted = Vec::with_capacity(sig.params.len());
        if packed {
            let fixed = sig.params.len() - 1;
            let mut args = args.into_iter();
            for param in &sig.params[..fixed] {
                if let Some((value, ty)) = args.next() {
                    converted.push(Self::coerce(value, &ty, param));
                }
            }
            let element = sig.params[fixed].element_type();
            let items = args.map(|(value, ty)| Self::coerce(value, &ty, &element)).collect();
            converted.push(Expr::NewArray { element, items });
        } else {
            for (param, (value, ty)) in sig.params.iter().zip(args) {
                converted.push(Self::coerce(value, &ty, param));
            }
        }
        Ok((sig, converted))
    }
}
