//! Constructors assigning member fields and forwarding to a super constructor

use tracing::debug;

use crate::ast::{FactoryDirective, ParamDecl, TypeName};
use crate::codegen::defs::CONSTRUCTOR_METHOD_NAME;
use crate::codegen::flag::access_flags::ACC_PUBLIC;
use crate::codegen::tree::{Expr, Stmt};
use crate::error::Result;
use crate::stack::Session;

use super::factory::FactoryGenerator;
use super::member::MemberDescriptor;
use super::Generator;

#[derive(Debug, Clone)]
pub struct ConstructorGenerator {
    members: Vec<MemberDescriptor>,
    /// Parameters of the chosen super constructor, in order
    super_params: Vec<ParamDecl>,
    factory: Option<(FactoryDirective, TypeName)>,
}

impl ConstructorGenerator {
    pub fn new(members: Vec<MemberDescriptor>, super_params: Vec<ParamDecl>) -> Self {
        Self { members, super_params, factory: None }
    }

    /// Also bind a static factory returning `source_type` once the constructor exists
    pub fn with_factory(mut self, directive: FactoryDirective, source_type: TypeName) -> Self {
        self.factory = Some((directive, source_type));
        self
    }

    /// Constructor parameter types and the positions forwarded to `super(...)`.
    ///
    /// A super parameter matching a member by type and storage name reuses that
    /// member's position; any other is appended after the members.
    pub fn signature(&self) -> (Vec<TypeName>, Vec<u16>) {
        let mut params: Vec<TypeName> = self.members.iter().map(|m| m.declared_type().clone()).collect();
        let mut forwarded = Vec::with_capacity(self.super_params.len());
        for param in &self.super_params {
            let shared = self
                .members
                .iter()
                .position(|m| m.declared_type() == &param.ty && m.storage_name() == param.name);
            match shared {
                Some(index) => forwarded.push(index as u16 + 1),
                None => {
                    params.push(param.ty.clone());
                    forwarded.push(params.len() as u16);
                }
            }
        }
        (params, forwarded)
    }
}

impl Generator for ConstructorGenerator {
    fn apply_to(&self, session: &mut Session) -> Result<()> {
        let (params, forwarded) = self.signature();
        let class = session.current_class()?;
        if class.has_constructor(&params) {
            debug!(class = %class.name(), params = params.len(), "constructor already declared");
            return Ok(());
        }
        let owner = class.name().clone();
        let superclass = class.superclass()?.unwrap_or_else(TypeName::object);

        let mut body = Vec::with_capacity(self.members.len() + 2);
        body.push(Stmt::SuperInit {
            owner: superclass,
            params: self.super_params.iter().map(|p| p.ty.clone()).collect(),
            args: forwarded.into_iter().map(Expr::Param).collect(),
        });
        for (i, member) in self.members.iter().enumerate() {
            body.push(Stmt::SetField {
                target: Expr::This,
                field: member.field_ref(&owner),
                value: Expr::Param(i as u16 + 1),
            });
        }
        body.push(Stmt::Return(None));
        session
            .current_class_mut()?
            .add_method(ACC_PUBLIC, CONSTRUCTOR_METHOD_NAME, &params, &TypeName::void(), &body)?;

        if let Some((directive, source_type)) = &self.factory {
            FactoryGenerator::new(directive.clone(), source_type.clone(), params).apply_to(session)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        let names: Vec<&str> = self.members.iter().map(MemberDescriptor::storage_name).collect();
        format!("constructor ({}) + {} super", names.join(", "), self.super_params.len())
    }
}
