use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codegen::class::ClassFile;
use crate::codegen::defs::{CONSTRUCTOR_METHOD_NAME, STATIC_INITIALIZER_METHOD_NAME};
use crate::codegen::descriptor::{method_descriptor, parse_method_descriptor};
use crate::codegen::error::ClassFormatResult;
use crate::codegen::flag::access_flags::{ACC_ABSTRACT, ACC_INTERFACE, ACC_PRIVATE, ACC_STATIC, ACC_SYNTHETIC};

use super::directives::{MethodDirectives, NonNullDirective, TypeDirectives};
use super::types::TypeName;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Interface,
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeName,
    #[serde(default)]
    pub non_null: Option<NonNullDirective>,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeName>) -> Self {
        Self { name: name.into(), ty: ty.into(), non_null: None }
    }
}

impl fmt::Display for ParamDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[ParamDecl]) -> fmt::Result {
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{param}")?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default = "TypeName::void")]
    pub return_type: TypeName,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub directives: MethodDirectives,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, return_type: impl Into<TypeName>, params: Vec<ParamDecl>) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            params,
            is_abstract: true,
            is_static: false,
            directives: MethodDirectives::default(),
        }
    }

    pub fn param_types(&self) -> Vec<TypeName> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn descriptor(&self) -> String {
        method_descriptor(&self.param_types(), &self.return_type)
    }

    /// Name plus descriptor, the identity used when walking a hierarchy
    pub fn key(&self) -> String {
        format!("{}{}", self.name, self.descriptor())
    }

    /// 1-based positions of parameters carrying a non-null directive
    pub fn non_null_params(&self) -> Vec<(u16, &NonNullDirective)> {
        self.params
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.non_null.as_ref().map(|d| (i as u16 + 1, d)))
            .collect()
    }
}

impl fmt::Display for MethodDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            f.write_str("static ")?;
        }
        if self.is_abstract {
            f.write_str("abstract ")?;
        }
        write!(f, "{} {}(", self.return_type, self.name)?;
        write_params(f, &self.params)?;
        f.write_str(")")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    #[serde(default)]
    pub params: Vec<ParamDecl>,
}

impl ConstructorDecl {
    pub fn new(params: Vec<ParamDecl>) -> Self {
        Self { params }
    }

    pub fn param_types(&self) -> Vec<TypeName> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn descriptor(&self) -> String {
        method_descriptor(&self.param_types(), &TypeName::void())
    }
}

/// A declared type as seen by the processors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub qualified_name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub superclass: Option<TypeName>,
    #[serde(default)]
    pub interfaces: Vec<TypeName>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDecl>,
    #[serde(default)]
    pub directives: TypeDirectives,
    /// Declared only for resolution, never compiled from the model
    #[serde(default)]
    pub library: bool,
    #[serde(default)]
    pub source_file: Option<String>,
}

impl TypeDecl {
    pub fn new(qualified_name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            kind,
            is_abstract: kind == TypeKind::Interface,
            superclass: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            directives: TypeDirectives::default(),
            library: false,
            source_file: None,
        }
    }

    pub fn name(&self) -> TypeName {
        TypeName::new(self.qualified_name.as_str())
    }

    pub fn simple_name(&self) -> &str {
        self.qualified_name.rsplit(['.', '$']).next().unwrap_or(&self.qualified_name)
    }

    pub fn package(&self) -> &str {
        self.qualified_name.rfind('.').map(|i| &self.qualified_name[..i]).unwrap_or("")
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn abstract_methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.methods.iter().filter(|m| m.is_abstract)
    }

    /// Constructors visible to a subclass; a class declaring none has the implicit no-arg one
    pub fn effective_constructors(&self) -> Vec<ConstructorDecl> {
        if self.is_interface() {
            return Vec::new();
        }
        if self.constructors.is_empty() {
            return vec![ConstructorDecl::default()];
        }
        self.constructors.clone()
    }

    /// Declaration view of a compiled class; parameter names are synthesized as `argN`
    pub fn from_class_file(class: &ClassFile) -> ClassFormatResult<TypeDecl> {
        let cp = &class.constant_pool;
        let kind = if class.access_flags & ACC_INTERFACE != 0 { TypeKind::Interface } else { TypeKind::Class };
        let mut decl = TypeDecl::new(class.this_name()?.replace('/', "."), kind);
        decl.is_abstract = class.access_flags & ACC_ABSTRACT != 0;
        decl.library = true;
        decl.superclass = class
            .super_name()?
            .filter(|_| kind == TypeKind::Class)
            .map(TypeName::from_internal);
        decl.interfaces = class.interface_names()?.into_iter().map(TypeName::from_internal).collect();

        for method in &class.methods {
            if method.access_flags & (ACC_SYNTHETIC | ACC_PRIVATE) != 0 {
                continue;
            }
            let name = cp.utf8(method.name_index)?;
            if name == STATIC_INITIALIZER_METHOD_NAME {
                continue;
            }
            let (params, ret) = parse_method_descriptor(cp.utf8(method.descriptor_index)?)?;
            let params: Vec<ParamDecl> =
                params.into_iter().enumerate().map(|(i, ty)| ParamDecl::new(format!("arg{i}"), ty)).collect();
            if name == CONSTRUCTOR_METHOD_NAME {
                decl.constructors.push(ConstructorDecl::new(params));
                continue;
            }
            let mut m = MethodDecl::new(name, ret, params);
            m.is_abstract = method.access_flags & ACC_ABSTRACT != 0;
            m.is_static = method.access_flags & ACC_STATIC != 0;
            decl.methods.push(m);
        }
        Ok(decl)
    }
}

impl fmt::Display for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TypeKind::Interface => write!(f, "interface {}", self.qualified_name)?,
            TypeKind::Class if self.is_abstract => write!(f, "abstract class {}", self.qualified_name)?,
            TypeKind::Class => write!(f, "class {}", self.qualified_name)?,
        }
        if let Some(superclass) = &self.superclass {
            write!(f, " extends {superclass}")?;
        }
        if !self.interfaces.is_empty() {
            f.write_str(if self.is_interface() { " extends " } else { " implements " })?;
            let names: Vec<&str> = self.interfaces.iter().map(TypeName::as_str).collect();
            f.write_str(&names.join(", "))?;
        }
        Ok(())
    }
}
