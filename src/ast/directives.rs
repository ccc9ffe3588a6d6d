//! Generation directives attached to types, methods and parameters

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_CLASS_SUFFIX, DEFAULT_NON_NULL_EXCEPTION, DEFAULT_NON_NULL_MESSAGE};

/// Marks a type as a generation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Generate {
    /// Package of the generated class; empty means the source type's package
    pub target_package: String,
    /// Appended to the source type's simple name; empty means `Impl`
    pub class_suffix: String,
}

impl Default for Generate {
    fn default() -> Self {
        Self { target_package: String::new(), class_suffix: DEFAULT_CLASS_SUFFIX.to_string() }
    }
}

impl Generate {
    pub fn package_or<'a>(&'a self, source_package: &'a str) -> &'a str {
        if self.target_package.is_empty() {
            source_package
        } else {
            &self.target_package
        }
    }

    pub fn suffix(&self) -> &str {
        if self.class_suffix.is_empty() {
            DEFAULT_CLASS_SUFFIX
        } else {
            &self.class_suffix
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructorKind {
    NoArgs,
    RequiredArgs,
    AllArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructorDirective {
    pub kinds: Vec<ConstructorKind>,
}

impl Default for ConstructorDirective {
    fn default() -> Self {
        Self { kinds: vec![ConstructorKind::RequiredArgs] }
    }
}

impl ConstructorDirective {
    /// Requested kinds without repeats, in declaration order
    pub fn distinct_kinds(&self) -> Vec<ConstructorKind> {
        let mut kinds = Vec::with_capacity(self.kinds.len());
        for kind in &self.kinds {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        kinds
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualsDirective {
    pub call_super: bool,
    /// Compare with `Objects.equals` instead of `a.equals(b)`
    pub prevent_nullability_issues: bool,
}

impl Default for EqualsDirective {
    fn default() -> Self {
        Self { call_super: false, prevent_nullability_issues: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashCodeDirective {
    pub call_super: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToStringDirective {
    pub call_super: bool,
    pub use_to_string_helper: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryDirective {
    /// Fully qualified name of the class holding the factory method
    pub location: String,
    pub method: String,
    #[serde(default = "default_true")]
    pub override_return: bool,
}

fn default_true() -> bool {
    true
}

/// Type-level directive set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDirectives {
    pub generate: Option<Generate>,
    pub constructor: Option<ConstructorDirective>,
    pub equals: Option<EqualsDirective>,
    pub hash_code: Option<HashCodeDirective>,
    pub to_string: Option<ToStringDirective>,
    pub factory: Option<FactoryDirective>,
}

/// Return value wrapping: `template` holds exactly one `%s` standing for the stored field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapDirective {
    pub template: String,
    pub stored_type: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnMode {
    #[default]
    None,
    SelfRef,
    MethodCall,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokeDirective {
    pub invocations: Vec<String>,
    pub returns: ReturnMode,
}

/// Method-level directive set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodDirectives {
    pub exclude: bool,
    pub field_name: Option<String>,
    pub wrap: Option<WrapDirective>,
    pub invoke: Option<InvokeDirective>,
    pub optional_field: bool,
    pub equals_exclude: bool,
    pub hash_code_exclude: bool,
    pub to_string_exclude: bool,
}

impl MethodDirectives {
    /// Explicit storage name, ignoring empty overrides
    pub fn field_name(&self) -> Option<&str> {
        self.field_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Wrap directive with both parts present
    pub fn wrap(&self) -> Option<&WrapDirective> {
        self.wrap.as_ref().filter(|w| !w.template.is_empty() && !w.stored_type.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonNullHandler {
    #[default]
    Custom,
    GuavaPreconditions,
    ApacheValidate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonNullDirective {
    pub handler: NonNullHandler,
    /// `{0}` stands for the parameter index
    pub message: String,
    pub exception: String,
}

impl Default for NonNullDirective {
    fn default() -> Self {
        Self {
            handler: NonNullHandler::Custom,
            message: DEFAULT_NON_NULL_MESSAGE.to_string(),
            exception: DEFAULT_NON_NULL_EXCEPTION.to_string(),
        }
    }
}

impl NonNullDirective {
    pub fn message(&self) -> &str {
        if self.message.is_empty() {
            DEFAULT_NON_NULL_MESSAGE
        } else {
            &self.message
        }
    }

    pub fn exception(&self) -> &str {
        if self.exception.is_empty() {
            DEFAULT_NON_NULL_EXCEPTION
        } else {
            &self.exception
        }
    }
}
