//! Java type references as they appear in the type model

use std::fmt;

use serde::{Deserialize, Serialize};

pub const PRIMITIVES: [&str; 8] = ["boolean", "byte", "char", "short", "int", "long", "float", "double"];

/// A Java type in source notation with binary nested names:
/// `int`, `java.lang.String`, `java.util.Map$Entry`, `byte[][]`.
///
/// Generic arguments are erased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeName(String);

impl From<String> for TypeName {
    fn from(value: String) -> Self {
        TypeName::new(value)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        TypeName::new(value)
    }
}

impl From<TypeName> for String {
    fn from(value: TypeName) -> Self {
        value.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn erase_generics(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if depth == 0 && !c.is_whitespace() => out.push(c),
            _ => {}
        }
    }
    out
}

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.contains('<') || name.contains(char::is_whitespace) {
            TypeName(erase_generics(&name))
        } else {
            TypeName(name)
        }
    }

    pub fn void() -> Self {
        TypeName("void".into())
    }

    pub fn int() -> Self {
        TypeName("int".into())
    }

    pub fn boolean() -> Self {
        TypeName("boolean".into())
    }

    pub fn object() -> Self {
        TypeName("java.lang.Object".into())
    }

    pub fn string() -> Self {
        TypeName("java.lang.String".into())
    }

    /// Type of the `null` literal
    pub fn null() -> Self {
        TypeName("null".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_void(&self) -> bool {
        self.0 == "void"
    }

    pub fn is_null(&self) -> bool {
        self.0 == "null"
    }

    pub fn is_primitive(&self) -> bool {
        PRIMITIVES.contains(&self.0.as_str())
    }

    pub fn is_array(&self) -> bool {
        self.0.ends_with("[]")
    }

    pub fn is_reference(&self) -> bool {
        !self.is_primitive() && !self.is_void()
    }

    /// Values held in int-sized verifier slots
    pub fn is_int_like(&self) -> bool {
        matches!(self.0.as_str(), "boolean" | "byte" | "char" | "short" | "int")
    }

    pub fn is_wide(&self) -> bool {
        matches!(self.0.as_str(), "long" | "double")
    }

    /// Number of local/stack slots a value of this type occupies
    pub fn slot_size(&self) -> u16 {
        if self.is_void() {
            0
        } else if self.is_wide() {
            2
        } else {
            1
        }
    }

    pub fn array_of(&self) -> TypeName {
        TypeName(format!("{}[]", self.0))
    }

    /// Component type of an array, or the type itself
    pub fn element_type(&self) -> TypeName {
        match self.0.strip_suffix("[]") {
            Some(inner) => TypeName(inner.to_owned()),
            None => self.clone(),
        }
    }

    /// Wrapper class for a primitive
    pub fn boxed(&self) -> Option<TypeName> {
        let wrapper = match self.0.as_str() {
            "boolean" => "java.lang.Boolean",
            "byte" => "java.lang.Byte",
            "char" => "java.lang.Character",
            "short" => "java.lang.Short",
            "int" => "java.lang.Integer",
            "long" => "java.lang.Long",
            "float" => "java.lang.Float",
            "double" => "java.lang.Double",
            _ => return None,
        };
        Some(TypeName(wrapper.to_owned()))
    }

    /// Primitive for a wrapper class
    pub fn unboxed(&self) -> Option<TypeName> {
        let primitive = match self.0.as_str() {
            "java.lang.Boolean" => "boolean",
            "java.lang.Byte" => "byte",
            "java.lang.Character" => "char",
            "java.lang.Short" => "short",
            "java.lang.Integer" => "int",
            "java.lang.Long" => "long",
            "java.lang.Float" => "float",
            "java.lang.Double" => "double",
            _ => return None,
        };
        Some(TypeName(primitive.to_owned()))
    }

    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Package portion, empty for the default package
    pub fn package(&self) -> &str {
        match self.0.rfind('.') {
            Some(i) => &self.0[..i],
            None => "",
        }
    }

    /// Name for CONSTANT_Class entries: `java/lang/String`, or a descriptor for arrays
    pub fn internal_name(&self) -> String {
        if self.is_array() {
            crate::codegen::descriptor::type_to_descriptor(self)
        } else {
            self.0.replace('.', "/")
        }
    }

    pub fn descriptor(&self) -> String {
        crate::codegen::descriptor::type_to_descriptor(self)
    }

    /// Inverse of [`TypeName::internal_name`] for class names
    pub fn from_internal(internal: &str) -> TypeName {
        TypeName(internal.replace('/', "."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generics_are_erased() {
        assert_eq!(TypeName::new("java.util.List<java.lang.String>").as_str(), "java.util.List");
        assert_eq!(TypeName::new("java.util.Map<K, List<V>>[]").as_str(), "java.util.Map[]");
    }

    #[test]
    fn test_slots_and_boxing() {
        assert_eq!(TypeName::new("long").slot_size(), 2);
        assert_eq!(TypeName::void().slot_size(), 0);
        assert_eq!(TypeName::int().boxed(), Some(TypeName::new("java.lang.Integer")));
        assert_eq!(TypeName::new("java.lang.Character").unboxed(), Some(TypeName::new("char")));
        assert!(TypeName::string().boxed().is_none());
    }

    #[test]
    fn test_names() {
        let ty = TypeName::new("com.acme.model.Person");
        assert_eq!(ty.simple_name(), "Person");
        assert_eq!(ty.package(), "com.acme.model");
        assert_eq!(ty.internal_name(), "com/acme/model/Person");
        assert_eq!(TypeName::new("java.lang.String[]").internal_name(), "[Ljava/lang/String;");
        assert_eq!(TypeName::new("Loose").package(), "");
    }
}
