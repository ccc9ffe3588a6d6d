//! The analyzable type model, loaded from its serialized form

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::nodes::TypeDecl;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ModelFile {
    #[serde(default)]
    types: Vec<TypeDecl>,
}

/// Declared types indexed by qualified name, in declaration order
#[derive(Debug, Clone, Default)]
pub struct TypeModel {
    types: Vec<Arc<TypeDecl>>,
    index: HashMap<String, usize>,
}

impl TypeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(json)?;
        let mut model = Self::new();
        for decl in file.types {
            model.insert(decl);
        }
        Ok(model)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Add a declaration; a later declaration with the same name replaces the earlier one
    pub fn insert(&mut self, decl: TypeDecl) {
        let name = decl.qualified_name.clone();
        match self.index.get(&name) {
            Some(&i) => self.types[i] = Arc::new(decl),
            None => {
                self.index.insert(name, self.types.len());
                self.types.push(Arc::new(decl));
            }
        }
    }

    /// Merge every declaration of `other` into this model
    pub fn extend(&mut self, other: TypeModel) {
        for decl in other.types {
            self.insert(Arc::unwrap_or_clone(decl));
        }
    }

    pub fn get(&self, qualified_name: &str) -> Option<&Arc<TypeDecl>> {
        self.index.get(qualified_name).map(|&i| &self.types[i])
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.index.contains_key(qualified_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeDecl>> {
        self.types.iter()
    }

    /// Types that are part of the compiled input rather than library declarations
    pub fn source_types(&self) -> impl Iterator<Item = &Arc<TypeDecl>> {
        self.types.iter().filter(|t| !t.library)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        let file = ModelFile { types: self.types.iter().map(|t| (**t).clone()).collect() };
        Ok(serde_json::to_string_pretty(&file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{TypeKind, TypeName};

    const MODEL: &str = r#"{
        "types": [
            {
                "qualified_name": "demo.Person",
                "methods": [
                    { "name": "getName", "return_type": "java.lang.String", "is_abstract": true },
                    { "name": "setAge", "params": [ { "name": "age", "type": "int" } ], "is_abstract": true }
                ],
                "directives": { "generate": {}, "to_string": {} }
            },
            { "qualified_name": "demo.Base", "kind": "class", "library": true }
        ]
    }"#;

    #[test]
    fn test_load_model() {
        let model = TypeModel::from_json_str(MODEL).unwrap();
        assert_eq!(model.len(), 2);
        let person = model.get("demo.Person").unwrap();
        assert_eq!(person.kind, TypeKind::Interface);
        assert_eq!(person.methods[1].return_type, TypeName::void());
        assert_eq!(person.methods[1].descriptor(), "(I)V");
        assert_eq!(model.source_types().count(), 1);
    }

    #[test]
    fn test_insert_replaces_by_name() {
        let mut model = TypeModel::from_json_str(MODEL).unwrap();
        let mut replacement = (**model.get("demo.Base").unwrap()).clone();
        replacement.is_abstract = true;
        model.insert(replacement);
        assert_eq!(model.len(), 2);
        assert!(model.get("demo.Base").unwrap().is_abstract);
    }

    #[test]
    fn test_json_round_trip_keeps_directives() {
        let model = TypeModel::from_json_str(MODEL).unwrap();
        let reloaded = TypeModel::from_json_str(&model.to_json().unwrap()).unwrap();
        assert_eq!(reloaded.get("demo.Person"), model.get("demo.Person"));
    }

    #[test]
    fn test_malformed_model() {
        assert!(TypeModel::from_json_str("{\"types\": [{}]}").is_err());
    }
}
