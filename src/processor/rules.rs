//! Naming conventions mapping abstract methods to backing fields

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Accessor,
    Mutator,
}

struct Rule {
    kind: MemberKind,
    /// Group 1 is the field name before decapitalization
    pattern: Regex,
}

fn rule(kind: MemberKind, pattern: &str) -> Rule {
    Rule { kind, pattern: Regex::new(pattern).expect("naming rule pattern must compile") }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule(MemberKind::Mutator, r"^set([A-Z].*)$"),
        rule(MemberKind::Accessor, r"^get([A-Z].*)$"),
        rule(MemberKind::Accessor, r"^is([A-Z].*)$"),
        // `has` stays part of the field name
        rule(MemberKind::Accessor, r"^(has[A-Z].*)$"),
        rule(MemberKind::Accessor, r"^keeps([A-Z].*)$"),
    ]
});

/// Lower-case the first character
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Field naming for accessors and mutators; with fluent naming a method
/// matching no prefix names its field itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingRules {
    fluent: bool,
}

impl NamingRules {
    pub fn new(fluent: bool) -> Self {
        Self { fluent }
    }

    pub fn is_fluent(&self) -> bool {
        self.fluent
    }

    /// Storage name for a method of the given kind, if the name qualifies
    pub fn field_name(&self, kind: MemberKind, method: &str) -> Option<String> {
        let matched = RULES
            .iter()
            .filter(|r| r.kind == kind)
            .find_map(|r| r.pattern.captures(method).and_then(|c| c.get(1)))
            .map(|m| decapitalize(m.as_str()));
        match matched {
            Some(name) => Some(name),
            None if self.fluent => Some(method.to_string()),
            None => None,
        }
    }

    pub fn accessor_field(&self, method: &str) -> Option<String> {
        self.field_name(MemberKind::Accessor, method)
    }

    pub fn mutator_field(&self, method: &str) -> Option<String> {
        self.field_name(MemberKind::Mutator, method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessor_prefixes() {
        let rules = NamingRules::new(false);
        assert_eq!(rules.accessor_field("getName").as_deref(), Some("name"));
        assert_eq!(rules.accessor_field("isActive").as_deref(), Some("active"));
        assert_eq!(rules.accessor_field("hasChildren").as_deref(), Some("hasChildren"));
        assert_eq!(rules.accessor_field("keepsHistory").as_deref(), Some("history"));
        assert_eq!(rules.accessor_field("getURL").as_deref(), Some("uRL"));
        assert_eq!(rules.accessor_field("gettysburg"), None);
        assert_eq!(rules.accessor_field("name"), None);
    }

    #[test]
    fn test_fluent_fallback() {
        let rules = NamingRules::new(true);
        assert_eq!(rules.accessor_field("name").as_deref(), Some("name"));
        assert_eq!(rules.mutator_field("setAge").as_deref(), Some("age"));
        assert_eq!(rules.mutator_field("age").as_deref(), Some("age"));
        assert_eq!(NamingRules::new(false).mutator_field("getAge"), None);
    }
}
