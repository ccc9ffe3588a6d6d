//! Default processor for types carrying a generate directive
//!
//! Analysis walks the type and its supertypes breadth first and queues one
//! action per abstract method it can implement, plus constructors and the
//! object methods the type asks for. Realization resolves the target class
//! (`<package>.<SimpleName><Suffix>`), attaches the source type as its
//! superclass or interface and drains the queue.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::ast::{ConstructorDecl, ConstructorKind, MethodDecl, TypeDecl, TypeName};
use crate::error::{Error, Result};
use crate::generation::{
    AccessorGenerator, ConstructorGenerator, EqualsGenerator, FieldGenerator, HashCodeGenerator, InvokeGenerator,
    MemberDescriptor, MutatorGenerator, NonNullGenerator, ToStringGenerator,
};
use crate::pool::ClassHandle;
use crate::stack::{ActionQueue, Session};

use super::rules::NamingRules;
use super::{realize, PendingGenerations, TypeProcessor};

pub const NAME: &str = "generation";

pub struct GenerationProcessor {
    rules: NamingRules,
    pending: PendingGenerations,
}

/// Name of the class generated for `decl`
pub fn target_name(decl: &TypeDecl) -> TypeName {
    let generate = decl.directives.generate.clone().unwrap_or_default();
    let package = generate.package_or(decl.package());
    let simple = format!("{}{}", decl.simple_name(), generate.suffix());
    if package.is_empty() {
        TypeName::new(simple)
    } else {
        TypeName::new(format!("{package}.{simple}"))
    }
}

/// Overloads with the fewest (or most) parameters, without repeats
fn constructors_of_arity(candidates: &[ConstructorDecl], fewest: bool) -> Vec<ConstructorDecl> {
    let arities = candidates.iter().map(|c| c.params.len());
    let Some(arity) = (if fewest { arities.min() } else { arities.max() }) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|c| c.params.len() == arity && seen.insert(c.descriptor()))
        .cloned()
        .collect()
}

/// Per-type state of one analysis pass
struct Analysis {
    queue: ActionQueue,
    fields: HashSet<String>,
    members: Vec<MemberDescriptor>,
}

impl Analysis {
    fn field(&mut self, name: &str, ty: &TypeName) {
        if self.fields.insert(name.to_string()) {
            self.queue.push_front(Arc::new(FieldGenerator::new(name, ty.clone())));
        }
    }

    fn guard(&mut self, method: &MethodDecl) {
        let guard = NonNullGenerator::new(method);
        if !guard.is_empty() {
            self.queue.push_back(Arc::new(guard));
        }
    }
}

impl GenerationProcessor {
    pub fn new(fluent_naming: bool) -> Self {
        Self { rules: NamingRules::new(fluent_naming), pending: PendingGenerations::new() }
    }

    pub fn pending(&self) -> &PendingGenerations {
        &self.pending
    }

    fn classify(&self, method: &MethodDecl, analysis: &mut Analysis) {
        let directives = &method.directives;
        let explicit = directives.field_name().map(str::to_string);

        if directives.invoke.is_none() && method.params.len() == 1 {
            if let Some(field) = explicit.clone().or_else(|| self.rules.mutator_field(&method.name)) {
                analysis.field(&field, &method.params[0].ty);
                analysis.queue.push_back(Arc::new(MutatorGenerator::new(field, method.clone())));
                analysis.guard(method);
                return;
            }
        }

        if directives.invoke.is_none() && method.params.is_empty() && !method.return_type.is_void() {
            if let Some(field) = explicit.or_else(|| self.rules.accessor_field(&method.name)) {
                let member = match directives.wrap() {
                    Some(wrap) => MemberDescriptor::wrapped(field, method.clone(), wrap),
                    None => MemberDescriptor::new(field, method.clone()),
                };
                analysis.field(member.storage_name(), member.declared_type());
                analysis.queue.push_back(Arc::new(AccessorGenerator::new(member.clone())));
                analysis.members.push(member);
                analysis.guard(method);
                return;
            }
        }

        match &directives.invoke {
            Some(invoke) => {
                analysis.queue.push_front(Arc::new(InvokeGenerator::new(method.clone(), invoke.clone())));
                analysis.guard(method);
            }
            None => warn!(method = %method, "abstract method matches no accessor, mutator or invocation rule"),
        }
    }

    /// Breadth-first walk over the type and its supertypes
    fn analyze(&self, decl: &Arc<TypeDecl>, session: &mut Session) -> Result<Analysis> {
        let mut analysis = Analysis { queue: ActionQueue::new(), fields: HashSet::new(), members: Vec::new() };
        let mut seen_methods = HashSet::new();
        let mut seen_types = HashSet::new();
        let mut worklist = VecDeque::from([Arc::clone(decl)]);

        while let Some(current) = worklist.pop_front() {
            if !seen_types.insert(current.qualified_name.clone()) {
                continue;
            }
            // implemented methods shadow abstract declarations further up
            for method in current.methods.iter().filter(|m| !m.is_abstract && !m.is_static) {
                seen_methods.insert(method.key());
            }
            for method in current.abstract_methods().filter(|m| !m.is_static) {
                let first = seen_methods.insert(method.key());
                if method.directives.exclude {
                    debug!(method = %method.name, "excluded from generation");
                    continue;
                }
                if first {
                    self.classify(method, &mut analysis);
                }
            }
            for supertype in current.superclass.iter().chain(&current.interfaces) {
                match session.declaration_of(supertype)? {
                    Some(parent) => worklist.push_back(parent),
                    None if session.pool().validate() => return Err(Error::missing(supertype.as_str())),
                    None => warn!(supertype = %supertype, source = %decl.qualified_name, "skipping unresolvable supertype"),
                }
            }
        }
        Ok(analysis)
    }

    fn queue_constructors(&self, decl: &TypeDecl, analysis: &mut Analysis) {
        let Some(directive) = &decl.directives.constructor else {
            return;
        };
        let candidates = decl.effective_constructors();
        for kind in directive.distinct_kinds() {
            let members: Vec<MemberDescriptor> = match kind {
                ConstructorKind::NoArgs => Vec::new(),
                ConstructorKind::RequiredArgs => {
                    analysis.members.iter().filter(|m| !m.is_optional() && !m.is_void()).cloned().collect()
                }
                ConstructorKind::AllArgs => analysis.members.iter().filter(|m| !m.is_void()).cloned().collect(),
            };
            let overloads = constructors_of_arity(&candidates, kind == ConstructorKind::NoArgs);
            let supers = if overloads.is_empty() { vec![Vec::new()] } else { overloads.into_iter().map(|c| c.params).collect() };
            for super_params in supers {
                let mut generator = ConstructorGenerator::new(members.clone(), super_params);
                if let Some(factory) = &decl.directives.factory {
                    generator = generator.with_factory(factory.clone(), decl.name());
                }
                analysis.queue.push_back(Arc::new(generator));
            }
        }
    }

    fn queue_object_methods(&self, decl: &TypeDecl, analysis: &mut Analysis) {
        let directives = &decl.directives;
        if let Some(to_string) = &directives.to_string {
            analysis.queue.push_back(Arc::new(ToStringGenerator::new(analysis.members.clone(), to_string.clone())));
        }
        if let Some(equals) = &directives.equals {
            analysis.queue.push_back(Arc::new(EqualsGenerator::new(analysis.members.clone(), equals.clone())));
        }
        if let Some(hash_code) = &directives.hash_code {
            analysis.queue.push_back(Arc::new(HashCodeGenerator::new(analysis.members.clone(), hash_code.clone())));
        }
    }
}

impl TypeProcessor for GenerationProcessor {
    fn name(&self) -> &str {
        NAME
    }

    fn should_process(&self, decl: &TypeDecl) -> bool {
        decl.directives.generate.is_some() && !decl.library
    }

    fn process(&mut self, decl: &Arc<TypeDecl>, session: &mut Session) -> Result<bool> {
        let mut analysis = self.analyze(decl, session)?;
        self.queue_constructors(decl, &mut analysis);
        self.queue_object_methods(decl, &mut analysis);
        debug!(source = %decl.qualified_name, actions = analysis.queue.len(), members = analysis.members.len(), "analyzed");

        let queue = self.pending.queue_mut(decl);
        for action in analysis.queue {
            queue.push_back(action);
        }
        Ok(true)
    }

    fn post_process(&mut self, session: &mut Session) -> Result<()> {
        for (decl, queue) in self.pending.take() {
            if queue.is_empty() {
                debug!(source = %decl.qualified_name, "nothing to generate");
                continue;
            }
            let target = target_name(&decl);
            let major_version = session.pool().major_version();
            let mut class = match session.pool().find(target.as_str())? {
                Some(existing) => {
                    existing.ensure_compiled()?;
                    existing.clone()
                }
                None => ClassHandle::new(target, major_version),
            };
            if decl.is_interface() {
                class.add_interface(&decl.name());
            } else {
                class.set_superclass(&decl.name());
            }
            realize(session, decl, class, &queue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ConstructorDirective, Generate, ParamDecl, TypeKind};

    #[test]
    fn test_target_name() {
        let mut decl = TypeDecl::new("demo.Person", TypeKind::Interface);
        decl.directives.generate = Some(Generate::default());
        assert_eq!(target_name(&decl), TypeName::new("demo.PersonImpl"));
        decl.directives.generate = Some(Generate { target_package: "gen".into(), class_suffix: "Data".into() });
        assert_eq!(target_name(&decl), TypeName::new("gen.PersonData"));
    }

    #[test]
    fn test_constructor_arity_selection() {
        let candidates = vec![
            ConstructorDecl::new(vec![ParamDecl::new("id", "long")]),
            ConstructorDecl::new(vec![]),
            ConstructorDecl::new(vec![ParamDecl::new("id", "long")]),
            ConstructorDecl::new(vec![ParamDecl::new("name", "java.lang.String")]),
        ];
        assert_eq!(constructors_of_arity(&candidates, true), vec![ConstructorDecl::new(vec![])]);
        assert_eq!(constructors_of_arity(&candidates, false).len(), 2);
        assert!(constructors_of_arity(&[], false).is_empty());
    }

    #[test]
    fn test_constructor_kinds_filter_members() {
        let processor = GenerationProcessor::new(true);
        let mut optional = MethodDecl::new("getNickname", "java.lang.String", vec![]);
        optional.directives.optional_field = true;
        let mut analysis = Analysis {
            queue: ActionQueue::new(),
            fields: HashSet::new(),
            members: vec![
                MemberDescriptor::new("name", MethodDecl::new("getName", "java.lang.String", vec![])),
                MemberDescriptor::new("nickname", optional),
            ],
        };
        let mut decl = TypeDecl::new("demo.Person", TypeKind::Interface);
        decl.directives.constructor = Some(ConstructorDirective {
            kinds: vec![ConstructorKind::RequiredArgs, ConstructorKind::AllArgs, ConstructorKind::RequiredArgs],
        });
        processor.queue_constructors(&decl, &mut analysis);
        assert_eq!(analysis.queue.describe(), vec!["constructor (name) + 0 super", "constructor (name, nickname) + 0 super"]);
    }
}
