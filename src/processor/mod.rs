//! Type processors: analysis of annotated types and realization of their queues
//!
//! Analysis runs once per source type and only decides what to generate,
//! recording actions in per-type queues. Realization runs after every type
//! was analyzed and drains each queue against its target class.

pub mod generation;
pub mod non_null;
pub mod rules;

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::ast::TypeDecl;
use crate::error::Result;
use crate::pool::ClassHandle;
use crate::result::ClassResult;
use crate::stack::{ActionQueue, Session};

pub use generation::GenerationProcessor;
pub use non_null::NonNullProcessor;
pub use rules::{MemberKind, NamingRules};

pub trait TypeProcessor {
    /// Handler identity used in error reports
    fn name(&self) -> &str;

    fn should_process(&self, decl: &TypeDecl) -> bool;

    /// Analysis; `false` marks the type as unprocessable
    fn process(&mut self, decl: &Arc<TypeDecl>, session: &mut Session) -> Result<bool>;

    /// Realization of everything queued during analysis
    fn post_process(&mut self, session: &mut Session) -> Result<()>;
}

/// Action queues keyed by source type, in analysis order
#[derive(Debug, Default)]
pub struct PendingGenerations {
    entries: IndexMap<String, (Arc<TypeDecl>, ActionQueue)>,
}

impl PendingGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_mut(&mut self, decl: &Arc<TypeDecl>) -> &mut ActionQueue {
        &mut self
            .entries
            .entry(decl.qualified_name.clone())
            .or_insert_with(|| (Arc::clone(decl), ActionQueue::new()))
            .1
    }

    pub fn get(&self, qualified_name: &str) -> Option<&ActionQueue> {
        self.entries.get(qualified_name).map(|(_, queue)| queue)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry, keeping analysis order
    pub fn take(&mut self) -> Vec<(Arc<TypeDecl>, ActionQueue)> {
        self.entries.drain(..).map(|(_, entry)| entry).collect()
    }
}

/// Run `queue` against `class`, emit the class and publish it back into the pool
pub fn realize(session: &mut Session, decl: Arc<TypeDecl>, class: ClassHandle, queue: &ActionQueue) -> Result<()> {
    debug!(source = %decl.qualified_name, class = %class.name(), actions = queue.len(), "realizing");
    session.set_current_type(decl);
    session.set_current_class(class);
    for action in queue.iter() {
        let label = action.describe();
        trace!(action = %label, "applying");
        session.set_current_action(label);
        action.apply_to(session)?;
    }
    let class = session.take_current_class()?;
    session.clear_current();
    class.ensure_compiled()?;

    let result = ClassResult::builder()
        .package_class_name(class.name().as_str())?
        .bytecode(class.to_bytecode()?)
        .build()?;
    session.classes().replace_or_push(result);
    session.pool().insert(class);
    Ok(())
}
