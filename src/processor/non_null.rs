//! Null-check guards for concrete methods of model types
//!
//! The guarded class is the type's own compiled class, loaded through the
//! pool (compiled from source on demand), patched and emitted.

use std::sync::Arc;

use tracing::debug;

use crate::ast::TypeDecl;
use crate::error::Result;
use crate::generation::NonNullGenerator;
use crate::stack::Session;

use super::{realize, PendingGenerations, TypeProcessor};

pub const NAME: &str = "non-null";

#[derive(Default)]
pub struct NonNullProcessor {
    pending: PendingGenerations,
}

impl NonNullProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &PendingGenerations {
        &self.pending
    }
}

impl TypeProcessor for NonNullProcessor {
    fn name(&self) -> &str {
        NAME
    }

    fn should_process(&self, decl: &TypeDecl) -> bool {
        !decl.library && decl.methods.iter().any(|m| !m.is_abstract && !m.non_null_params().is_empty())
    }

    fn process(&mut self, decl: &Arc<TypeDecl>, _session: &mut Session) -> Result<bool> {
        for method in decl.methods.iter().filter(|m| !m.is_abstract) {
            let guard = NonNullGenerator::new(method);
            if !guard.is_empty() {
                self.pending.queue_mut(decl).push_front(Arc::new(guard));
            }
        }
        Ok(true)
    }

    fn post_process(&mut self, session: &mut Session) -> Result<()> {
        for (decl, queue) in self.pending.take() {
            if queue.is_empty() {
                continue;
            }
            debug!(source = %decl.qualified_name, guards = queue.len(), "guarding concrete methods");
            let class = session.pool().get(&decl.qualified_name)?;
            class.ensure_compiled()?;
            let class = session.pool().take(&decl.qualified_name)?;
            realize(session, decl, class, &queue)?;
        }
        Ok(())
    }
}
