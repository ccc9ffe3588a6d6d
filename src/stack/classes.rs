//! Ordered set of class results shared by one generation session
//!
//! Writers swap in a new `Arc<Vec<_>>` under the lock, so a snapshot taken
//! for enumeration stays valid while generation keeps appending.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::result::ClassResult;

#[derive(Debug, Default)]
pub struct ClassStack {
    results: RwLock<Arc<Vec<ClassResult>>>,
}

impl ClassStack {
    pub fn new() -> Self {
        Self::default()
    }

    fn update<R>(&self, f: impl FnOnce(&mut Vec<ClassResult>) -> R) -> R {
        let mut guard = self.results.write();
        let mut next = Vec::clone(&guard);
        let out = f(&mut next);
        *guard = Arc::new(next);
        out
    }

    /// Current contents; unaffected by later modifications
    pub fn snapshot(&self) -> Arc<Vec<ClassResult>> {
        Arc::clone(&self.results.read())
    }

    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }

    pub fn push_first(&self, result: ClassResult) {
        self.update(|v| v.insert(0, result));
    }

    pub fn push_last(&self, result: ClassResult) {
        self.update(|v| v.push(result));
    }

    pub fn push_at(&self, index: usize, result: ClassResult) -> Result<()> {
        self.update(|v| {
            if index > v.len() {
                return Err(Error::internal(format!("class result index {index} out of bounds ({})", v.len())));
            }
            v.insert(index, result);
            Ok(())
        })
    }

    /// Insert before the result for `qualified_name`
    pub fn push_before(&self, qualified_name: &str, result: ClassResult) -> Result<()> {
        self.update(|v| {
            let index = position(v, qualified_name)?;
            v.insert(index, result);
            Ok(())
        })
    }

    /// Insert after the result for `qualified_name`
    pub fn push_after(&self, qualified_name: &str, result: ClassResult) -> Result<()> {
        self.update(|v| {
            let index = position(v, qualified_name)?;
            v.insert(index + 1, result);
            Ok(())
        })
    }

    /// Replace the result for the same class, or append; returns whether one was replaced
    pub fn replace_or_push(&self, result: ClassResult) -> bool {
        self.update(|v| match v.iter().position(|r| r.same_class(&result)) {
            Some(index) => {
                v[index] = result;
                true
            }
            None => {
                v.push(result);
                false
            }
        })
    }

    pub fn has(&self, qualified_name: &str) -> bool {
        self.results.read().iter().any(|r| r.qualified_name() == qualified_name)
    }

    pub fn get(&self, qualified_name: &str) -> Option<ClassResult> {
        self.results.read().iter().find(|r| r.qualified_name() == qualified_name).cloned()
    }

    pub fn at(&self, index: usize) -> Option<ClassResult> {
        self.results.read().get(index).cloned()
    }

    pub fn first(&self) -> Option<ClassResult> {
        self.results.read().first().cloned()
    }

    pub fn last(&self) -> Option<ClassResult> {
        self.results.read().last().cloned()
    }

    pub fn remove(&self, qualified_name: &str) -> Option<ClassResult> {
        self.update(|v| v.iter().position(|r| r.qualified_name() == qualified_name).map(|i| v.remove(i)))
    }

    pub fn remove_at(&self, index: usize) -> Option<ClassResult> {
        self.update(|v| (index < v.len()).then(|| v.remove(index)))
    }

    pub fn reset(&self) {
        *self.results.write() = Arc::new(Vec::new());
    }
}

fn position(results: &[ClassResult], qualified_name: &str) -> Result<usize> {
    results
        .iter()
        .position(|r| r.qualified_name() == qualified_name)
        .ok_or_else(|| Error::missing(qualified_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, bytes: u8) -> ClassResult {
        ClassResult::builder().package_class_name(name).unwrap().bytecode(vec![bytes]).build().unwrap()
    }

    fn names(stack: &ClassStack) -> Vec<String> {
        stack.snapshot().iter().map(ClassResult::qualified_name).collect()
    }

    #[test]
    fn test_ordered_inserts() {
        let stack = ClassStack::new();
        stack.push_last(result("demo.B", 0));
        stack.push_first(result("demo.A", 0));
        stack.push_after("demo.B", result("demo.D", 0)).unwrap();
        stack.push_before("demo.D", result("demo.C", 0)).unwrap();
        stack.push_at(0, result("demo.Start", 0)).unwrap();
        assert_eq!(names(&stack), vec!["demo.Start", "demo.A", "demo.B", "demo.C", "demo.D"]);
        assert!(stack.push_before("demo.Missing", result("demo.E", 0)).is_err());
        assert!(stack.push_at(9, result("demo.E", 0)).is_err());
        assert_eq!(stack.first().unwrap().simple_name(), "Start");
        assert_eq!(stack.last().unwrap().simple_name(), "D");
    }

    #[test]
    fn test_replace_or_push_keeps_position() {
        let stack = ClassStack::new();
        stack.push_last(result("demo.Factory", 1));
        stack.push_last(result("demo.PersonImpl", 1));
        assert!(stack.replace_or_push(result("demo.Factory", 2)));
        assert!(!stack.replace_or_push(result("demo.Other", 1)));
        assert_eq!(names(&stack), vec!["demo.Factory", "demo.PersonImpl", "demo.Other"]);
        assert_eq!(stack.at(0).unwrap().bytecode(), &[2]);
    }

    #[test]
    fn test_snapshot_is_stable() {
        let stack = ClassStack::new();
        stack.push_last(result("demo.A", 0));
        let snapshot = stack.snapshot();
        stack.push_last(result("demo.B", 0));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(stack.len(), 2);
        assert!(stack.remove("demo.A").is_some());
        assert!(stack.remove_at(5).is_none());
        stack.reset();
        assert!(stack.is_empty());
    }
}
