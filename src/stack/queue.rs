use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::generation::Generator;

/// Pending generation actions for one target type, executed front to back
#[derive(Default, Clone)]
pub struct ActionQueue {
    actions: VecDeque<Arc<dyn Generator>>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_front(&mut self, action: Arc<dyn Generator>) {
        self.actions.push_front(action);
    }

    pub fn push_back(&mut self, action: Arc<dyn Generator>) {
        self.actions.push_back(action);
    }

    pub fn pop_front(&mut self) -> Option<Arc<dyn Generator>> {
        self.actions.pop_front()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Generator>> {
        self.actions.iter()
    }

    /// One line per action, in execution order
    pub fn describe(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.describe()).collect()
    }
}

impl fmt::Debug for ActionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.describe()).finish()
    }
}

impl IntoIterator for ActionQueue {
    type Item = Arc<dyn Generator>;
    type IntoIter = std::collections::vec_deque::IntoIter<Arc<dyn Generator>>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::stack::Session;

    struct Named(&'static str);

    impl Generator for Named {
        fn apply_to(&self, _: &mut Session) -> Result<()> {
            Ok(())
        }

        fn describe(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_front_and_back_ordering() {
        let mut queue = ActionQueue::new();
        queue.push_back(Arc::new(Named("getter name")));
        queue.push_front(Arc::new(Named("field name")));
        queue.push_back(Arc::new(Named("getter age")));
        queue.push_front(Arc::new(Named("field age")));
        assert_eq!(queue.describe(), vec!["field age", "field name", "getter name", "getter age"]);
        assert_eq!(queue.pop_front().unwrap().describe(), "field age");
        assert_eq!(queue.len(), 3);
    }
}
