use std::sync::Arc;

use crate::types::context::ContextDefinition;

/// An ordered stack of inline context definitions, outermost first.
///
/// The stack grows by appending and never mutates earlier entries; extending
/// it produces a copy so sibling subtrees are unaffected. Entries are shared
/// structurally via `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    entries: Vec<Arc<ContextDefinition>>,
}

impl ContextStack {
    pub fn new() -> Self {
        ContextStack::default()
    }

    /// A single-entry stack holding the root context.
    pub fn root(definition: ContextDefinition) -> Self {
        ContextStack {
            entries: vec![Arc::new(definition)],
        }
    }

    /// A copy of this stack with `definition` appended as the new innermost
    /// entry.
    pub fn push(&self, definition: ContextDefinition) -> Self {
        let mut entries = self.entries.clone();
        entries.push(Arc::new(definition));
        ContextStack { entries }
    }

    /// Iterate from the innermost (last-appended) entry outward.
    pub fn innermost_first(&self) -> impl Iterator<Item = &ContextDefinition> {
        self.entries.iter().rev().map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<ContextDefinition>> for ContextStack {
    fn from(definitions: Vec<ContextDefinition>) -> Self {
        ContextStack {
            entries: definitions.into_iter().map(Arc::new).collect(),
        }
    }
}
