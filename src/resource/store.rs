use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// One accumulated statement about a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

/// Accumulates annotation statements for the lifetime of its owner.
///
/// Shared by every resource resolution that completes; never evicted or
/// size-bounded at this layer. Writes from concurrent completions concern
/// disjoint subjects in the common case, and the lock makes the uncommon
/// case safe too.
#[derive(Debug, Default)]
pub struct TripleStore {
    statements: Mutex<Vec<Statement>>,
}

impl TripleStore {
    pub fn new() -> Self {
        TripleStore::default()
    }

    pub fn insert_all(&self, batch: Vec<Statement>) {
        self.statements
            .lock()
            .expect("triple store lock poisoned")
            .extend(batch);
    }

    pub fn len(&self) -> usize {
        self.statements
            .lock()
            .expect("triple store lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any statement has been recorded about `subject`.
    pub fn has_subject(&self, subject: &str) -> bool {
        self.statements
            .lock()
            .expect("triple store lock poisoned")
            .iter()
            .any(|statement| statement.subject == subject)
    }

    /// The object of the first statement about `subject` whose predicate
    /// matches, trying `predicates` in preference order.
    pub fn first_object_matching(&self, subject: &str, predicates: &[String]) -> Option<String> {
        let statements = self
            .statements
            .lock()
            .expect("triple store lock poisoned");
        for predicate in predicates {
            let found = statements
                .iter()
                .find(|statement| statement.subject == subject && &statement.predicate == predicate);
            if let Some(statement) = found {
                return Some(statement.object.clone());
            }
        }
        None
    }
}
