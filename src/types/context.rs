use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A context specification as it appears in a document.
///
/// The wire shapes are duck-typed JSON (null, a URL string, an array, or an
/// object); the untagged union gives each shape an explicit variant so every
/// resolution step can match exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextSpec {
    /// `null` (or a missing `@context` key).
    Absent,
    /// A URL pointing at a remote context document.
    Reference(String),
    /// An ordered list of specifications, merged left-to-right after resolution.
    List(Vec<ContextSpec>),
    /// An inline definition, usable as-is.
    Inline(ContextDefinition),
}

impl Default for ContextSpec {
    fn default() -> Self {
        ContextSpec::Absent
    }
}

/// The value mapped to a single term inside a context definition.
///
/// `Null`, `Bool` and `List` are syntactically valid but unusable for term
/// resolution; `Detailed` is unusable too unless it carries a string `@id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermValue {
    Null,
    Bool(bool),
    Id(String),
    List(Vec<serde_json::Value>),
    Detailed(TermDefinition),
}

/// A structured term mapping: an identifier plus optional scoped context and
/// type coercion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermDefinition {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Box<ContextSpec>>,
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub type_coercion: Option<String>,
}

/// The reserved key whose value is a vocabulary default.
pub const VOCAB_KEY: &str = "@vocab";
/// The reserved key whose value is a base default for identifier coercion.
pub const BASE_KEY: &str = "@base";
/// The type-coercion marker meaning "treat the value as an identifier".
pub const ID_COERCION: &str = "@id";

/// A fully inline context definition: term name to term value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextDefinition {
    terms: BTreeMap<String, TermValue>,
}

impl ContextDefinition {
    pub fn new() -> Self {
        ContextDefinition {
            terms: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, term: impl Into<String>, value: TermValue) {
        self.terms.insert(term.into(), value);
    }

    pub fn get(&self, term: &str) -> Option<&TermValue> {
        self.terms.get(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TermValue)> {
        self.terms.iter()
    }

    /// Shallow key-wise merge: every key of `other` overrides the same key
    /// here; keys only present on one side are kept.
    pub fn merge(mut self, other: ContextDefinition) -> ContextDefinition {
        for (term, value) in other.terms {
            self.terms.insert(term, value);
        }
        self
    }

    /// The vocabulary default, if declared as a non-empty string.
    pub fn vocab(&self) -> Option<&str> {
        self.reserved_string(VOCAB_KEY)
    }

    /// The base default, if declared as a non-empty string.
    pub fn base(&self) -> Option<&str> {
        self.reserved_string(BASE_KEY)
    }

    fn reserved_string(&self, key: &str) -> Option<&str> {
        match self.terms.get(key) {
            Some(TermValue::Id(value)) if !value.is_empty() => Some(value),
            _ => None,
        }
    }
}

impl IntoIterator for ContextDefinition {
    type Item = (String, TermValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, TermValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.into_iter()
    }
}

impl FromIterator<(String, TermValue)> for ContextDefinition {
    fn from_iter<I: IntoIterator<Item = (String, TermValue)>>(iter: I) -> Self {
        ContextDefinition {
            terms: iter.into_iter().collect(),
        }
    }
}

/// The shape remote context documents arrive in: a wrapper whose single
/// recognized key holds the specification. Other keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
    #[serde(rename = "@context", default)]
    pub context: ContextSpec,
}

/// The outcome of resolving a single term.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTerm {
    /// The expanded identifier.
    pub id: String,
    /// A scoped context to push for the term's value subtree, if any.
    pub context: Option<ContextSpec>,
    /// The type-coercion marker carried by the mapping, if any.
    pub type_coercion: Option<String>,
}

impl ResolvedTerm {
    /// A resolved term carrying only an identifier.
    pub fn id(id: impl Into<String>) -> Self {
        ResolvedTerm {
            id: id.into(),
            context: None,
            type_coercion: None,
        }
    }

    /// Whether the mapping coerces values into identifiers.
    pub fn coerces_to_id(&self) -> bool {
        self.type_coercion.as_deref() == Some(ID_COERCION)
    }
}
