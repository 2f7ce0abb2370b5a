use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// The structural role a node plays in the document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Names a property at its level.
    Property,
    /// Contains the value subtree associated with a sibling property marker.
    Value,
    /// A leaf literal value.
    Literal,
    /// Structural node with no annotation role.
    Plain,
}

/// Per-node annotation lifecycle. Each transition happens exactly once and
/// states are mutually exclusive; nodes progress independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationState {
    Unannotated,
    Loading,
    Resolved,
    Failed,
}

/// Attribute key holding the resolved resource identifier.
pub const RESOURCE_ATTR: &str = "resource";
/// Attribute key holding the resolved display label.
pub const LABEL_ATTR: &str = "label";
/// Attribute key holding the resolved description.
pub const DESCRIPTION_ATTR: &str = "description";
/// Attribute key holding the link target when link replacement is on.
pub const HREF_ATTR: &str = "href";
/// Attribute key holding the hover text when link replacement is on.
pub const TITLE_ATTR: &str = "title";
/// Attribute key holding an explicit property token, preferred over text.
pub const PROPERTY_ATTR: &str = "property";

#[derive(Debug)]
struct NodeData {
    marker: Marker,
    text: String,
    attributes: BTreeMap<String, String>,
    state: AnnotationState,
    children: Vec<NodeRef>,
}

/// A shared handle to one document tree node.
///
/// Annotation completes on spawned tasks after the traversal has moved on,
/// so node contents live behind a lock. Structure (children) is fixed once
/// built; only text, attributes, and annotation state change afterwards.
#[derive(Debug, Clone)]
pub struct NodeRef {
    inner: Arc<Mutex<NodeData>>,
}

impl NodeRef {
    pub fn new(marker: Marker, text: impl Into<String>) -> Self {
        NodeRef {
            inner: Arc::new(Mutex::new(NodeData {
                marker,
                text: text.into(),
                attributes: BTreeMap::new(),
                state: AnnotationState::Unannotated,
                children: Vec::new(),
            })),
        }
    }

    pub fn property(text: impl Into<String>) -> Self {
        NodeRef::new(Marker::Property, text)
    }

    pub fn literal(text: impl Into<String>) -> Self {
        NodeRef::new(Marker::Literal, text)
    }

    pub fn value(children: Vec<NodeRef>) -> Self {
        let node = NodeRef::new(Marker::Value, "");
        node.lock().children = children;
        node
    }

    pub fn plain(children: Vec<NodeRef>) -> Self {
        let node = NodeRef::new(Marker::Plain, "");
        node.lock().children = children;
        node
    }

    fn lock(&self) -> MutexGuard<'_, NodeData> {
        self.inner.lock().expect("node lock poisoned")
    }

    pub fn marker(&self) -> Marker {
        self.lock().marker
    }

    pub fn text(&self) -> String {
        self.lock().text.clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.lock().text = text.into();
    }

    pub fn attribute(&self, key: &str) -> Option<String> {
        self.lock().attributes.get(key).cloned()
    }

    pub fn set_attribute(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().attributes.insert(key.into(), value.into());
    }

    pub fn children(&self) -> Vec<NodeRef> {
        self.lock().children.clone()
    }

    pub fn push_child(&self, child: NodeRef) {
        self.lock().children.push(child);
    }

    pub fn state(&self) -> AnnotationState {
        self.lock().state
    }

    /// `Unannotated -> Loading`.
    pub fn begin_loading(&self) {
        let mut data = self.lock();
        debug_assert_eq!(data.state, AnnotationState::Unannotated);
        data.state = AnnotationState::Loading;
    }

    /// `Loading -> Resolved`.
    pub fn mark_resolved(&self) {
        let mut data = self.lock();
        debug_assert_eq!(data.state, AnnotationState::Loading);
        data.state = AnnotationState::Resolved;
    }

    /// `Loading -> Failed`.
    pub fn mark_failed(&self) {
        let mut data = self.lock();
        debug_assert_eq!(data.state, AnnotationState::Loading);
        data.state = AnnotationState::Failed;
    }
}
