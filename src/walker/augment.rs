use std::sync::Arc;

use crate::resource::ResourceResolver;
use crate::terms::resolve_term;
use crate::types::{ContextDefinition, ContextSpec, ContextStack};
use crate::walker::tree::{
    Marker, NodeRef, DESCRIPTION_ATTR, HREF_ATTR, LABEL_ATTR, PROPERTY_ATTR, RESOURCE_ATTR,
    TITLE_ATTR,
};

/// Configuration recognized by [`Augmenter::augment`].
#[derive(Debug, Clone)]
pub struct AugmentOptions {
    /// When set, annotated nodes get a link target immediately and their
    /// displayed text is replaced by the resolved label on completion.
    pub replace_with_link: bool,
}

impl Default for AugmentOptions {
    fn default() -> Self {
        AugmentOptions {
            replace_with_link: true,
        }
    }
}

/// Walks a document tree, expanding property and value tokens against a
/// context stack and handing resolved identifiers to the resource resolver.
///
/// The traversal itself is synchronous; each annotation is spawned
/// fire-and-forget and completes in unspecified order relative to the walk
/// and to other annotations. Failures are confined to the affected node.
pub struct Augmenter {
    resolver: Arc<ResourceResolver>,
    options: AugmentOptions,
}

impl Augmenter {
    pub fn new(resolver: Arc<ResourceResolver>, options: AugmentOptions) -> Self {
        Augmenter { resolver, options }
    }

    /// Walk the subtree under `root` with `context` as the outermost scope.
    ///
    /// Must be called from within a Tokio runtime; annotation tasks are
    /// spawned onto it.
    pub fn augment(&self, root: &NodeRef, context: ContextDefinition) {
        self.walk(root, &ContextStack::root(context));
    }

    fn walk(&self, node: &NodeRef, stack: &ContextStack) {
        for (property, value) in direct_properties(node) {
            let token = property
                .attribute(PROPERTY_ATTR)
                .filter(|token| !token.is_empty())
                .unwrap_or_else(|| property.text().trim().to_string());

            let mut branch = stack.clone();
            if let Some(resolved) = resolve_term(&token, stack, true, false) {
                self.annotate(&property, &resolved.id);

                if let Some(ContextSpec::Inline(scoped)) = &resolved.context {
                    // Scoped context applies to this property's value subtree
                    // only; siblings keep the original stack.
                    branch = stack.push(scoped.clone());
                }

                if resolved.coerces_to_id() {
                    if let Some(value) = &value {
                        for leaf in literal_leaves(value) {
                            let text = leaf.text();
                            let literal_token = text.trim();
                            // Literals coerce through the base default, never
                            // the vocabulary default.
                            if let Some(literal) =
                                resolve_term(literal_token, &branch, false, true)
                            {
                                self.annotate(&leaf, &literal.id);
                            }
                        }
                    }
                }
            }

            // Descend whether or not the property resolved.
            if let Some(value) = value {
                self.walk(&value, &branch);
            }
        }
    }

    /// Record the identifier on the node and kick off its annotation without
    /// blocking the walk.
    fn annotate(&self, node: &NodeRef, uri: &str) {
        node.set_attribute(RESOURCE_ATTR, uri);
        if self.options.replace_with_link {
            node.set_attribute(HREF_ATTR, uri);
        }
        node.begin_loading();

        let resolver = Arc::clone(&self.resolver);
        let node = node.clone();
        let uri = uri.to_string();
        let replace = self.options.replace_with_link;
        tokio::spawn(async move {
            match resolver.resolve(&uri).await {
                Ok(data) => {
                    if let Some(label) = &data.label {
                        node.set_attribute(LABEL_ATTR, label);
                        if replace {
                            node.set_text(label);
                        }
                    }
                    if let Some(description) = &data.description {
                        node.set_attribute(DESCRIPTION_ATTR, description);
                        if replace {
                            node.set_attribute(TITLE_ATTR, description);
                        }
                    }
                    node.mark_resolved();
                }
                Err(error) => {
                    tracing::warn!(%uri, %error, "resource annotation failed");
                    node.mark_failed();
                }
            }
        });
    }
}

/// The property markers belonging to `root`'s level, each paired with its
/// associated value container (the first value-marked sibling).
///
/// The traversal accepts property markers, refuses to descend into value
/// containers other than the starting node itself, and passes through
/// everything else, so markers inside nested value subtrees are not
/// collected here.
fn direct_properties(root: &NodeRef) -> Vec<(NodeRef, Option<NodeRef>)> {
    let mut found = Vec::new();
    collect_properties(root, &mut found);
    found
}

fn collect_properties(parent: &NodeRef, found: &mut Vec<(NodeRef, Option<NodeRef>)>) {
    let children = parent.children();
    for child in &children {
        match child.marker() {
            // Nested value subtrees belong to a deeper level.
            Marker::Value => {}
            Marker::Property => {
                let value = children
                    .iter()
                    .find(|sibling| sibling.marker() == Marker::Value)
                    .cloned();
                found.push((child.clone(), value));
                collect_properties(child, found);
            }
            Marker::Literal | Marker::Plain => collect_properties(child, found),
        }
    }
}

/// The literal leaves directly inside a value subtree, refusing to descend
/// into nested property/value structure.
fn literal_leaves(root: &NodeRef) -> Vec<NodeRef> {
    let mut found = Vec::new();
    collect_literals(root, &mut found);
    found
}

fn collect_literals(parent: &NodeRef, found: &mut Vec<NodeRef>) {
    for child in parent.children() {
        match child.marker() {
            Marker::Property | Marker::Value => {}
            Marker::Literal => found.push(child),
            Marker::Plain => collect_literals(&child, found),
        }
    }
}
