//! Term resolution: expanding short tokens into canonical identifiers by
//! searching a context stack innermost-first, with compact-identifier
//! expansion and vocabulary/base fallback.

use crate::types::{ContextStack, ResolvedTerm, TermValue};
use crate::vocab::RDF_TYPE;

/// The reserved token that always resolves to the RDF type identifier.
pub const TYPE_TOKEN: &str = "@type";

/// Resolve `token` against `stack`.
///
/// Search order is innermost-first. An unusable mapping (null, boolean,
/// array, or a structured mapping without a string identifier) is skipped as
/// if absent at that level only: the scan continues outward instead of
/// falling through to the defaults, so an invalid local mapping never masks a
/// valid outer one.
///
/// `vocab_fallback` and `base_fallback` control the two default-expansion
/// mechanisms for tokens that contain no `:` separator and matched no
/// mapping. Property expansion uses `(true, false)`; coercing literal values
/// into identifiers uses `(false, true)`.
pub fn resolve_term(
    token: &str,
    stack: &ContextStack,
    vocab_fallback: bool,
    base_fallback: bool,
) -> Option<ResolvedTerm> {
    if token == TYPE_TOKEN {
        return Some(ResolvedTerm::id(RDF_TYPE));
    }
    // Already an absolute identifier; no lookup.
    if token.contains("://") {
        return Some(ResolvedTerm::id(token));
    }

    let mut vocab_default: Option<String> = None;
    let mut base_default: Option<String> = None;

    for definition in stack.innermost_first() {
        // Keep only the innermost declaration of each default, recorded
        // whether or not the token is a key at this level.
        if vocab_default.is_none() {
            vocab_default = definition.vocab().map(str::to_string);
        }
        if base_default.is_none() {
            base_default = definition.base().map(str::to_string);
        }

        let Some(value) = definition.get(token) else {
            continue;
        };
        let Some(mut resolved) = usable_mapping(value) else {
            continue;
        };

        // A colon-less identifier does not terminate the scan; the token may
        // still reach an outer mapping or the defaults.
        let Some(split) = resolved.id.find(':') else {
            continue;
        };
        let local = resolved.id[split + 1..].to_string();
        if local.starts_with("//") {
            // Already absolute.
            return Some(resolved);
        }
        let prefix = &resolved.id[..split];
        if let Some(prefix_term) = resolve_term(prefix, stack, true, false) {
            resolved.id = format!("{}{}", prefix_term.id, local);
        }
        // Returned whether or not the prefix resolved.
        return Some(resolved);
    }

    if let Some(split) = token.find(':') {
        // The token itself is a compact identifier; expand through its
        // prefix. Defaults never apply to a prefix, so an undeclared one
        // leaves the token unresolved.
        let (prefix, local) = (&token[..split], &token[split + 1..]);
        return resolve_term(prefix, stack, false, false)
            .map(|prefix_term| ResolvedTerm::id(format!("{}{}", prefix_term.id, local)));
    }
    if vocab_fallback {
        if let Some(vocab) = vocab_default {
            return Some(ResolvedTerm::id(format!("{vocab}{token}")));
        }
    }
    if base_fallback {
        if let Some(base) = base_default {
            return Some(ResolvedTerm::id(format!("{base}{token}")));
        }
    }
    None
}

/// A mapping usable for resolution, or `None` for null/boolean/array values
/// and structured mappings without a string identifier.
fn usable_mapping(value: &TermValue) -> Option<ResolvedTerm> {
    match value {
        TermValue::Id(id) => Some(ResolvedTerm::id(id)),
        TermValue::Detailed(definition) => {
            definition.id.as_ref().map(|id| ResolvedTerm {
                id: id.clone(),
                context: definition.context.as_deref().cloned(),
                type_coercion: definition.type_coercion.clone(),
            })
        }
        TermValue::Null | TermValue::Bool(_) | TermValue::List(_) => None,
    }
}
