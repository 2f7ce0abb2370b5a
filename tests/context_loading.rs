use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use linked_context::loader::{ContextError, ContextFetcher, ContextLoader, FetchError};
use linked_context::types::{ContextDocument, ContextSpec, TermValue};
use serde_json::json;

/// In-memory fetcher serving canned context documents, counting fetches.
#[derive(Default)]
struct MapFetcher {
    documents: HashMap<String, ContextDocument>,
    calls: AtomicUsize,
}

impl MapFetcher {
    fn with(documents: Vec<(&str, serde_json::Value)>) -> Self {
        MapFetcher {
            documents: documents
                .into_iter()
                .map(|(url, value)| {
                    let document: ContextDocument =
                        serde_json::from_value(value).expect("invalid test document");
                    (url.to_string(), document)
                })
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContextFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> Result<ContextDocument, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

fn spec(value: serde_json::Value) -> ContextSpec {
    serde_json::from_value(value).expect("invalid test specification")
}

fn id_of(value: Option<&TermValue>) -> &str {
    match value {
        Some(TermValue::Id(id)) => id,
        other => panic!("expected a bare identifier mapping, got {other:?}"),
    }
}

#[tokio::test]
async fn absent_specification_yields_empty_definition() {
    let loader = ContextLoader::new(MapFetcher::default());

    let resolved = loader.load(ContextSpec::Absent).await.unwrap();
    assert!(resolved.is_empty());
}

#[tokio::test]
async fn specification_shapes_deserialize_to_expected_variants() {
    assert_eq!(spec(json!(null)), ContextSpec::Absent);
    assert!(matches!(
        spec(json!("http://example.org/ctx")),
        ContextSpec::Reference(_)
    ));
    assert!(matches!(spec(json!(["http://example.org/ctx"])), ContextSpec::List(_)));
    assert!(matches!(
        spec(json!({"name": "http://schema.org/name"})),
        ContextSpec::Inline(_)
    ));
}

#[tokio::test]
async fn list_merge_overrides_left_with_right() {
    let loader = ContextLoader::new(MapFetcher::default());

    let resolved = loader
        .load(spec(json!([
            {"a": "http://left.example/a"},
            {"a": "http://right.example/a", "b": "http://right.example/b"},
        ])))
        .await
        .unwrap();

    assert_eq!(resolved.len(), 2);
    assert_eq!(id_of(resolved.get("a")), "http://right.example/a");
    assert_eq!(id_of(resolved.get("b")), "http://right.example/b");
}

#[tokio::test]
async fn list_merge_keeps_left_only_keys() {
    let loader = ContextLoader::new(MapFetcher::default());

    let resolved = loader
        .load(spec(json!([
            {"a": "http://left.example/a", "c": "http://left.example/c"},
            {"a": "http://right.example/a"},
        ])))
        .await
        .unwrap();

    assert_eq!(id_of(resolved.get("c")), "http://left.example/c");
    assert_eq!(id_of(resolved.get("a")), "http://right.example/a");
}

#[tokio::test]
async fn empty_list_yields_empty_definition() {
    let loader = ContextLoader::new(MapFetcher::default());

    let resolved = loader.load(spec(json!([]))).await.unwrap();
    assert!(resolved.is_empty());
}

#[tokio::test]
async fn single_entry_list_yields_that_entry() {
    let loader = ContextLoader::new(MapFetcher::default());

    let resolved = loader
        .load(spec(json!([{"a": "http://example.org/a"}])))
        .await
        .unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(id_of(resolved.get("a")), "http://example.org/a");
}

#[tokio::test]
async fn remote_reference_resolves_through_fetcher() {
    let fetcher = MapFetcher::with(vec![(
        "http://example.org/ctx",
        json!({"@context": {"name": "http://schema.org/name"}}),
    )]);
    let loader = ContextLoader::new(fetcher);

    let resolved = loader
        .load(spec(json!("http://example.org/ctx")))
        .await
        .unwrap();
    assert_eq!(id_of(resolved.get("name")), "http://schema.org/name");
}

#[tokio::test]
async fn list_of_references_merges_in_list_order() {
    let fetcher = MapFetcher::with(vec![
        (
            "http://example.org/a",
            json!({"@context": {"name": "http://a.example/name"}}),
        ),
        (
            "http://example.org/b",
            json!({"@context": {"name": "http://b.example/name"}}),
        ),
    ]);
    let loader = ContextLoader::new(fetcher);

    let resolved = loader
        .load(spec(json!(["http://example.org/a", "http://example.org/b"])))
        .await
        .unwrap();
    assert_eq!(
        id_of(resolved.get("name")),
        "http://b.example/name",
        "later list entries must override earlier ones"
    );
}

#[tokio::test]
async fn circular_reference_fails_with_full_chain() {
    let fetcher = MapFetcher::with(vec![
        ("X", json!({"@context": "Y"})),
        ("Y", json!({"@context": "X"})),
    ]);
    let loader = ContextLoader::new(fetcher);

    let error = loader
        .load(ContextSpec::Reference("X".to_string()))
        .await
        .expect_err("cycle must fail resolution");

    assert!(matches!(error, ContextError::CircularReference(_)));
    let message = error.to_string();
    assert!(
        message.contains("X -> Y -> X"),
        "error must report the full chain, got: {message}"
    );
}

#[tokio::test]
async fn self_reference_fails_with_chain() {
    let fetcher = MapFetcher::with(vec![("X", json!({"@context": "X"}))]);
    let loader = ContextLoader::new(fetcher);

    let error = loader
        .load(ContextSpec::Reference("X".to_string()))
        .await
        .expect_err("self-cycle must fail resolution");
    assert!(error.to_string().contains("X -> X"));
}

#[tokio::test]
async fn nested_scoped_contexts_are_materialized() {
    let fetcher = MapFetcher::with(vec![(
        "http://example.org/scoped",
        json!({"@context": {"inner": "http://example.org/inner"}}),
    )]);
    let loader = ContextLoader::new(fetcher);

    let resolved = loader
        .load(spec(json!({
            "knows": {
                "@id": "http://schema.org/knows",
                "@context": "http://example.org/scoped"
            }
        })))
        .await
        .unwrap();

    let Some(TermValue::Detailed(term)) = resolved.get("knows") else {
        panic!("expected a structured mapping for knows");
    };
    let Some(nested) = term.context.as_deref() else {
        panic!("scoped context missing");
    };
    let ContextSpec::Inline(nested) = nested else {
        panic!("scoped context must be materialized inline, got {nested:?}");
    };
    assert_eq!(id_of(nested.get("inner")), "http://example.org/inner");
}

#[tokio::test]
async fn repeat_references_reuse_the_completed_fetch() {
    let fetcher = MapFetcher::with(vec![(
        "http://example.org/shared",
        json!({"@context": {"inner": "http://example.org/inner"}}),
    )]);
    let loader = ContextLoader::new(fetcher);

    // Nested scoped contexts resolve sequentially, so the second reference
    // observes the completed cache entry.
    let resolved = loader
        .load(spec(json!({
            "a": {"@id": "http://example.org/a", "@context": "http://example.org/shared"},
            "b": {"@id": "http://example.org/b", "@context": "http://example.org/shared"}
        })))
        .await
        .unwrap();

    assert_eq!(resolved.len(), 2);
    assert_eq!(loader_calls(&loader), 1, "second reference must hit the cache");
}

fn loader_calls(loader: &ContextLoader<MapFetcher>) -> usize {
    loader.fetcher().call_count()
}

#[tokio::test]
async fn document_wrapper_is_unwrapped() {
    let loader = ContextLoader::new(MapFetcher::default());
    let document: ContextDocument =
        serde_json::from_value(json!({"@context": {"name": "http://schema.org/name"}})).unwrap();

    let resolved = loader.load_document(document).await.unwrap();
    assert_eq!(id_of(resolved.get("name")), "http://schema.org/name");
}

#[tokio::test]
async fn document_without_context_key_is_empty() {
    let loader = ContextLoader::new(MapFetcher::default());
    let document: ContextDocument = serde_json::from_value(json!({"other": 1})).unwrap();

    let resolved = loader.load_document(document).await.unwrap();
    assert!(resolved.is_empty());
}

#[tokio::test]
async fn fetch_failure_surfaces_as_context_error() {
    let loader = ContextLoader::new(MapFetcher::default());

    let error = loader
        .load(ContextSpec::Reference("http://example.org/missing".to_string()))
        .await
        .expect_err("missing document must fail");
    assert!(matches!(error, ContextError::Fetch { .. }));
}
