use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use futures::future::{try_join_all, BoxFuture};
use thiserror::Error;

use crate::loader::fetch::{ContextFetcher, FetchError};
use crate::types::{ContextDefinition, ContextDocument, ContextSpec, TermValue};

/// The ordered sequence of remote context URLs currently being resolved.
///
/// Used purely for cycle detection; every recursion step works on its own
/// copy, so sibling resolutions never observe each other's chains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceChain {
    urls: Vec<String>,
}

impl ReferenceChain {
    pub fn new() -> Self {
        ReferenceChain::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }

    /// A copy of this chain with `url` appended.
    pub fn extended(&self, url: &str) -> Self {
        let mut urls = self.urls.clone();
        urls.push(url.to_string());
        ReferenceChain { urls }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}

impl fmt::Display for ReferenceChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.urls.join(" -> "))
    }
}

/// Per-URL cache of fetched context documents, scoped to one top-level load.
///
/// Entries are inserted only after a fetch completes, so repeat references
/// reuse the completed result but two concurrent first references to the same
/// URL may both hit the network. That weaker guarantee is deliberate; the
/// cache is an optimization, not a correctness mechanism.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<String, ContextDocument>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        ResolutionCache::default()
    }

    pub fn get(&self, url: &str) -> Option<ContextDocument> {
        self.entries
            .lock()
            .expect("resolution cache lock poisoned")
            .get(url)
            .cloned()
    }

    pub fn insert(&self, url: &str, document: ContextDocument) {
        self.entries
            .lock()
            .expect("resolution cache lock poisoned")
            .insert(url.to_string(), document);
    }
}

#[derive(Debug, Error)]
pub enum ContextError {
    /// A URL reference repeated within its own reference chain. The chain
    /// carries every URL followed, ending with the repeated one.
    #[error("circular context reference: {0}")]
    CircularReference(ReferenceChain),
    #[error("failed to fetch context {url}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
}

/// Resolves a context specification into a single merged inline definition.
///
/// Remote references are fetched through the configured [`ContextFetcher`],
/// cached per top-level call, and guarded against cycles. Nested scoped
/// contexts are materialized in place, so the returned definition is fully
/// inline.
pub struct ContextLoader<F> {
    fetcher: F,
}

impl<F: ContextFetcher> ContextLoader<F> {
    pub fn new(fetcher: F) -> Self {
        ContextLoader { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Resolve a bare specification. The cache and reference chain live
    /// exactly as long as this call.
    pub async fn load(&self, spec: ContextSpec) -> Result<ContextDefinition, ContextError> {
        let cache = ResolutionCache::new();
        self.resolve(spec, &cache, ReferenceChain::new()).await
    }

    /// Resolve a wrapper document by unwrapping its inner specification.
    pub async fn load_document(
        &self,
        document: ContextDocument,
    ) -> Result<ContextDefinition, ContextError> {
        self.load(document.context).await
    }

    fn resolve<'a>(
        &'a self,
        spec: ContextSpec,
        cache: &'a ResolutionCache,
        chain: ReferenceChain,
    ) -> BoxFuture<'a, Result<ContextDefinition, ContextError>> {
        Box::pin(async move {
            match spec {
                ContextSpec::Absent => Ok(ContextDefinition::new()),

                ContextSpec::List(entries) => {
                    // Dispatch concurrently; try_join_all keeps results in
                    // the original list order for the left-to-right merge.
                    let resolved = try_join_all(
                        entries
                            .into_iter()
                            .map(|entry| self.resolve(entry, cache, chain.clone())),
                    )
                    .await?;
                    Ok(resolved
                        .into_iter()
                        .fold(ContextDefinition::new(), ContextDefinition::merge))
                }

                ContextSpec::Inline(definition) => {
                    self.materialize(definition, cache, chain).await
                }

                ContextSpec::Reference(url) => {
                    if chain.contains(&url) {
                        return Err(ContextError::CircularReference(chain.extended(&url)));
                    }
                    let document = match cache.get(&url) {
                        Some(document) => document,
                        None => {
                            tracing::debug!(%url, "fetching remote context");
                            let document = self.fetcher.fetch(&url).await.map_err(|source| {
                                ContextError::Fetch {
                                    url: url.clone(),
                                    source,
                                }
                            })?;
                            cache.insert(&url, document.clone());
                            document
                        }
                    };
                    self.resolve(document.context, cache, chain.extended(&url))
                        .await
                }
            }
        })
    }

    /// Pure transform of an inline definition: every term's nested scoped
    /// context is replaced by its resolved inline form. The input is consumed
    /// and a new definition returned, so shared specification values are
    /// never mutated through aliases.
    async fn materialize(
        &self,
        definition: ContextDefinition,
        cache: &ResolutionCache,
        chain: ReferenceChain,
    ) -> Result<ContextDefinition, ContextError> {
        let mut materialized = ContextDefinition::new();
        for (term, value) in definition {
            let value = match value {
                TermValue::Detailed(mut term_def) => {
                    if let Some(nested) = term_def.context.take() {
                        let resolved = self.resolve(*nested, cache, chain.clone()).await?;
                        term_def.context = Some(Box::new(ContextSpec::Inline(resolved)));
                    }
                    TermValue::Detailed(term_def)
                }
                other => other,
            };
            materialized.insert(term, value);
        }
        Ok(materialized)
    }
}
