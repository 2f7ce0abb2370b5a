use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::loader::FetchError;
use crate::resource::store::{Statement, TripleStore};
use crate::vocab;

/// Annotation data extracted for a single resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    pub uri: String,
    pub label: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to fetch resource {url}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("unknown resource content type {content_type} for {url}")]
    UnknownContentType { url: String, content_type: String },
    #[error("could not parse data for {url}")]
    Parse {
        url: String,
        #[source]
        source: GraphParseError,
    },
    /// A transport-level success that yielded no statements about the
    /// subject; treated the same as a fetch failure.
    #[error("no data on resource {url} could be retrieved")]
    NoData { url: String },
}

/// A raw fetched resource representation, not yet parsed.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub content_type: Option<String>,
    pub body: String,
}

/// Transport seam for resource bodies.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str, accept: &str) -> Result<FetchedResource, FetchError>;
}

/// Default transport: HTTP GET with the caller-built `Accept` header.
#[derive(Debug, Clone, Default)]
pub struct HttpResourceFetcher {
    client: reqwest::Client,
}

impl HttpResourceFetcher {
    pub fn new() -> Self {
        HttpResourceFetcher::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        HttpResourceFetcher { client }
    }
}

#[async_trait]
impl ResourceFetcher for HttpResourceFetcher {
    async fn fetch(&self, url: &str, accept: &str) -> Result<FetchedResource, FetchError> {
        let response = self.client.get(url).header(ACCEPT, accept).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_string());
        let body = response.text().await?;

        Ok(FetchedResource { content_type, body })
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GraphParseError {
    pub message: String,
}

impl GraphParseError {
    pub fn new(message: impl Into<String>) -> Self {
        GraphParseError {
            message: message.into(),
        }
    }
}

/// Parsing seam: turns a fetched body into statements. Parsing linked-data
/// serializations is outside this crate; callers plug in their parser here.
pub trait GraphParser: Send + Sync {
    fn parse(
        &self,
        body: &str,
        base_url: &str,
        content_type: &str,
    ) -> Result<Vec<Statement>, GraphParseError>;
}

/// How a response content type is treated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentTypeRule {
    /// `Accept(true)` accepts the type as-is; `Accept(false)` rejects it.
    Accept(bool),
    /// Accept, but parse as the named canonical type.
    Alias(String),
}

/// Configuration recognized by the resource resolver.
#[derive(Debug, Clone)]
pub struct ResourceOptions {
    /// Ordered preference list for label extraction.
    pub label_predicates: Vec<String>,
    /// Ordered preference list for description extraction.
    pub description_predicates: Vec<String>,
    /// Response content types accepted, optionally aliased to a canonical
    /// type for parsing.
    pub accepted_content_types: BTreeMap<String, ContentTypeRule>,
    /// Secondary endpoint retried when the direct fetch fails; the target
    /// identifier is passed as its `uri` query parameter.
    pub fallback_endpoint: Option<String>,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        ResourceOptions {
            label_predicates: vocab::default_label_predicates(),
            description_predicates: vocab::default_description_predicates(),
            accepted_content_types: default_accepted_content_types(),
            fallback_endpoint: None,
        }
    }
}

/// The content types accepted out of the box.
pub fn default_accepted_content_types() -> BTreeMap<String, ContentTypeRule> {
    BTreeMap::from([
        ("text/turtle".to_string(), ContentTypeRule::Accept(true)),
        (
            "application/n-triples".to_string(),
            ContentTypeRule::Accept(true),
        ),
        (
            "application/rdf+xml".to_string(),
            ContentTypeRule::Accept(true),
        ),
        (
            "text/anot+turtle".to_string(),
            ContentTypeRule::Alias("text/turtle".to_string()),
        ),
    ])
}

type SharedResolution = Shared<BoxFuture<'static, Result<ResourceData, Arc<ResourceError>>>>;

/// Resolves resource identifiers into label/description annotation data.
///
/// Resolutions are deduplicated per identifier: concurrent or repeated
/// requests for the same identifier share one underlying fetch and one
/// result, failures included. Parsed statements accumulate in the shared
/// [`TripleStore`] for the resolver's lifetime.
pub struct ResourceResolver {
    fetcher: Arc<dyn ResourceFetcher>,
    parser: Arc<dyn GraphParser>,
    store: Arc<TripleStore>,
    options: ResourceOptions,
    resolutions: Mutex<HashMap<String, SharedResolution>>,
}

impl ResourceResolver {
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        parser: Arc<dyn GraphParser>,
        options: ResourceOptions,
    ) -> Self {
        Self::with_store(fetcher, parser, options, Arc::new(TripleStore::new()))
    }

    /// Construct with an externally owned store, e.g. one shared across
    /// resolvers or inspected by tests.
    pub fn with_store(
        fetcher: Arc<dyn ResourceFetcher>,
        parser: Arc<dyn GraphParser>,
        options: ResourceOptions,
        store: Arc<TripleStore>,
    ) -> Self {
        ResourceResolver {
            fetcher,
            parser,
            store,
            options,
            resolutions: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<TripleStore> {
        &self.store
    }

    /// Resolve `uri`, sharing the underlying fetch with any other request
    /// for the same identifier.
    pub async fn resolve(&self, uri: &str) -> Result<ResourceData, Arc<ResourceError>> {
        let resolution = {
            let mut resolutions = self
                .resolutions
                .lock()
                .expect("resolution map lock poisoned");
            match resolutions.get(uri) {
                Some(existing) => existing.clone(),
                None => {
                    let shared = resolve_uncached(
                        Arc::clone(&self.fetcher),
                        Arc::clone(&self.parser),
                        Arc::clone(&self.store),
                        self.options.clone(),
                        uri.to_string(),
                    )
                    .boxed()
                    .shared();
                    resolutions.insert(uri.to_string(), shared.clone());
                    shared
                }
            }
        };
        resolution.await
    }
}

async fn resolve_uncached(
    fetcher: Arc<dyn ResourceFetcher>,
    parser: Arc<dyn GraphParser>,
    store: Arc<TripleStore>,
    options: ResourceOptions,
    uri: String,
) -> Result<ResourceData, Arc<ResourceError>> {
    let accept = options
        .accepted_content_types
        .keys()
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    let fetched = match fetcher.fetch(&uri, &accept).await {
        Ok(fetched) => fetched,
        Err(direct) => {
            match fallback_fetch(fetcher.as_ref(), &options, &uri, &accept).await {
                Some(Ok(fetched)) => fetched,
                Some(Err(source)) => {
                    return Err(Arc::new(ResourceError::Fetch { url: uri, source }));
                }
                None => {
                    return Err(Arc::new(ResourceError::Fetch {
                        url: uri,
                        source: direct,
                    }));
                }
            }
        }
    };

    let content_type = fetched
        .content_type
        .unwrap_or_else(|| "text/turtle".to_string());
    let canonical = match options.accepted_content_types.get(&content_type) {
        Some(ContentTypeRule::Accept(true)) => content_type,
        Some(ContentTypeRule::Alias(alias)) => alias.clone(),
        _ => {
            return Err(Arc::new(ResourceError::UnknownContentType {
                url: uri,
                content_type,
            }));
        }
    };

    let statements = parser
        .parse(&fetched.body, &uri, &canonical)
        .map_err(|source| {
            Arc::new(ResourceError::Parse {
                url: uri.clone(),
                source,
            })
        })?;
    store.insert_all(statements);

    if !store.has_subject(&uri) {
        return Err(Arc::new(ResourceError::NoData { url: uri }));
    }

    let label = store.first_object_matching(&uri, &options.label_predicates);
    let description = store.first_object_matching(&uri, &options.description_predicates);

    Ok(ResourceData {
        uri,
        label,
        description,
    })
}

/// Retry through the configured fallback endpoint, if any.
async fn fallback_fetch(
    fetcher: &dyn ResourceFetcher,
    options: &ResourceOptions,
    uri: &str,
    accept: &str,
) -> Option<Result<FetchedResource, FetchError>> {
    let endpoint = options.fallback_endpoint.as_deref()?;
    let mut fallback_url = match Url::parse(endpoint) {
        Ok(url) => url,
        Err(error) => {
            tracing::warn!(endpoint, %error, "ignoring unparseable fallback endpoint");
            return None;
        }
    };
    fallback_url.query_pairs_mut().append_pair("uri", uri);
    tracing::debug!(%uri, %fallback_url, "retrying resource through fallback endpoint");
    Some(fetcher.fetch(fallback_url.as_str(), accept).await)
}
