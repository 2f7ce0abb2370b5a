pub mod resolver;
pub mod store;

pub use resolver::{
    ContentTypeRule, FetchedResource, GraphParseError, GraphParser, HttpResourceFetcher,
    ResourceData, ResourceError, ResourceFetcher, ResourceOptions, ResourceResolver,
};
pub use store::{Statement, TripleStore};
