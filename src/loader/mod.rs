pub mod fetch;
pub mod resolve;

pub use fetch::{ContextFetcher, FetchError, HttpContextFetcher};
pub use resolve::{ContextError, ContextLoader, ReferenceChain, ResolutionCache};
