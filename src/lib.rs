//! Context resolution and term expansion for linked-data annotation.
//!
//! `linked-context` resolves chains of JSON-LD-like context definitions
//! (inline, remote, or nested) into a single merged lookup structure, expands
//! short property/value tokens into canonical identifiers against a stack of
//! such contexts, and walks annotated document trees to attach resolved
//! resource data to their nodes.
//!
//! Remote fetching and statement parsing sit behind traits so the engine
//! stays testable offline; see [`loader::ContextFetcher`],
//! [`resource::ResourceFetcher`], and [`resource::GraphParser`].

pub mod loader;
pub mod resource;
pub mod terms;
pub mod types;
pub mod vocab;
pub mod walker;
