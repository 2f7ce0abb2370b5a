pub mod context;
pub mod stack;

pub use context::{
    ContextDefinition, ContextDocument, ContextSpec, ResolvedTerm, TermDefinition, TermValue,
};
pub use stack::ContextStack;
