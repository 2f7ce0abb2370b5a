pub mod augment;
pub mod tree;

pub use augment::{AugmentOptions, Augmenter};
pub use tree::{AnnotationState, Marker, NodeRef};
