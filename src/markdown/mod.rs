//! Markdown structure model and nested-path addressing.
//!
//! Everything in here is pure: text goes in, elements, trees and target
//! strings come out. Nothing performs I/O or logs.

pub mod classifier;
pub mod element;
pub mod error;
pub mod headings;
pub mod resolver;
pub mod select;
pub mod structure;
pub mod target;
pub mod tree;

pub use classifier::classify;
pub use element::{Element, ElementKind};
pub use error::TargetError;
pub use resolver::ResolveMode;
pub use tree::{Forest, Node};

/// Classify `text` and build its heading tree.
pub fn parse(text: &str) -> Forest {
    Forest::build(&classify(text))
}
