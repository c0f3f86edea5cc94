// src/dom/mod.rs

//! Markup normalization and the tree-access facade.
//!
//! The actual HTML parser (`scraper`) is an external collaborator; the
//! rest of the crate only sees the limited query surface in [`tree`].
//! Raw portal bodies must pass through [`normalize`] before parsing.

mod normalize;
mod tree;

pub use normalize::normalize;
pub use tree::{Dom, Node};
