// src/scrape/mod.rs

//! Extractors: one pure function per data domain.
//!
//! Every extractor locates a structural anchor (an id or class unique to
//! its page) and returns `None` when the anchor is missing: the signal
//! for "not authenticated or page shape changed", as opposed to "section
//! empty". Malformed rows are dropped individually and never abort a
//! whole extraction.

pub mod absence;
pub mod books;
pub mod documents;
pub mod grades;
pub mod messages;
pub mod modules;
pub mod rooms;
pub mod roster;
pub mod schedule;
pub mod sentinel;

pub use sentinel::{FetchStatus, classify};
