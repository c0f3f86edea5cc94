// src/models/book.rs

//! Book loan records.

use serde::{Deserialize, Serialize};

/// A borrowed book as listed on the reservations page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub team: Option<String>,
    pub loaned: Option<String>,
    pub due: Option<String>,
}
