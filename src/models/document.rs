// src/models/document.rs

//! Document and folder records.

use serde::{Deserialize, Serialize};

/// A folder listing: subfolders plus the documents directly inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub subfolders: Vec<Folder>,
    pub documents: Vec<Document>,
}

/// A document row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub size: Option<String>,
    pub modified: Option<String>,
    pub author: Option<String>,
}
