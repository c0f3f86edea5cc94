// src/models/message.rs

//! Internal-message records.

use serde::{Deserialize, Serialize};

/// One row in the message thread listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub date: String,
    pub unread: bool,
    pub flagged: bool,
}

/// A fully opened message thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageThread {
    pub id: String,
    pub subject: String,
    pub messages: Vec<Message>,
}

/// A single message inside a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub date: String,
    pub body: String,
}

/// A message to be sent through the compose flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub subject: String,
    pub body: String,
    /// Portal person ids, added one postback at a time
    pub recipients: Vec<String>,
    /// Portal document ids, added one postback at a time
    pub attachments: Vec<String>,
}
