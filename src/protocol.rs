//! IPC protocol types for daemon communication.

use crate::types::Item;
use serde::{Deserialize, Serialize};

/// Request sent from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Create a new item.
    Add { title: String, done: bool },

    /// Flip an item's done flag.
    Toggle { id: String },

    /// Remove an item.
    Remove { id: String },

    /// List all items, newest first.
    All,

    /// Search titles. An empty term lists everything.
    Find { term: String },

    /// Count stored items.
    Len,

    /// Shutdown the daemon.
    Shutdown,

    /// Ping to check if daemon is alive.
    Ping,
}

/// Response sent from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Id of a newly created item.
    Id { id: String },

    /// Single item response.
    Item { item: Item },

    /// Multiple items response.
    Items { items: Vec<Item> },

    /// Item count.
    Count { count: usize },

    /// Item not found.
    NotFound { id: String },

    /// Operation succeeded.
    Ok,

    /// Pong response to ping.
    Pong,

    /// Error response.
    Error { message: String },
}

impl Response {
    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
