//! Core data types for the todo repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single todo entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Hex counter assigned on creation, never reused
    pub id: String,

    /// What needs doing
    pub title: String,

    /// Whether it has been done
    pub done: bool,

    /// When created (supplied by the caller)
    pub created: DateTime<Utc>,
}

impl Item {
    /// Create an item. Only the store hands out ids.
    pub(crate) fn new(id: String, title: &str, done: bool, created: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.to_string(),
            done,
            created,
        }
    }
}

/// Completion summary over a list of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub total: usize,
    pub done: usize,
}

impl Progress {
    /// Count done items in a slice.
    pub fn of(items: &[Item]) -> Self {
        Self {
            total: items.len(),
            done: items.iter().filter(|i| i.done).count(),
        }
    }

    /// Whole percent done, truncated. Zero for an empty list.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.done * 100 / self.total) as u8
    }
}
