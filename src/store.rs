//! Ordered, id-addressable holder of todo items.

use crate::id::IdGenerator;
use crate::repository::RepositoryError;
use crate::types::Item;
use chrono::{DateTime, Utc};
use eyre::Result;

/// Items in insertion order plus the id counter.
///
/// Lookups are a linear scan. That is fine for a task list; a larger store
/// would pair the vector with an id-to-position map kept under the same lock.
#[derive(Debug)]
pub struct Store {
    ids: IdGenerator,
    items: Vec<Item>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            ids: IdGenerator::new(),
            items: Vec::new(),
        }
    }

    /// Append a new item and return its id.
    pub fn add(&mut self, title: &str, done: bool, created: DateTime<Utc>) -> String {
        let id = self.ids.next_id();
        self.items.push(Item::new(id.clone(), title, done, created));
        id
    }

    /// Position of the item with `id`, if present.
    pub fn find_index(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Borrow the item with `id`.
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.find_index(id).map(|i| &self.items[i])
    }

    /// Flip `done` and return the updated item.
    pub fn toggle(&mut self, id: &str) -> Result<Item> {
        let i = self
            .find_index(id)
            .ok_or_else(|| eyre::eyre!(RepositoryError::NotFound(id.to_string())))?;
        let item = &mut self.items[i];
        item.done = !item.done;
        Ok(item.clone())
    }

    /// Remove the item, keeping the others in order. `None` if absent.
    pub fn remove(&mut self, id: &str) -> Option<Item> {
        self.find_index(id).map(|i| self.items.remove(i))
    }

    /// Undo the most recent `add`, provided it produced `id`.
    /// The id counter is not rewound, so the id stays burnt.
    pub(crate) fn pop_last(&mut self, id: &str) -> Option<Item> {
        if self.items.last().is_some_and(|item| item.id == id) {
            self.items.pop()
        } else {
            None
        }
    }

    /// Owned snapshot, newest first.
    pub fn all(&self) -> Vec<Item> {
        self.items.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
