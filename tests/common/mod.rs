//! Shared test infrastructure for todex integration tests.
//!
//! Provides TestEnv helper for consistent test setup.

#![allow(dead_code)]

use chrono::Utc;
use todex::{Item, Repository};

/// Test environment around a fresh repository.
pub struct TestEnv {
    pub repo: Repository,
}

impl TestEnv {
    /// Create a new test environment with an empty repository.
    pub fn new() -> Self {
        Self {
            repo: Repository::new().expect("Failed to open repository"),
        }
    }

    /// Add an open item and return its id.
    pub fn add(&self, title: &str) -> String {
        self.repo.add(title, false, Utc::now()).expect("Failed to add item")
    }

    /// Add an item that is already done.
    pub fn add_done(&self, title: &str) -> String {
        self.repo.add(title, true, Utc::now()).expect("Failed to add item")
    }

    /// Fetch the stored copy of an item.
    pub fn get(&self, id: &str) -> Option<Item> {
        self.repo
            .all()
            .expect("Failed to list items")
            .into_iter()
            .find(|item| item.id == id)
    }

    /// Ids of all items, newest first.
    pub fn all_ids(&self) -> Vec<String> {
        self.repo
            .all()
            .expect("Failed to list items")
            .into_iter()
            .map(|item| item.id)
            .collect()
    }

    /// Titles of the items matching `term`, in result order.
    pub fn find_titles(&self, term: &str) -> Vec<String> {
        self.repo
            .find(term)
            .expect("Failed to search items")
            .into_iter()
            .map(|item| item.title)
            .collect()
    }

    /// Assert that `term` finds the item with `id`.
    pub fn assert_found(&self, term: &str, id: &str) {
        let found = self.repo.find(term).expect("Failed to search items");
        assert!(
            found.iter().any(|i| i.id == id),
            "Expected '{}' to find item {}, got: {:?}",
            term,
            id,
            found.iter().map(|i| &i.id).collect::<Vec<_>>()
        );
    }

    /// Assert that `term` does NOT find the item with `id`.
    pub fn assert_not_found(&self, term: &str, id: &str) {
        let found = self.repo.find(term).expect("Failed to search items");
        assert!(
            !found.iter().any(|i| i.id == id),
            "Expected '{}' to NOT find item {}",
            term,
            id
        );
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
