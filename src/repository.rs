//! Concurrency-safe facade over the item store and its search index.

use crate::index::{MemoryIndex, SearchIndex};
use crate::store::Store;
use crate::types::Item;
use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use std::sync::{Mutex, MutexGuard};

/// Todos added by `seed_demo`, oldest first.
const DEMO_ITEMS: &[(&str, bool)] = &[
    ("Buy milk", false),
    ("Wash the car", false),
    ("Feed the cat", true),
    ("Buy more cat food", false),
];

/// Errors that can occur during repository operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Item not found.
    NotFound(String),
    /// The search index rejected a change for this item.
    Indexing { id: String },
    /// The repository has been closed.
    Closed,
    /// A thread panicked while holding the repository lock.
    LockPoisoned,
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::NotFound(id) => write!(f, "item not found: {}", id),
            RepositoryError::Indexing { id } => write!(f, "failed to update search index for item {}", id),
            RepositoryError::Closed => write!(f, "repository is closed"),
            RepositoryError::LockPoisoned => write!(f, "repository lock poisoned"),
        }
    }
}

impl std::error::Error for RepositoryError {}

struct Inner<I> {
    store: Store,
    index: I,
    closed: bool,
}

/// Items plus their search index behind one exclusive lock.
///
/// Every operation takes the lock for its whole duration, so all calls on one
/// repository are totally ordered. Share it between handlers as
/// `Arc<Repository>`.
pub struct Repository<I: SearchIndex = MemoryIndex> {
    inner: Mutex<Inner<I>>,
}

impl Repository {
    /// Create an empty repository with an in-memory FTS5 index.
    pub fn new() -> Result<Self> {
        let index = MemoryIndex::open().context("Failed to open search index")?;
        Ok(Self::with_index(index))
    }
}

impl<I: SearchIndex> Repository<I> {
    /// Create an empty repository over the given index.
    pub fn with_index(index: I) -> Self {
        Self {
            inner: Mutex::new(Inner {
                store: Store::new(),
                index,
                closed: false,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<I>>> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| eyre::eyre!(RepositoryError::LockPoisoned))?;
        if guard.closed {
            return Err(eyre::eyre!(RepositoryError::Closed));
        }
        Ok(guard)
    }

    /// Add a new item and index its title.
    ///
    /// If indexing fails the item is taken back out of the store, so the
    /// store and index never disagree. Its id is not reissued.
    pub fn add(&self, title: &str, done: bool, created: DateTime<Utc>) -> Result<String> {
        let mut inner = self.lock()?;

        let id = inner.store.add(title, done, created);
        if let Err(e) = inner.index.index(&id, title) {
            inner.store.pop_last(&id);
            return Err(e.wrap_err(RepositoryError::Indexing { id }));
        }

        log::debug!("Added item {}", id);
        Ok(id)
    }

    /// Flip the done flag. Fails with `NotFound` for unknown ids.
    pub fn toggle(&self, id: &str) -> Result<Item> {
        let mut inner = self.lock()?;
        let item = inner.store.toggle(id)?;
        log::debug!("Toggled item {} (done: {})", id, item.done);
        Ok(item)
    }

    /// Remove an item from index and store. No-op if the id is unknown.
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut inner = self.lock()?;

        if inner.store.find_index(id).is_none() {
            return Ok(());
        }

        inner
            .index
            .delete(id)
            .wrap_err_with(|| RepositoryError::Indexing { id: id.to_string() })?;
        inner.store.remove(id);

        log::debug!("Removed item {}", id);
        Ok(())
    }

    /// All items, newest first.
    pub fn all(&self) -> Result<Vec<Item>> {
        Ok(self.lock()?.store.all())
    }

    /// Items whose title has a token equal to or starting with `term`,
    /// in relevance order.
    ///
    /// Ids the index returns that are no longer in the store are skipped.
    pub fn find(&self, term: &str) -> Result<Vec<Item>> {
        let inner = self.lock()?;

        let ids = inner.index.search(term).context("Failed to search index")?;
        let items = ids
            .iter()
            .filter_map(|id| match inner.store.get(id) {
                Some(item) => Some(item.clone()),
                None => {
                    log::warn!("Search index returned unknown item {}", id);
                    None
                }
            })
            .collect();

        Ok(items)
    }

    /// `all()` for an empty term, `find(term)` otherwise.
    ///
    /// Only the exact empty string lists everything. A whitespace-only term
    /// goes to `find`, which matches nothing.
    pub fn fetch(&self, term: &str) -> Result<Vec<Item>> {
        if term.is_empty() {
            self.all().context("Failed to list items")
        } else {
            self.find(term).context("Failed to search items")
        }
    }

    /// Add the demo todos. Returns their ids in creation order.
    pub fn seed_demo(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        DEMO_ITEMS
            .iter()
            .map(|(title, done)| self.add(title, *done, now))
            .collect()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(inner) => inner.store.len(),
            Err(poisoned) => poisoned.into_inner().store.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release the search index. Every later call except `len` fails with
    /// `Closed`, including a second `close`.
    ///
    /// If the index fails to close the repository stays open and `close`
    /// can be retried.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.lock()?;
        inner.index.close().context("Failed to close search index")?;
        inner.closed = true;
        log::debug!("Repository closed with {} items", inner.store.len());
        Ok(())
    }
}
