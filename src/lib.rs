//! Todex: an in-memory task list with a full-text search index.
//!
//! A `Repository` keeps an ordered list of todo items and a search index over
//! their titles consistent with each other, behind a single lock that callers
//! can share between threads.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use todex::Repository;
//!
//! let repo = Repository::new().unwrap();
//!
//! let milk = repo.add("Buy milk", false, Utc::now()).unwrap();
//! repo.add("Wash car", false, Utc::now()).unwrap();
//!
//! // Newest first
//! let all = repo.all().unwrap();
//! assert_eq!(all[0].title, "Wash car");
//!
//! // Prefix or exact-term search
//! repo.toggle(&milk).unwrap();
//! let found = repo.find("bu").unwrap();
//! assert_eq!(found.len(), 1);
//! assert!(found[0].done);
//!
//! repo.close().unwrap();
//! ```

mod id;
mod index;
mod repository;
mod store;
mod types;

pub mod client;
pub mod daemon;
pub mod protocol;

// Re-export public API
pub use client::Client;
pub use daemon::{Daemon, DaemonConfig, default_root, is_daemon_running, start_daemon};
pub use index::{IndexError, MemoryIndex, SearchIndex};
pub use protocol::{Request, Response};
pub use repository::{Repository, RepositoryError};
pub use store::Store;
pub use types::{Item, Progress};
