//! Full-text index over item titles.
//!
//! # Responsibility
//! - Map item ids to their titles in an SQLite FTS5 table held in memory.
//! - Answer the union of a prefix query and an exact-term query.
//!
//! # Invariants
//! - At most one row per id.
//! - Hits are ordered by `bm25`, then most recently indexed first.
//! - A term with no word characters matches nothing.

use eyre::{Context, Result};
use rusqlite::{Connection, params};

/// FTS5 table. `'` and `_` count as word characters so "don't" and
/// "user_id" stay single tokens.
const SCHEMA: &str = r#"
    CREATE VIRTUAL TABLE items_fts USING fts5(
        id UNINDEXED,
        title,
        tokenize = "unicode61 tokenchars '''_'"
    );
"#;

/// Errors raised by an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The index has been closed.
    Closed,
    /// Documents must have a non-empty id.
    EmptyId,
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexError::Closed => write!(f, "search index is closed"),
            IndexError::EmptyId => write!(f, "document id cannot be empty"),
        }
    }
}

impl std::error::Error for IndexError {}

/// Text index keyed by item id.
pub trait SearchIndex: Send {
    /// Insert or replace the document for `id`.
    fn index(&mut self, id: &str, title: &str) -> Result<()>;

    /// Remove the document for `id`. No-op if absent.
    fn delete(&mut self, id: &str) -> Result<()>;

    /// Ids whose title has a token equal to, or starting with, `term`.
    /// Ordered by relevance.
    fn search(&self, term: &str) -> Result<Vec<String>>;

    /// Number of indexed documents.
    fn doc_count(&self) -> Result<usize>;

    /// Release the index. Every later call fails.
    fn close(&mut self) -> Result<()>;
}

/// FTS5 index on an in-memory SQLite connection.
pub struct MemoryIndex {
    db: Option<Connection>,
}

impl MemoryIndex {
    /// Open an empty index.
    pub fn open() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        db.execute_batch(SCHEMA).context("Failed to create FTS5 table")?;
        Ok(Self { db: Some(db) })
    }

    fn conn(&self) -> Result<&Connection> {
        self.db.as_ref().ok_or_else(|| eyre::eyre!(IndexError::Closed))
    }
}

/// `"term"* OR "term"`, or `None` when the term has nothing to match on.
fn build_match_expression(term: &str) -> Option<String> {
    let term = term.trim();
    if !term.chars().any(char::is_alphanumeric) {
        return None;
    }

    let quoted = format!("\"{}\"", term.replace('"', "\"\""));
    Some(format!("{quoted}* OR {quoted}"))
}

impl SearchIndex for MemoryIndex {
    fn index(&mut self, id: &str, title: &str) -> Result<()> {
        if id.is_empty() {
            return Err(eyre::eyre!(IndexError::EmptyId));
        }

        let db = self.conn()?;
        db.execute("DELETE FROM items_fts WHERE id = ?1", params![id])
            .context("Failed to replace indexed item")?;
        db.execute("INSERT INTO items_fts (id, title) VALUES (?1, ?2)", params![id, title])
            .context("Failed to index item")?;
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        self.conn()?
            .execute("DELETE FROM items_fts WHERE id = ?1", params![id])
            .context("Failed to delete indexed item")?;
        Ok(())
    }

    fn search(&self, term: &str) -> Result<Vec<String>> {
        let db = self.conn()?;
        let Some(match_expr) = build_match_expression(term) else {
            return Ok(Vec::new());
        };

        let mut stmt = db.prepare(
            "SELECT id FROM items_fts
             WHERE items_fts MATCH ?1
             ORDER BY bm25(items_fts), rowid DESC",
        )?;
        let ids = stmt
            .query_map(params![match_expr], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("Failed to search for '{}'", term))?;

        Ok(ids)
    }

    fn doc_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT count(*) FROM items_fts", [], |row| row.get(0))
            .context("Failed to count indexed items")?;
        Ok(count as usize)
    }

    fn close(&mut self) -> Result<()> {
        let db = self.db.take().ok_or_else(|| eyre::eyre!(IndexError::Closed))?;
        if let Err((db, e)) = db.close() {
            self.db = Some(db);
            return Err(e).context("Failed to close SQLite connection");
        }
        log::debug!("Search index closed");
        Ok(())
    }
}
