//! ID generation for todo items.

/// Monotonic id source.
/// Format: lower-case hex of a counter starting at 1 ("1", ..., "9", "a", ...).
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counter and render the new value.
    pub fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("{:x}", self.counter)
    }
}
