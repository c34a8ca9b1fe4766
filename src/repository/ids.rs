//! Identifier allocation for stored entities

/// Monotonic identifier source for one table
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: i64,
}

impl IdAllocator {
    /// Start handing out identifiers at `seed` (clamped to at least 1)
    pub fn new(seed: i64) -> Self {
        Self { next: seed.max(1) }
    }

    /// Hand out the next identifier
    pub fn allocate(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Make sure future identifiers land above `existing`
    pub fn observe(&mut self, existing: i64) {
        if existing >= self.next {
            self.next = existing + 1;
        }
    }

    /// Identifier the next allocation will return
    pub fn peek(&self) -> i64 {
        self.next
    }
}
