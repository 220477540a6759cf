// src/seen.rs
use std::collections::HashMap;

use crate::feed::types::StatusId;

/// Per-identity high-water mark of the last delivered status id.
/// - An identity with no recorded id treats any observation as new.
/// - `record` overwrites unconditionally; the relay gates it behind
///   `is_new`, which keeps the stored id strictly increasing.
/// - In-memory only. On restart the relay re-primes from live feed state.
///
/// Owned by whoever drives the poll cycle and passed in explicitly, so
/// tests start from a controlled state.
#[derive(Debug, Clone, Default)]
pub struct SeenState {
    last: HashMap<String, StatusId>,
}

impl SeenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff `candidate` is strictly greater than the stored id for
    /// `identity`, or nothing has been recorded yet.
    pub fn is_new(&self, identity: &str, candidate: &StatusId) -> bool {
        match self.last.get(identity) {
            None => true,
            Some(stored) => candidate > stored,
        }
    }

    pub fn record(&mut self, identity: &str, id: StatusId) {
        self.last.insert(identity.to_string(), id);
    }

    pub fn last(&self, identity: &str) -> Option<&StatusId> {
        self.last.get(identity)
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }
}
