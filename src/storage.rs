// SPDX-License-Identifier: MIT

//! Key-value storage seam for the two browser storage areas.
//!
//! The Token Store persists the credential set in a session-scoped area
//! and the Migration Runner consumes legacy records from a local area.
//! The embedding shell supplies real storage; `MemoryStorage` is the
//! in-crate implementation and the test double.

use parking_lot::RwLock;
use std::collections::HashMap;

/// A string-keyed storage area.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);
    /// Remove the value stored under `key`, if any.
    fn remove(&self, key: &str);
}

/// In-memory storage area.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }
}
