//! In-memory storage scope for tests and ephemeral use

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::StorageScope;
use crate::error::Result;

#[derive(Default)]
pub struct MemoryScope {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous seeding helper for test setup.
    pub fn insert(&self, key: &str, value: Value) {
        self.values.lock().insert(key.to_string(), value);
    }
}

#[async_trait]
impl StorageScope for MemoryScope {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }
}
