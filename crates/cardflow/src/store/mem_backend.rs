use super::backend::StateBackend;
use crate::error::{CardError, Result};
use std::cell::RefCell;
use std::collections::HashMap;

/// In-memory state backend for testing.
///
/// Uses `RefCell` for interior mutability since the engine is single-threaded.
/// This keeps `StateBackend` on `&self` without paying for a lock.
#[derive(Default)]
pub struct MemStateBackend {
    values: RefCell<HashMap<String, String>>,
    simulate_write_error: RefCell<bool>,
}

impl MemStateBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing any schema. Useful for legacy/malformed data tests.
    pub fn with_raw(self, key: &str, value: &str) -> Self {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }
}

impl StateBackend for MemStateBackend {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(CardError::Store("Simulated write error".to_string()));
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(CardError::Store("Simulated write error".to_string()));
        }
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}
