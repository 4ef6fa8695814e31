//! In-memory LED state, lost when the process exits.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use ledipc_core::LedState;

use super::{StateStore, StoreError};

/// A [`StateStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    states: Mutex<HashMap<String, LedState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of LEDs that have been written at least once.
    pub fn len(&self) -> usize {
        self.states.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateStore for MemoryStateStore {
    fn write_state(&self, target: &str, state: LedState) -> Result<(), StoreError> {
        if target.is_empty() {
            return Err(StoreError::InvalidTarget {
                target: String::new(),
            });
        }
        // A panic in another worker cannot leave a half-written LedState.
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        states.insert(target.to_string(), state);
        Ok(())
    }

    fn read_state(&self, target: &str) -> Result<LedState, StoreError> {
        let states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        states.get(target).copied().ok_or_else(|| StoreError::NotFound {
            target: target.to_string(),
        })
    }
}
