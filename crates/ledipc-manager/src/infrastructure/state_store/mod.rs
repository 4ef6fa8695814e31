//! Where LED states live.
//!
//! The router never touches files directly; it talks to a [`StateStore`].
//! Two implementations exist:
//!
//! - **`file`** – [`FileStateStore`], one `brightness` file per LED in a
//!   sysfs-like tree (`<root>/led_<name>/brightness`).
//! - **`memory`** – [`MemoryStateStore`], a map guarded by a mutex, for tests
//!   and throwaway servers.
//!
//! Implementations are shared by every connection worker at once, hence the
//! `Send + Sync` bound.  A store must make concurrent writes to the same LED
//! safe: the last complete write wins and a reader never sees half a value.

use std::path::PathBuf;

use ledipc_core::LedState;
use thiserror::Error;

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;

/// Errors a state store can report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No state has ever been written for this LED.
    #[error("LED {target} not found")]
    NotFound { target: String },

    /// The LED name cannot be mapped to storage (empty, or contains a path
    /// separator, `.`/`..`, or NUL).
    #[error("invalid LED name '{target}'")]
    InvalidTarget { target: String },

    /// The stored value is neither on nor off.
    #[error("LED {target} holds an unreadable value {value:?}")]
    Corrupt { target: String, value: String },

    /// A file-system operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Storage for on/off LED states, keyed by LED name.
#[cfg_attr(test, mockall::automock)]
pub trait StateStore: Send + Sync {
    /// Persists `state` for `target`, creating the LED if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTarget`] for unusable names and
    /// [`StoreError::Io`] when the backing storage fails.
    fn write_state(&self, target: &str, state: LedState) -> Result<(), StoreError>;

    /// Reads the last state written for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an LED that was never written.
    fn read_state(&self, target: &str) -> Result<LedState, StoreError>;
}
