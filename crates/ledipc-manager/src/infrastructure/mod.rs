//! Infrastructure layer for the LED manager.
//!
//! Contains OS-facing adapters: the state stores backed by the file system
//! (or memory), TOML configuration loading, and log output setup.
//!
//! **Dependency rule**: this layer may depend on `ledipc_core`, but the
//! `application` layer only sees it through the [`state_store::StateStore`]
//! trait.

pub mod logging;
pub mod state_store;
pub mod storage;
