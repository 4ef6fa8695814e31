//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML configuration file and falls back
//! to built-in defaults when the file does not exist, so the binary works
//! with no configuration at all.

pub mod config;
