//! File-backed LED state, laid out like Linux sysfs LED class devices.
//!
//! ```text
//! <root>/
//!   led_1/brightness     "1\n"  (on)
//!   led_2/brightness     "0\n"  (off)
//! ```
//!
//! Writes go to a uniquely named temporary file in the LED's directory and are
//! then renamed over `brightness`.  A rename within one directory is atomic,
//! so two workers updating the same LED at once leave exactly one of the two
//! values behind and a concurrent reader sees either the old or the new value.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ledipc_core::LedState;
use tracing::debug;
use uuid::Uuid;

use super::{StateStore, StoreError};

/// Directory used when nothing else is configured.
pub const DEFAULT_STORE_ROOT: &str = "/tmp/sys/class";

const BRIGHTNESS_FILE: &str = "brightness";

/// Stores each LED as `<root>/led_<name>/brightness`.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    root: PathBuf,
}

impl FileStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the state of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTarget`] when `target` could escape the
    /// store root or is empty.
    pub fn led_dir(&self, target: &str) -> Result<PathBuf, StoreError> {
        validate_target(target)?;
        Ok(self.root.join(format!("led_{target}")))
    }

    pub fn brightness_path(&self, target: &str) -> Result<PathBuf, StoreError> {
        Ok(self.led_dir(target)?.join(BRIGHTNESS_FILE))
    }
}

impl Default for FileStateStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_ROOT)
    }
}

impl StateStore for FileStateStore {
    fn write_state(&self, target: &str, state: LedState) -> Result<(), StoreError> {
        let dir = self.led_dir(target)?;
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let final_path = dir.join(BRIGHTNESS_FILE);
        let temp_path = dir.join(format!(".{BRIGHTNESS_FILE}.{}.tmp", Uuid::new_v4()));
        fs::write(&temp_path, encode_brightness(state)).map_err(|source| StoreError::Io {
            path: temp_path.clone(),
            source,
        })?;

        if let Err(source) = fs::rename(&temp_path, &final_path) {
            // Do not leave the temporary file behind.
            let _ = fs::remove_file(&temp_path);
            return Err(StoreError::Io {
                path: final_path,
                source,
            });
        }

        debug!(target_led = target, state = %state, path = %final_path.display(), "state written");
        Ok(())
    }

    fn read_state(&self, target: &str) -> Result<LedState, StoreError> {
        let path = self.brightness_path(target)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    target: target.to_string(),
                });
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        decode_brightness(&content).ok_or_else(|| StoreError::Corrupt {
            target: target.to_string(),
            value: content.trim_end().to_string(),
        })
    }
}

fn encode_brightness(state: LedState) -> &'static str {
    match state {
        LedState::On => "1\n",
        LedState::Off => "0\n",
    }
}

fn decode_brightness(content: &str) -> Option<LedState> {
    match content.trim_end() {
        "1" => Some(LedState::On),
        "0" => Some(LedState::Off),
        _ => None,
    }
}

/// Rejects names that could step outside the store root.
fn validate_target(target: &str) -> Result<(), StoreError> {
    let unusable = target.is_empty()
        || target == "."
        || target == ".."
        || target.contains(&['/', '\\', '\0'][..]);
    if unusable {
        return Err(StoreError::InvalidTarget {
            target: target.to_string(),
        });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
