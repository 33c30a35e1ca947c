//! Session configuration.

use crate::error::{Result, SecurityError};
use serde::{Deserialize, Serialize};

/// Default upper bound on a single input buffer (1 MiB).
pub const DEFAULT_MAX_INPUT_LEN: usize = 1024 * 1024;

/// Default number of keys a session's store accepts.
pub const DEFAULT_MAX_KEYS: usize = 256;

/// Limits applied by a [`Session`](crate::Session).
///
/// Deserializes from partial documents; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Largest input accepted by any operation, in bytes
    pub max_input_len: usize,

    /// Largest number of keys held at once
    pub max_keys: usize,
}

impl SessionConfig {
    pub fn with_max_input_len(mut self, max_input_len: usize) -> Self {
        self.max_input_len = max_input_len;
        self
    }

    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys;
        self
    }

    /// Reject limits that would make every operation fail.
    pub fn validate(&self) -> Result<()> {
        if self.max_input_len == 0 {
            return Err(SecurityError::invalid_input("max_input_len must be non-zero"));
        }
        if self.max_keys == 0 {
            return Err(SecurityError::invalid_input("max_keys must be non-zero"));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_input_len: DEFAULT_MAX_INPUT_LEN,
            max_keys: DEFAULT_MAX_KEYS,
        }
    }
}
