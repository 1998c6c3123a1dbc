use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

pub const DEFAULT_MAX_STRING_PARAM_LENGTH: usize = 100;
pub const DEFAULT_BATCH_SIZE: usize = 1;
pub const DEFAULT_AUTO_COMMIT: bool = true;

/// Immutable settings governing parameter validation and transaction behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    max_string_param_length: usize,
    batch_size: usize,
    auto_commit: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_string_param_length: DEFAULT_MAX_STRING_PARAM_LENGTH,
            batch_size: DEFAULT_BATCH_SIZE,
            auto_commit: DEFAULT_AUTO_COMMIT,
        }
    }
}

impl StorageConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidParameter` if either size is zero.
    pub fn new(max_string_param_length: usize, batch_size: usize, auto_commit: bool) -> Result<Self> {
        if max_string_param_length == 0 {
            return Err(StorageError::invalid_parameter(
                "Max string param length must be positive",
                "maxStringParamLength",
            ));
        }
        if batch_size == 0 {
            return Err(StorageError::invalid_parameter(
                "Batch size must be positive",
                "batchSize",
            ));
        }
        Ok(Self {
            max_string_param_length,
            batch_size,
            auto_commit,
        })
    }

    #[must_use]
    pub fn builder() -> StorageConfigBuilder {
        StorageConfigBuilder::default()
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidParameter` if the JSON is malformed or a size is zero.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: StorageConfig = serde_json::from_str(json).map_err(|e| {
            StorageError::invalid_parameter(format!("Invalid config: {e}"), "config")
        })?;
        Self::new(raw.max_string_param_length, raw.batch_size, raw.auto_commit)
    }

    #[must_use]
    pub fn max_string_param_length(&self) -> usize {
        self.max_string_param_length
    }

    /// Carried for callers that pick their own batch size; [`Storage::write`](crate::Storage::write)
    /// always executes immediately.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub fn auto_commit(&self) -> bool {
        self.auto_commit
    }
}

/// Fluent builder for [`StorageConfig`].
#[derive(Debug, Clone)]
pub struct StorageConfigBuilder {
    max_string_param_length: usize,
    batch_size: usize,
    auto_commit: bool,
}

impl Default for StorageConfigBuilder {
    fn default() -> Self {
        Self {
            max_string_param_length: DEFAULT_MAX_STRING_PARAM_LENGTH,
            batch_size: DEFAULT_BATCH_SIZE,
            auto_commit: DEFAULT_AUTO_COMMIT,
        }
    }
}

impl StorageConfigBuilder {
    #[must_use]
    pub fn max_string_param_length(mut self, max_string_param_length: usize) -> Self {
        self.max_string_param_length = max_string_param_length;
        self
    }

    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn auto_commit(mut self, auto_commit: bool) -> Self {
        self.auto_commit = auto_commit;
        self
    }

    /// Finish the builder.
    ///
    /// # Errors
    /// Returns `StorageError::InvalidParameter` if either size is zero.
    pub fn build(self) -> Result<StorageConfig> {
        StorageConfig::new(self.max_string_param_length, self.batch_size, self.auto_commit)
    }
}
