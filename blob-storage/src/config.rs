use serde::{Deserialize, Serialize};
use crate::errors::{BlobStoreError, Result};

/// Chunk size used when the caller does not pick one.
pub const DEFAULT_CHUNK_SIZE: u64 = 358_400;

/// Largest chunk a backend is asked to hold in a single value.
pub const DEFAULT_MAX_CHUNK_SIZE: u64 = 16 * 1024 * 1024;

/// Buffer size `read_to_end` drains a handle with.
pub const DEFAULT_READ_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub default_chunk_size: u64,
    pub max_chunk_size: u64,
    pub read_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            read_size: DEFAULT_READ_SIZE,
        }
    }
}

impl StoreConfig {
    pub fn validate(self) -> Result<Self> {
        if self.max_chunk_size == 0 {
            return Err(BlobStoreError::InvalidArgument("max_chunk_size must be positive".to_string()));
        }
        if self.default_chunk_size == 0 || self.default_chunk_size > self.max_chunk_size {
            return Err(BlobStoreError::InvalidArgument(format!(
                "default_chunk_size must be within 1..={}, got {}",
                self.max_chunk_size, self.default_chunk_size
            )));
        }
        if self.read_size == 0 {
            return Err(BlobStoreError::InvalidArgument("read_size must be positive".to_string()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = StoreConfig::default().validate().unwrap();
        assert_eq!(config.default_chunk_size, 358_400);
    }

    #[test]
    fn test_default_chunk_above_ceiling_is_rejected() {
        let config = StoreConfig {
            default_chunk_size: 1024,
            max_chunk_size: 512,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BlobStoreError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_read_size_is_rejected() {
        let config = StoreConfig { read_size: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
