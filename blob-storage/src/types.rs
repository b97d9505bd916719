use std::time::{SystemTime, UNIX_EPOCH};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The metadata record persisted once per blob.
/// It is only ever written after every chunk of the matching write landed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    pub blob_id: String,
    /// Sum of all chunk payload lengths
    pub total_size: u64,
    /// Fixed at write time, every chunk but the last is exactly this long
    pub chunk_size: u64,
    /// Milliseconds since the unix epoch of the write that produced this record
    pub created_at: u64,
    /// Hex encoded SHA-256 of the whole object
    pub sha256: String,
    /// Hex encoded SHA-256 of every chunk, in sequence order
    pub chunk_sha256: Vec<String>,
}

impl BlobMetadata {
    pub fn new(blob_id: &str, data: &[u8], chunk_size: u64) -> Self {
        Self {
            blob_id: blob_id.to_string(),
            total_size: data.len() as u64,
            chunk_size,
            created_at: now_millis(),
            sha256: compute_hash(data),
            chunk_sha256: match chunk_size {
                0 => Vec::new(),
                _ => data.chunks(chunk_size as usize).map(compute_hash).collect(),
            },
        }
    }

    pub fn chunk_count(&self) -> u64 {
        chunk_count(self.total_size, self.chunk_size)
    }

    /// Length the chunk at `seq` must have for this record to be consistent.
    pub fn expected_chunk_len(&self, seq: u64) -> u64 {
        let start = seq * self.chunk_size;
        self.chunk_size.min(self.total_size.saturating_sub(start))
    }

    pub fn handle(&self) -> BlobHandle {
        BlobHandle {
            id: self.blob_id.clone(),
            total_size: self.total_size,
            chunk_size: self.chunk_size,
            chunk_count: self.chunk_count(),
        }
    }
}

/// Public description of a stored object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BlobHandle {
    pub id: String,
    pub total_size: u64,
    pub chunk_size: u64,
    pub chunk_count: u64,
}

/// Result of a single `read` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadOutcome {
    pub bytes: Vec<u8>,
    pub is_eof: bool,
}

pub fn chunk_count(total_size: u64, chunk_size: u64) -> u64 {
    if chunk_size == 0 {
        return 0;
    }
    total_size.div_ceil(chunk_size)
}

// A helper function to compute a SHA-256 hash of the data.
pub(crate) fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    result.iter().map(|byte| format!("{:02x}", byte)).collect()
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
