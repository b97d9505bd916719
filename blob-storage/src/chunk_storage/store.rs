use std::error::Error;
use async_trait::async_trait;
use crate::chunk_storage::local::LocalChunkStore;
use crate::chunk_storage::memory::MemoryChunkStore;
use crate::chunk_storage::rocks::RocksChunkStore;
use crate::types::BlobMetadata;


pub type ChunkResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Key-value backend holding chunks and metadata records.
/// Every call is expected to be atomic for its single key.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Stores a chunk, replacing any chunk already kept under `(blob_id, seq)`.
    async fn put_chunk(&self, blob_id: &str, seq: u64, data: &[u8]) -> ChunkResult<()>;

    /// Retrieves a chunk, `None` when nothing is stored under `(blob_id, seq)`.
    async fn get_chunk(&self, blob_id: &str, seq: u64) -> ChunkResult<Option<Vec<u8>>>;

    /// Removing a missing chunk is not an error.
    async fn delete_chunk(&self, blob_id: &str, seq: u64) -> ChunkResult<()>;

    /// Removes every chunk of `blob_id` whose sequence number is `from_seq` or above,
    /// including chunks no metadata record points at.
    async fn delete_chunks(&self, blob_id: &str, from_seq: u64) -> ChunkResult<()>;

    async fn put_metadata(&self, meta: &BlobMetadata) -> ChunkResult<()>;

    async fn get_metadata(&self, blob_id: &str) -> ChunkResult<Option<BlobMetadata>>;

    async fn delete_metadata(&self, blob_id: &str) -> ChunkResult<()>;

    async fn list_metadata(&self) -> ChunkResult<Vec<BlobMetadata>>;
}



#[derive(Debug, Clone)]
pub enum ChunkStores {
    Memory(MemoryChunkStore),
    Local(LocalChunkStore),
    Rocks(RocksChunkStore),
}

impl ChunkStores {
    /// Returns a reference to the inner value as a trait object.
    pub fn as_trait(&self) -> &dyn ChunkStore {
        match self {
            ChunkStores::Memory(a) => a,
            ChunkStores::Local(b) => b,
            ChunkStores::Rocks(c) => c,
        }
    }
}

#[async_trait]
impl ChunkStore for ChunkStores {
    async fn put_chunk(&self, blob_id: &str, seq: u64, data: &[u8]) -> ChunkResult<()> {
        self.as_trait().put_chunk(blob_id, seq, data).await
    }

    async fn get_chunk(&self, blob_id: &str, seq: u64) -> ChunkResult<Option<Vec<u8>>> {
        self.as_trait().get_chunk(blob_id, seq).await
    }

    async fn delete_chunk(&self, blob_id: &str, seq: u64) -> ChunkResult<()> {
        self.as_trait().delete_chunk(blob_id, seq).await
    }

    async fn delete_chunks(&self, blob_id: &str, from_seq: u64) -> ChunkResult<()> {
        self.as_trait().delete_chunks(blob_id, from_seq).await
    }

    async fn put_metadata(&self, meta: &BlobMetadata) -> ChunkResult<()> {
        self.as_trait().put_metadata(meta).await
    }

    async fn get_metadata(&self, blob_id: &str) -> ChunkResult<Option<BlobMetadata>> {
        self.as_trait().get_metadata(blob_id).await
    }

    async fn delete_metadata(&self, blob_id: &str) -> ChunkResult<()> {
        self.as_trait().delete_metadata(blob_id).await
    }

    async fn list_metadata(&self) -> ChunkResult<Vec<BlobMetadata>> {
        self.as_trait().list_metadata().await
    }
}
