use std::sync::Arc;
use async_trait::async_trait;
use dashmap::DashMap;
use crate::chunk_storage::store::{ChunkResult, ChunkStore};
use crate::types::BlobMetadata;

/// A `ChunkStore` that keeps everything in process memory.
/// Clones share the same maps.
#[derive(Clone, Debug, Default)]
pub struct MemoryChunkStore {
    chunks: Arc<DashMap<(String, u64), Vec<u8>>>,
    metadata: Arc<DashMap<String, BlobMetadata>>,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks currently held for `blob_id`, whatever their sequence numbers.
    pub fn chunks_held(&self, blob_id: &str) -> usize {
        self.chunks.iter().filter(|entry| entry.key().0 == blob_id).count()
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn put_chunk(&self, blob_id: &str, seq: u64, data: &[u8]) -> ChunkResult<()> {
        self.chunks.insert((blob_id.to_string(), seq), data.to_vec());
        Ok(())
    }

    async fn get_chunk(&self, blob_id: &str, seq: u64) -> ChunkResult<Option<Vec<u8>>> {
        Ok(self
            .chunks
            .get(&(blob_id.to_string(), seq))
            .map(|chunk| chunk.value().clone()))
    }

    async fn delete_chunk(&self, blob_id: &str, seq: u64) -> ChunkResult<()> {
        self.chunks.remove(&(blob_id.to_string(), seq));
        Ok(())
    }

    async fn delete_chunks(&self, blob_id: &str, from_seq: u64) -> ChunkResult<()> {
        self.chunks.retain(|(id, seq), _| !(id == blob_id && *seq >= from_seq));
        Ok(())
    }

    async fn put_metadata(&self, meta: &BlobMetadata) -> ChunkResult<()> {
        self.metadata.insert(meta.blob_id.clone(), meta.clone());
        Ok(())
    }

    async fn get_metadata(&self, blob_id: &str) -> ChunkResult<Option<BlobMetadata>> {
        Ok(self.metadata.get(blob_id).map(|meta| meta.value().clone()))
    }

    async fn delete_metadata(&self, blob_id: &str) -> ChunkResult<()> {
        self.metadata.remove(blob_id);
        Ok(())
    }

    async fn list_metadata(&self) -> ChunkResult<Vec<BlobMetadata>> {
        let mut all: Vec<BlobMetadata> = self.metadata.iter().map(|meta| meta.value().clone()).collect();
        all.sort_by(|a, b| a.blob_id.cmp(&b.blob_id));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_chunk_store() {
        let store = MemoryChunkStore::new();

        store.put_chunk("blob", 0, b"first").await.unwrap();
        store.put_chunk("blob", 0, b"second").await.unwrap();
        store.put_chunk("blob", 1, b"tail").await.unwrap();

        assert_eq!(store.get_chunk("blob", 0).await.unwrap(), Some(b"second".to_vec()));
        assert_eq!(store.chunks_held("blob"), 2);

        store.delete_chunk("blob", 1).await.unwrap();
        store.delete_chunk("blob", 7).await.unwrap();
        assert_eq!(store.get_chunk("blob", 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_delete_chunks_from_sequence() {
        let store = MemoryChunkStore::new();
        for seq in 0..5 {
            store.put_chunk("blob", seq, b"x").await.unwrap();
        }
        store.put_chunk("other", 4, b"y").await.unwrap();

        store.delete_chunks("blob", 2).await.unwrap();
        assert_eq!(store.chunks_held("blob"), 2);
        assert_eq!(store.chunks_held("other"), 1);

        store.delete_chunks("blob", 0).await.unwrap();
        assert_eq!(store.chunks_held("blob"), 0);
    }

    #[tokio::test]
    async fn test_memory_metadata_listing_is_sorted() {
        let store = MemoryChunkStore::new();
        store.put_metadata(&BlobMetadata::new("b", b"xy", 1)).await.unwrap();
        store.put_metadata(&BlobMetadata::new("a", b"z", 1)).await.unwrap();

        let ids: Vec<String> = store.list_metadata().await.unwrap().into_iter().map(|m| m.blob_id).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);

        store.delete_metadata("a").await.unwrap();
        assert!(store.get_metadata("a").await.unwrap().is_none());
    }
}
