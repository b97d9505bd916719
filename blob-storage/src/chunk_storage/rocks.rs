use std::path::Path;
use std::sync::Arc;
use async_trait::async_trait;
use byteorder::{BigEndian, WriteBytesExt};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, DB};
use crate::chunk_storage::store::{ChunkResult, ChunkStore};
use crate::types::BlobMetadata;

const CHUNKS_CF: &str = "chunks";
const METADATA_CF: &str = "metadata";

/// A `ChunkStore` backed by RocksDB.
/// Chunks and metadata records live in separate column families.
#[derive(Debug, Clone)]
pub struct RocksChunkStore {
    db: Arc<DB>,
}

/// Builds the key of a chunk: the id bytes, a NUL separator, then the sequence
/// number in big-endian so the chunks of one blob sort in order.
fn chunk_key(blob_id: &str, seq: u64) -> ChunkResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(blob_id.len() + 9);
    buf.extend_from_slice(blob_id.as_bytes());
    buf.push(0);
    buf.write_u64::<BigEndian>(seq)?;
    Ok(buf)
}

impl RocksChunkStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> ChunkResult<Self> {
        let mut db_opts = Options::default();
        db_opts.create_missing_column_families(true);
        db_opts.create_if_missing(true);

        let chunks = ColumnFamilyDescriptor::new(CHUNKS_CF, Options::default());
        let metadata = ColumnFamilyDescriptor::new(METADATA_CF, Options::default());

        let db = DB::open_cf_descriptors(&db_opts, db_path, vec![chunks, metadata])?;
        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> ChunkResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| format!("column family {} is missing", name).into())
    }
}

#[async_trait]
impl ChunkStore for RocksChunkStore {
    async fn put_chunk(&self, blob_id: &str, seq: u64, data: &[u8]) -> ChunkResult<()> {
        self.db.put_cf(self.cf(CHUNKS_CF)?, chunk_key(blob_id, seq)?, data)?;
        Ok(())
    }

    async fn get_chunk(&self, blob_id: &str, seq: u64) -> ChunkResult<Option<Vec<u8>>> {
        Ok(self.db.get_cf(self.cf(CHUNKS_CF)?, chunk_key(blob_id, seq)?)?)
    }

    async fn delete_chunk(&self, blob_id: &str, seq: u64) -> ChunkResult<()> {
        self.db.delete_cf(self.cf(CHUNKS_CF)?, chunk_key(blob_id, seq)?)?;
        Ok(())
    }

    async fn delete_chunks(&self, blob_id: &str, from_seq: u64) -> ChunkResult<()> {
        // ids never contain NUL, so `id ++ 0x01` sorts right after the last chunk key of `id`
        let mut end = blob_id.as_bytes().to_vec();
        end.push(1);
        self.db.delete_range_cf(self.cf(CHUNKS_CF)?, chunk_key(blob_id, from_seq)?, end)?;
        Ok(())
    }

    async fn put_metadata(&self, meta: &BlobMetadata) -> ChunkResult<()> {
        self.db.put_cf(self.cf(METADATA_CF)?, meta.blob_id.as_bytes(), serde_json::to_vec(meta)?)?;
        self.db.flush_wal(true)?;
        Ok(())
    }

    async fn get_metadata(&self, blob_id: &str) -> ChunkResult<Option<BlobMetadata>> {
        match self.db.get_cf(self.cf(METADATA_CF)?, blob_id.as_bytes())? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    async fn delete_metadata(&self, blob_id: &str) -> ChunkResult<()> {
        self.db.delete_cf(self.cf(METADATA_CF)?, blob_id.as_bytes())?;
        self.db.flush_wal(true)?;
        Ok(())
    }

    async fn list_metadata(&self) -> ChunkResult<Vec<BlobMetadata>> {
        let mut all = Vec::new();
        for item in self.db.iterator_cf(self.cf(METADATA_CF)?, IteratorMode::Start) {
            let (_key, raw) = item?;
            all.push(serde_json::from_slice::<BlobMetadata>(&raw)?);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_chunk_keys_sort_by_sequence() {
        let low = chunk_key("blob", 2).unwrap();
        let high = chunk_key("blob", 256).unwrap();
        assert!(low < high);
        assert_eq!(low.len(), "blob".len() + 9);
    }

    #[tokio::test]
    async fn test_rocks_chunk_store() {
        let temp_dir = tempdir().unwrap();
        let store = RocksChunkStore::open(temp_dir.path()).unwrap();

        store.put_chunk("blob", 0, b"data one").await.unwrap();
        store.put_chunk("blob", 0, b"data two").await.unwrap();
        assert_eq!(store.get_chunk("blob", 0).await.unwrap(), Some(b"data two".to_vec()));

        store.delete_chunk("blob", 0).await.unwrap();
        assert_eq!(store.get_chunk("blob", 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rocks_delete_chunks_from_sequence() {
        let temp_dir = tempdir().unwrap();
        let store = RocksChunkStore::open(temp_dir.path()).unwrap();

        for seq in [0u64, 1, 2, 255, 256] {
            store.put_chunk("blob", seq, b"x").await.unwrap();
        }
        store.put_chunk("blob2", 0, b"y").await.unwrap();

        store.delete_chunks("blob", 2).await.unwrap();
        assert_eq!(store.get_chunk("blob", 1).await.unwrap(), Some(b"x".to_vec()));
        assert_eq!(store.get_chunk("blob", 2).await.unwrap(), None);
        assert_eq!(store.get_chunk("blob", 256).await.unwrap(), None);
        assert_eq!(store.get_chunk("blob2", 0).await.unwrap(), Some(b"y".to_vec()));
    }

    #[tokio::test]
    async fn test_rocks_metadata_survives_reopen() {
        let temp_dir = tempdir().unwrap();
        let meta = BlobMetadata::new("doc-1.bin", b"payload", 4);
        {
            let store = RocksChunkStore::open(temp_dir.path()).unwrap();
            store.put_metadata(&meta).await.unwrap();
            store.put_metadata(&BlobMetadata::new("doc-0.bin", b"", 4)).await.unwrap();
        }

        let store = RocksChunkStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.get_metadata("doc-1.bin").await.unwrap(), Some(meta));

        let ids: Vec<String> = store.list_metadata().await.unwrap().into_iter().map(|m| m.blob_id).collect();
        assert_eq!(ids, vec!["doc-0.bin".to_string(), "doc-1.bin".to_string()]);

        store.delete_metadata("doc-0.bin").await.unwrap();
        assert_eq!(store.get_metadata("doc-0.bin").await.unwrap(), None);
    }
}
