use std::sync::Arc;
use crate::chunk_storage::store::ChunkStore;
use crate::config::StoreConfig;
use crate::errors::{BlobStoreError, Result};
use crate::handle::{Handle, ReadHandle, WriteHandle};
use crate::types::{compute_hash, BlobHandle, BlobMetadata, ReadOutcome};

const MAX_ID_LEN: usize = 1024;

fn validate_id(blob_id: &str) -> Result<()> {
    if blob_id.is_empty() {
        return Err(BlobStoreError::InvalidArgument("blob id must not be empty".to_string()));
    }
    if blob_id.len() > MAX_ID_LEN {
        return Err(BlobStoreError::InvalidArgument(format!(
            "blob id is {} bytes, at most {} allowed",
            blob_id.len(),
            MAX_ID_LEN
        )));
    }
    if blob_id.contains('\0') {
        return Err(BlobStoreError::InvalidArgument("blob id must not contain NUL".to_string()));
    }
    Ok(())
}

/// Stores arbitrarily large objects as fixed-size chunks plus one metadata record.
///
/// Writes are whole-object overwrites: every chunk is put first and the metadata
/// record is upserted last, so a failed write never publishes a new size. A write
/// that fails halfway can still leave chunks of the new version under the old
/// record. The record carries a digest per chunk and every chunk is checked before
/// any of its bytes are handed out, so reads fail with
/// [`BlobStoreError::CorruptedBlob`] instead.
pub struct ChunkedBlobStore<S> {
    chunk_store: Arc<S>,
    config: StoreConfig,
}

impl<S> Clone for ChunkedBlobStore<S> {
    fn clone(&self) -> Self {
        Self {
            chunk_store: self.chunk_store.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: ChunkStore> ChunkedBlobStore<S> {
    pub fn new(chunk_store: S, config: StoreConfig) -> Self {
        Self {
            chunk_store: Arc::new(chunk_store),
            config,
        }
    }

    pub fn chunk_store(&self) -> &S {
        &self.chunk_store
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Opens a cursor at the start of `blob_id`. Costs one metadata fetch.
    pub async fn open_for_read(&self, blob_id: &str) -> Result<ReadHandle> {
        validate_id(blob_id)?;
        let meta = self.fetch_metadata(blob_id).await?;
        if meta.chunk_size == 0 && meta.total_size > 0 {
            return Err(BlobStoreError::corrupted(blob_id, "metadata records a zero chunk size"));
        }
        if meta.chunk_sha256.len() as u64 != meta.chunk_count() {
            let reason = format!(
                "metadata lists {} chunk digests for {} chunks",
                meta.chunk_sha256.len(),
                meta.chunk_count()
            );
            return Err(BlobStoreError::corrupted(blob_id, reason));
        }
        tracing::debug!("opened {} for read, {} bytes in {} chunks", blob_id, meta.total_size, meta.chunk_count());
        Ok(ReadHandle::new(meta))
    }

    /// Returns up to `max_bytes` from the cursor on, fetching and joining chunks as
    /// the span crosses their boundaries. Reading past the end yields an empty
    /// result with `is_eof` set.
    pub async fn read(&self, handle: &mut ReadHandle, max_bytes: usize) -> Result<ReadOutcome> {
        handle.ensure_open()?;
        if let Some(reason) = handle.corrupted.clone() {
            return Err(BlobStoreError::corrupted(handle.blob_id(), reason));
        }

        let wanted = (handle.remaining().min(max_bytes as u64)) as usize;
        let mut bytes = Vec::with_capacity(wanted);
        while bytes.len() < wanted {
            let chunk_size = handle.meta.chunk_size;
            let seq = handle.position / chunk_size;
            let offset = (handle.position % chunk_size) as usize;
            self.load_chunk(handle, seq).await?;

            let exhausted = match handle.buffered.as_ref() {
                Some((_, chunk)) => {
                    let take = (chunk.len() - offset).min(wanted - bytes.len());
                    bytes.extend_from_slice(&chunk[offset..offset + take]);
                    handle.position += take as u64;
                    offset + take == chunk.len()
                }
                None => true,
            };
            if exhausted {
                handle.buffered = None;
            }
        }

        Ok(ReadOutcome {
            bytes,
            is_eof: handle.is_eof(),
        })
    }

    /// Drains the rest of the handle.
    pub async fn read_to_end(&self, handle: &mut ReadHandle) -> Result<Vec<u8>> {
        let mut all = Vec::with_capacity(handle.remaining() as usize);
        loop {
            let outcome = self.read(handle, self.config.read_size).await?;
            all.extend_from_slice(&outcome.bytes);
            if outcome.is_eof {
                return Ok(all);
            }
        }
    }

    /// Makes sure the chunk `seq` sits in the handle's buffer, checking it against the metadata.
    async fn load_chunk(&self, handle: &mut ReadHandle, seq: u64) -> Result<()> {
        if matches!(handle.buffered, Some((buffered_seq, _)) if buffered_seq == seq) {
            return Ok(());
        }

        let chunk = self.chunk_store.get_chunk(handle.blob_id(), seq).await?;
        let chunk = match chunk {
            Some(chunk) => chunk,
            None => {
                let reason = format!("chunk {} of {} is missing", seq, handle.meta.chunk_count());
                return Err(handle.fail(reason));
            }
        };

        let expected = handle.meta.expected_chunk_len(seq);
        if chunk.len() as u64 != expected {
            let reason = format!("chunk {} holds {} bytes, expected {}", seq, chunk.len(), expected);
            return Err(handle.fail(reason));
        }

        let recorded = handle.meta.chunk_sha256.get(seq as usize).cloned().unwrap_or_default();
        let actual = compute_hash(&chunk);
        if actual != recorded {
            let reason = format!("chunk {} has sha256 {}, metadata records {}", seq, actual, recorded);
            return Err(handle.fail(reason));
        }

        handle.buffered = Some((seq, chunk));
        Ok(())
    }

    /// Prepares a write. No metadata is created until the first `write` succeeds.
    pub fn open_for_write(&self, blob_id: &str, chunk_size: u64) -> Result<WriteHandle> {
        validate_id(blob_id)?;
        if chunk_size == 0 {
            return Err(BlobStoreError::InvalidArgument("chunk size must be positive".to_string()));
        }
        if chunk_size > self.config.max_chunk_size {
            return Err(BlobStoreError::InvalidArgument(format!(
                "chunk size {} exceeds the maximum of {}",
                chunk_size, self.config.max_chunk_size
            )));
        }
        Ok(WriteHandle::new(blob_id, chunk_size))
    }

    pub fn open_for_write_default(&self, blob_id: &str) -> Result<WriteHandle> {
        self.open_for_write(blob_id, self.config.default_chunk_size)
    }

    /// Replaces the whole object with `data`.
    ///
    /// Chunks are put in sequence order and the metadata record is upserted only
    /// after all of them landed. Chunks past the new chunk count, left over from a
    /// longer previous version or a failed write, are removed afterwards.
    pub async fn write(&self, handle: &mut WriteHandle, data: &[u8]) -> Result<BlobHandle> {
        handle.ensure_open()?;
        let blob_id = handle.blob_id().to_string();
        let chunk_size = handle.chunk_size();

        for (seq, chunk) in data.chunks(chunk_size as usize).enumerate() {
            self.chunk_store.put_chunk(&blob_id, seq as u64, chunk).await?;
        }

        let meta = BlobMetadata::new(&blob_id, data, chunk_size);
        self.chunk_store.put_metadata(&meta).await?;
        tracing::info!("committed {}: {} bytes in {} chunks", blob_id, meta.total_size, meta.chunk_count());

        if let Err(e) = self.chunk_store.delete_chunks(&blob_id, meta.chunk_count()).await {
            // the new record no longer points at these, so the write stands
            tracing::warn!("failed to remove stale chunks of {}: {}", blob_id, e);
        }

        let blob = meta.handle();
        handle.commit(meta);
        Ok(blob)
    }

    pub fn close<H: Handle>(&self, handle: &mut H) {
        handle.close();
    }

    /// Removes every chunk stored for `blob_id`, then its metadata record.
    /// A delete that fails midway leaves the record behind, so it can be retried.
    pub async fn delete(&self, blob_id: &str) -> Result<()> {
        validate_id(blob_id)?;
        let meta = self.fetch_metadata(blob_id).await?;
        self.chunk_store.delete_chunks(blob_id, 0).await?;
        self.chunk_store.delete_metadata(blob_id).await?;
        tracing::info!("deleted {} and its {} chunks", blob_id, meta.chunk_count());
        Ok(())
    }

    pub async fn stat(&self, blob_id: &str) -> Result<BlobHandle> {
        validate_id(blob_id)?;
        Ok(self.fetch_metadata(blob_id).await?.handle())
    }

    pub async fn metadata(&self, blob_id: &str) -> Result<BlobMetadata> {
        validate_id(blob_id)?;
        self.fetch_metadata(blob_id).await
    }

    pub async fn exists(&self, blob_id: &str) -> Result<bool> {
        validate_id(blob_id)?;
        Ok(self.chunk_store.get_metadata(blob_id).await?.is_some())
    }

    /// Every stored object, ordered by id.
    pub async fn list(&self) -> Result<Vec<BlobHandle>> {
        let mut all: Vec<BlobHandle> = self
            .chunk_store
            .list_metadata()
            .await?
            .iter()
            .map(BlobMetadata::handle)
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn fetch_metadata(&self, blob_id: &str) -> Result<BlobMetadata> {
        self.chunk_store
            .get_metadata(blob_id)
            .await?
            .ok_or_else(|| BlobStoreError::NotFound(blob_id.to_string()))
    }
}
