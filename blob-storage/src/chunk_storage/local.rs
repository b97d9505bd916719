use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use crate::chunk_storage::store::{ChunkResult, ChunkStore};
use crate::types::BlobMetadata;

const METADATA_FILE: &str = "meta.json";

/// A `ChunkStore` that writes chunks to a local directory.
/// Each blob gets its own sub directory named after the hex encoded id,
/// holding `meta.json` and one `<seq>.chunk` file per chunk.
#[derive(Clone, Debug)]
pub struct LocalChunkStore {
    directory: PathBuf,
}

fn encode_id(blob_id: &str) -> String {
    blob_id.bytes().map(|byte| format!("{:02x}", byte)).collect()
}

impl LocalChunkStore {
    /// Creates a new `LocalChunkStore` targeting the specified directory.
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    fn blob_dir(&self, blob_id: &str) -> PathBuf {
        self.directory.join(encode_id(blob_id))
    }

    fn chunk_path(&self, blob_id: &str, seq: u64) -> PathBuf {
        self.blob_dir(blob_id).join(format!("{}.chunk", seq))
    }

    async fn read_optional(path: PathBuf) -> ChunkResult<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_optional(path: PathBuf) -> ChunkResult<()> {
        match fs::remove_file(path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Drops the directory of a blob once nothing is left in it.
    async fn prune_dir(&self, blob_id: &str) {
        if fs::remove_dir(self.blob_dir(blob_id)).await.is_ok() {
            tracing::debug!("removed empty directory of {}", blob_id);
        }
    }
}

#[async_trait]
impl ChunkStore for LocalChunkStore {
    async fn put_chunk(&self, blob_id: &str, seq: u64, data: &[u8]) -> ChunkResult<()> {
        fs::create_dir_all(self.blob_dir(blob_id)).await?;
        fs::write(self.chunk_path(blob_id, seq), data).await?;
        Ok(())
    }

    async fn get_chunk(&self, blob_id: &str, seq: u64) -> ChunkResult<Option<Vec<u8>>> {
        Self::read_optional(self.chunk_path(blob_id, seq)).await
    }

    async fn delete_chunk(&self, blob_id: &str, seq: u64) -> ChunkResult<()> {
        Self::remove_optional(self.chunk_path(blob_id, seq)).await?;
        self.prune_dir(blob_id).await;
        Ok(())
    }

    async fn delete_chunks(&self, blob_id: &str, from_seq: u64) -> ChunkResult<()> {
        let mut entries = match fs::read_dir(self.blob_dir(blob_id)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let seq = name
                .to_str()
                .and_then(|name| name.strip_suffix(".chunk"))
                .and_then(|seq| seq.parse::<u64>().ok());
            if matches!(seq, Some(seq) if seq >= from_seq) {
                Self::remove_optional(entry.path()).await?;
            }
        }
        self.prune_dir(blob_id).await;
        Ok(())
    }

    async fn put_metadata(&self, meta: &BlobMetadata) -> ChunkResult<()> {
        let dir = self.blob_dir(&meta.blob_id);
        fs::create_dir_all(&dir).await?;
        // write then rename so readers never see a half written record
        let tmp = dir.join(format!("{}.tmp", METADATA_FILE));
        fs::write(&tmp, serde_json::to_vec(meta)?).await?;
        fs::rename(tmp, dir.join(METADATA_FILE)).await?;
        Ok(())
    }

    async fn get_metadata(&self, blob_id: &str) -> ChunkResult<Option<BlobMetadata>> {
        match Self::read_optional(self.blob_dir(blob_id).join(METADATA_FILE)).await? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    async fn delete_metadata(&self, blob_id: &str) -> ChunkResult<()> {
        Self::remove_optional(self.blob_dir(blob_id).join(METADATA_FILE)).await?;
        self.prune_dir(blob_id).await;
        Ok(())
    }

    async fn list_metadata(&self) -> ChunkResult<Vec<BlobMetadata>> {
        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut all = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(raw) = Self::read_optional(entry.path().join(METADATA_FILE)).await? {
                all.push(serde_json::from_slice::<BlobMetadata>(&raw)?);
            }
        }
        all.sort_by(|a, b| a.blob_id.cmp(&b.blob_id));
        Ok(all)
    }
}
