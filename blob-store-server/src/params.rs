use std::path::PathBuf;
use blob_store::config::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNK_SIZE, DEFAULT_READ_SIZE};
use blob_store::{ChunkStores, LocalChunkStore, MemoryChunkStore, RocksChunkStore, StoreConfig};
use clap::{Parser, ValueEnum};
use crate::errors::ServerErr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    Memory,
    Local,
    Rocksdb,
}

#[derive(Parser, Debug)]
pub struct Args {
    #[clap(long, env = "BLOB_HTTP_ADDR", default_value = "127.0.0.1:8080")]
    pub(crate) http_addr: String,
    #[clap(long, env = "BLOB_BACKEND", value_enum, default_value_t = BackendKind::Memory)]
    pub(crate) backend: BackendKind,
    /// Directory of the local or rocksdb backend
    #[clap(long, env = "BLOB_DATA_DIR", default_value = "blob-data")]
    pub(crate) data_dir: PathBuf,
    #[clap(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub(crate) chunk_size: u64,
    #[clap(long, default_value_t = DEFAULT_MAX_CHUNK_SIZE)]
    pub(crate) max_chunk_size: u64,
    #[clap(long, default_value_t = DEFAULT_READ_SIZE)]
    pub(crate) read_size: usize,
    /// Largest request body accepted on upload
    #[clap(long, default_value_t = 64 * 1024 * 1024)]
    pub(crate) max_body_bytes: usize,
}

impl Args {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            default_chunk_size: self.chunk_size,
            max_chunk_size: self.max_chunk_size,
            read_size: self.read_size,
        }
    }

    pub fn chunk_stores(&self) -> Result<ChunkStores, ServerErr> {
        match self.backend {
            BackendKind::Memory => Ok(ChunkStores::Memory(MemoryChunkStore::new())),
            BackendKind::Local => {
                std::fs::create_dir_all(&self.data_dir).map_err(|e| ServerErr::Backend(e.to_string()))?;
                Ok(ChunkStores::Local(LocalChunkStore::new(self.data_dir.clone())))
            }
            BackendKind::Rocksdb => RocksChunkStore::open(&self.data_dir)
                .map(ChunkStores::Rocks)
                .map_err(|e| ServerErr::Backend(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["blob-store-server"]).unwrap();
        assert_eq!(args.backend, BackendKind::Memory);
        assert_eq!(args.store_config(), StoreConfig::default());
    }

    #[test]
    fn test_local_backend_creates_directory() {
        let temp_dir = tempdir().unwrap();
        let data_dir = temp_dir.path().join("blobs");
        let args = Args::try_parse_from([
            "blob-store-server",
            "--backend",
            "local",
            "--data-dir",
            data_dir.to_str().unwrap(),
            "--chunk-size",
            "4096",
        ])
        .unwrap();

        assert!(matches!(args.chunk_stores().unwrap(), ChunkStores::Local(_)));
        assert!(data_dir.is_dir());
        assert_eq!(args.store_config().default_chunk_size, 4096);
    }
}
