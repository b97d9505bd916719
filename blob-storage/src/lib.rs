//! Chunked large object storage.
//!
//! Objects are split into fixed-size chunks and stored, together with one
//! metadata record per object, in a [`ChunkStore`] backend. Reads and writes
//! go through explicit handles, each with its own cursor.

pub mod chunk_storage;
pub mod config;
pub mod errors;
pub mod handle;
pub mod store;
pub mod types;

pub use chunk_storage::{ChunkResult, ChunkStore, ChunkStores, LocalChunkStore, MemoryChunkStore, RocksChunkStore};
pub use config::StoreConfig;
pub use errors::{BlobStoreError, Result};
pub use handle::{Handle, HandleState, ReadHandle, WriteHandle};
pub use store::ChunkedBlobStore;
pub use types::{BlobHandle, BlobMetadata, ReadOutcome};
