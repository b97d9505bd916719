pub mod local;
pub mod memory;
pub mod rocks;
pub mod store;

pub use local::LocalChunkStore;
pub use memory::MemoryChunkStore;
pub use rocks::RocksChunkStore;
pub use store::{ChunkResult, ChunkStore, ChunkStores};
