use std::fmt::{self, Debug, Formatter};
use crate::errors::{BlobStoreError, Result};
use crate::types::BlobMetadata;

/// Lifecycle of a handle. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Open,
    Closed,
}

/// Behaviour shared by read and write handles.
pub trait Handle {
    fn blob_id(&self) -> &str;

    fn state(&self) -> HandleState;

    /// Releases cursor and buffer state. Closing twice is a no-op.
    fn close(&mut self);

    fn is_open(&self) -> bool {
        self.state() == HandleState::Open
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state() {
            HandleState::Open => Ok(()),
            HandleState::Closed => Err(BlobStoreError::ReadAfterClose(self.blob_id().to_string())),
        }
    }
}

/// Cursor over a stored blob, positioned at byte 0 when opened.
pub struct ReadHandle {
    pub(crate) meta: BlobMetadata,
    state: HandleState,
    /// Bytes handed out so far
    pub(crate) position: u64,
    /// The chunk the cursor currently sits in, with its sequence number
    pub(crate) buffered: Option<(u64, Vec<u8>)>,
    /// Set once an integrity failure was seen, later reads repeat it
    pub(crate) corrupted: Option<String>,
}

impl ReadHandle {
    pub(crate) fn new(meta: BlobMetadata) -> Self {
        Self {
            meta,
            state: HandleState::Open,
            position: 0,
            buffered: None,
            corrupted: None,
        }
    }

    pub fn metadata(&self) -> &BlobMetadata {
        &self.meta
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn remaining(&self) -> u64 {
        self.meta.total_size.saturating_sub(self.position)
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.meta.total_size
    }

    pub(crate) fn fail(&mut self, reason: String) -> BlobStoreError {
        self.buffered = None;
        self.corrupted = Some(reason.clone());
        BlobStoreError::corrupted(&self.meta.blob_id, reason)
    }
}

impl Handle for ReadHandle {
    fn blob_id(&self) -> &str {
        &self.meta.blob_id
    }

    fn state(&self) -> HandleState {
        self.state
    }

    fn close(&mut self) {
        if self.state == HandleState::Closed {
            return;
        }
        self.state = HandleState::Closed;
        self.buffered = None;
    }
}

impl Debug for ReadHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadHandle")
            .field("blob_id", &self.meta.blob_id)
            .field("state", &self.state)
            .field("position", &self.position)
            .field("total_size", &self.meta.total_size)
            .finish()
    }
}

/// Target of whole-object writes. Nothing is published until the first `write` succeeds.
#[derive(Debug)]
pub struct WriteHandle {
    blob_id: String,
    chunk_size: u64,
    state: HandleState,
    /// Metadata of the last write committed through this handle
    committed: Option<BlobMetadata>,
}

impl WriteHandle {
    pub(crate) fn new(blob_id: &str, chunk_size: u64) -> Self {
        Self {
            blob_id: blob_id.to_string(),
            chunk_size,
            state: HandleState::Open,
            committed: None,
        }
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn committed(&self) -> Option<&BlobMetadata> {
        self.committed.as_ref()
    }

    pub(crate) fn commit(&mut self, meta: BlobMetadata) {
        self.committed = Some(meta);
    }
}

impl Handle for WriteHandle {
    fn blob_id(&self) -> &str {
        &self.blob_id
    }

    fn state(&self) -> HandleState {
        self.state
    }

    fn close(&mut self) {
        self.state = HandleState::Closed;
    }
}
