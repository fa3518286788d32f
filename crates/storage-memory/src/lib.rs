//! In-memory hierarchical storage backend
//!
//! A mutable tree of directory nodes addressed by normalized path
//! segments. Emulates the same directory semantics as the object-store
//! backend without a backing object store: directories are created lazily
//! under file writes, never speculatively, and bulk directory operations
//! run through the shared pagination protocol.

mod store;
mod tree;

pub use store::MemoryStorage;
