//! Object-store storage backend
//!
//! Maps hierarchical file operations onto a flat-key object client
//! (get/put/copy/delete/list-by-prefix with continuation). Directories do
//! not exist on the backend; they are emulated through prefix listing and
//! the shared pagination protocol.

pub mod client;
pub mod store;
pub mod testing;

pub use client::{ClientError, ObjectClient, ObjectInfo};
pub use store::ObjectStorage;
pub use testing::FakeObjectClient;
