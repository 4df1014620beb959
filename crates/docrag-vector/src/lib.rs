//! Namespace-partitioned vector storage.

pub mod collection;
pub mod memory;
pub mod schema;
pub mod search;
pub mod store;
pub mod table;
pub mod writer;

pub use collection::Collections;
pub use memory::MemoryStore;
pub use store::LanceStore;
