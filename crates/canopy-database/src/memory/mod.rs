//! In-process implementations of the store and directory traits.
//!
//! Used by the test suite, by bootstrap code, and by embedded deployments
//! that keep the whole hierarchy in memory.

pub mod directory;
pub mod member;
pub mod store;

pub use directory::MemoryDirectory;
pub use member::MemoryMemberStore;
pub use store::MemoryStore;
