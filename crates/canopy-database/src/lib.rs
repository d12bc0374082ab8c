//! # canopy-database
//!
//! Storage boundary for Canopy. The [`traits`] module defines what the
//! engine needs from the persistent store and the identity directory;
//! [`memory`] implements it in-process and [`repositories`] implements the
//! folder and grant stores on PostgreSQL.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod traits;

pub use connection::DatabasePool;
pub use memory::{MemoryDirectory, MemoryMemberStore, MemoryStore};
pub use traits::{Directory, FolderStore, GrantStore, MemberCounter, MemberStore};
