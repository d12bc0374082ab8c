//! Folder hierarchy snapshots and path resolution.

pub mod path;
pub mod store;
pub mod tree;

pub use store::{FolderHierarchy, ListGuard};
pub use tree::{FolderNode, FolderTree};
