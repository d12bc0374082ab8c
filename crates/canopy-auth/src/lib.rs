//! # canopy-auth
//!
//! Folder-based authorization for Canopy.
//!
//! ## Modules
//!
//! - `hierarchy`: cached folder tree snapshots and path resolution
//! - `acl`: per-folder permission grants keyed by principal
//! - `resolver`: allowed-folder sets and allow/deny decisions

pub mod acl;
pub mod hierarchy;
pub mod resolver;

pub use acl::AclStore;
pub use hierarchy::{FolderHierarchy, FolderNode, FolderTree, ListGuard};
pub use resolver::{FolderScope, PermissionResolver};
