//! Per-folder access control lists.

pub mod store;

pub use store::AclStore;
