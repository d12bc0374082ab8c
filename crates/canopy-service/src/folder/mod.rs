//! Folder and ACL mutations.

pub mod service;

pub use service::FolderService;
