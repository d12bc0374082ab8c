//! # canopy-service
//!
//! Use-case layer for Canopy. Services are built by constructor injection
//! from the auth components and store traits, and every checked entry
//! point has a `_no_check` counterpart for bootstrap code.

pub mod folder;
pub mod member;

pub use folder::FolderService;
pub use member::MemberAuthorizer;
