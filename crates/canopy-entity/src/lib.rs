//! # canopy-entity
//!
//! Domain entity models for Canopy. Every struct in this crate represents
//! a store row or a domain value object. Row types additionally derive
//! `sqlx::FromRow` when the `sqlx` feature is enabled.

pub mod folder;
pub mod member;
pub mod permission;
pub mod principal;

pub use folder::{Folder, NewFolder};
pub use member::FolderMember;
pub use permission::{Action, ActionSet, PermissionGrant};
pub use principal::{Group, Principal, Requester, User};
