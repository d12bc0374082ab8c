//! # Canopy
//!
//! Hierarchical folder-based authorization. Folders form a rooted tree,
//! each folder carries an access control list of (principal, actions)
//! grants, and a requester may act on a folder only if the folder grants
//! the action and every ancestor up to the root is listable.
//!
//! [`Canopy`] wires the stores, the result cache and the services together
//! from an [`AppConfig`].

pub mod app;
pub mod logging;

pub use app::Canopy;
pub use logging::init_logging;

pub use canopy_auth::{AclStore, FolderHierarchy, FolderScope, PermissionResolver};
pub use canopy_core::config::AppConfig;
pub use canopy_core::{AppError, AppResult, ErrorKind};
pub use canopy_entity::folder::Folder;
pub use canopy_entity::member::FolderMember;
pub use canopy_entity::permission::{Action, ActionSet};
pub use canopy_entity::principal::{Principal, Requester};
pub use canopy_service::{FolderService, MemberAuthorizer};
