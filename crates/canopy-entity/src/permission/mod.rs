//! Permission domain entities.

pub mod action;
pub mod model;

pub use action::{Action, ActionSet};
pub use model::PermissionGrant;
