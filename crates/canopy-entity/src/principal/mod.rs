//! Principals: users, groups, and the requester of an operation.

pub mod model;

pub use model::{ANONYMOUS_NAME, GROUP_PREFIX, Group, Principal, Requester, User};
