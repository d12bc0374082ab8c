//! Permission resolution.

pub mod engine;
pub mod scope;

pub use engine::PermissionResolver;
pub use scope::FolderScope;
