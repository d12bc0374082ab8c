//! Collaborator traits implemented by store backends.

pub mod directory;
pub mod folder;
pub mod grant;
pub mod member;

pub use directory::Directory;
pub use folder::FolderStore;
pub use grant::GrantStore;
pub use member::{MemberCounter, MemberStore};
