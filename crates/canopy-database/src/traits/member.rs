//! Folder-member persistence boundary.

use std::collections::BTreeSet;

use async_trait::async_trait;

use canopy_core::result::AppResult;
use canopy_core::types::{FolderId, MemberId};
use canopy_entity::member::FolderMember;

/// Storage for one kind of folder member.
#[async_trait]
pub trait MemberStore<T: FolderMember>: Send + Sync + 'static {
    /// Every stored member.
    async fn find_all(&self) -> AppResult<Vec<T>>;

    /// A member by id.
    async fn find_by_id(&self, id: MemberId) -> AppResult<Option<T>>;

    /// Members that belong to at least one of `folders`.
    async fn find_in_folders(&self, folders: &BTreeSet<FolderId>) -> AppResult<Vec<T>>;

    /// Store a new member and return it with its assigned id.
    async fn insert(&self, entity: T) -> AppResult<T>;

    /// Replace a stored member.
    async fn update(&self, entity: &T) -> AppResult<T>;

    /// Delete a member. Returns `true` if it existed.
    async fn delete(&self, id: MemberId) -> AppResult<bool>;
}

/// Lets folder removal see whether any member still lives in a folder.
#[async_trait]
pub trait MemberCounter: Send + Sync + std::fmt::Debug + 'static {
    /// Number of members that belong to `folder_id`.
    async fn count_in_folder(&self, folder_id: FolderId) -> AppResult<u64>;
}
