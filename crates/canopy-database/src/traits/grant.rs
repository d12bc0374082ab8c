//! Permission grant persistence boundary.

use async_trait::async_trait;

use canopy_core::result::AppResult;
use canopy_core::types::FolderId;
use canopy_entity::permission::{Action, PermissionGrant};
use canopy_entity::principal::Principal;

/// Rows of `(folder, principal) -> actions`.
///
/// A stored grant always has a non-empty action set.
#[async_trait]
pub trait GrantStore: Send + Sync + std::fmt::Debug + 'static {
    /// The grant for one principal on one folder.
    async fn find(
        &self,
        folder_id: FolderId,
        principal: Principal,
    ) -> AppResult<Option<PermissionGrant>>;

    /// Every grant on a folder.
    async fn find_by_folder(&self, folder_id: FolderId) -> AppResult<Vec<PermissionGrant>>;

    /// Every grant whose action set contains `action`.
    async fn find_allowing(&self, action: Action) -> AppResult<Vec<PermissionGrant>>;

    /// Insert or replace a grant.
    async fn upsert(&self, grant: &PermissionGrant) -> AppResult<()>;

    /// Delete one grant. Returns `true` if it existed.
    async fn delete(&self, folder_id: FolderId, principal: Principal) -> AppResult<bool>;

    /// Delete every grant on a folder and return how many were removed.
    async fn delete_by_folder(&self, folder_id: FolderId) -> AppResult<u64>;
}
