//! Folder persistence boundary.

use async_trait::async_trait;

use canopy_core::result::AppResult;
use canopy_core::types::FolderId;
use canopy_entity::folder::{Folder, NewFolder};

/// Rows of the folder tree.
///
/// Implementations enforce `(name, parent_id)` uniqueness and report a
/// violation as a `Conflict` error.
#[async_trait]
pub trait FolderStore: Send + Sync + std::fmt::Debug + 'static {
    /// Every folder, in id order.
    async fn find_all(&self) -> AppResult<Vec<Folder>>;

    /// A folder by id.
    async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>>;

    /// The child of `parent_id` called `name`.
    async fn find_child(&self, parent_id: FolderId, name: &str) -> AppResult<Option<Folder>>;

    /// Insert a folder and return the stored row.
    async fn create(&self, data: &NewFolder) -> AppResult<Folder>;

    /// Rename a folder in place.
    async fn rename(&self, id: FolderId, new_name: &str) -> AppResult<Folder>;

    /// Delete a folder row. Returns `true` if it existed.
    async fn delete(&self, id: FolderId) -> AppResult<bool>;

    /// Number of direct children.
    async fn count_children(&self, id: FolderId) -> AppResult<u64>;
}
