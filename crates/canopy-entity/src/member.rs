//! Folder membership capability for arbitrary domain entities.

use canopy_core::types::{FolderId, MemberId};

/// Implemented by any entity whose authorization derives from the folders
/// it belongs to. Single-folder entities return a one-element slice.
pub trait FolderMember: Clone + Send + Sync + 'static {
    /// Store identity, or `None` if the entity has never been saved.
    fn member_id(&self) -> Option<MemberId>;

    /// Returns the entity with a store-assigned identity.
    fn with_member_id(self, id: MemberId) -> Self;

    /// The folders the entity belongs to.
    fn folders(&self) -> &[FolderId];

    /// Whether the entity already exists in its store.
    fn is_persisted(&self) -> bool {
        self.member_id().is_some()
    }
}
