//! Result of an allowed-folder query.

use std::collections::BTreeSet;

use canopy_core::types::FolderId;

/// Which folders a requester may act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderScope {
    /// Every folder: a superuser, or access control is off.
    Unrestricted,
    /// Only these folders.
    Folders(BTreeSet<FolderId>),
}

impl FolderScope {
    /// Whether the scope covers `folder_id`.
    pub fn contains(&self, folder_id: FolderId) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Folders(set) => set.contains(&folder_id),
        }
    }

    /// Whether the scope covers at least one of `folders`.
    pub fn contains_any(&self, folders: &[FolderId]) -> bool {
        folders.iter().any(|f| self.contains(*f))
    }
}
