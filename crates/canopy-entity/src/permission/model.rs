//! Permission grant entity model.

use serde::{Deserialize, Serialize};

use canopy_core::types::FolderId;

use super::action::ActionSet;
use crate::principal::Principal;

/// Associates one principal with one folder and a non-empty action set.
///
/// An empty action set is never stored: granting [`ActionSet::NONE`]
/// deletes the row instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// Folder the grant is attached to.
    pub folder_id: FolderId,
    /// User or group receiving the grant.
    pub principal: Principal,
    /// Granted actions.
    pub actions: ActionSet,
}

impl PermissionGrant {
    /// Create a new grant.
    pub fn new(folder_id: FolderId, principal: Principal, actions: ActionSet) -> Self {
        Self {
            folder_id,
            principal,
            actions,
        }
    }
}
