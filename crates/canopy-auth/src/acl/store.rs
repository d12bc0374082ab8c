//! ACL store: `(principal, folder) -> actions`.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::info;

use canopy_cache::ResultCache;
use canopy_core::error::AppError;
use canopy_core::result::AppResult;
use canopy_core::types::FolderId;
use canopy_database::traits::{Directory, GrantStore};
use canopy_entity::permission::{Action, ActionSet, PermissionGrant};
use canopy_entity::principal::Principal;

/// Reads and writes folder grants.
///
/// Every write bumps the result cache generation so no stale decision is
/// served after a grant changes.
#[derive(Debug, Clone)]
pub struct AclStore {
    grants: Arc<dyn GrantStore>,
    directory: Arc<dyn Directory>,
    cache: ResultCache,
}

impl AclStore {
    /// Create an ACL store.
    pub fn new(
        grants: Arc<dyn GrantStore>,
        directory: Arc<dyn Directory>,
        cache: ResultCache,
    ) -> Self {
        Self {
            grants,
            directory,
            cache,
        }
    }

    /// Replace the principal's actions on a folder. [`ActionSet::NONE`]
    /// removes the grant.
    pub async fn grant(
        &self,
        principal: Principal,
        folder_id: FolderId,
        actions: ActionSet,
    ) -> AppResult<()> {
        if actions.is_empty() {
            self.grants.delete(folder_id, principal).await?;
        } else {
            self.grants
                .upsert(&PermissionGrant::new(folder_id, principal, actions))
                .await?;
        }
        self.cache.bump_generation();
        info!(
            principal = %principal,
            folder_id = %folder_id,
            actions = %actions,
            "Folder permissions set"
        );
        Ok(())
    }

    /// Remove an existing grant; `NotFound` if there is none.
    pub async fn revoke(&self, principal: Principal, folder_id: FolderId) -> AppResult<()> {
        if !self.grants.delete(folder_id, principal).await? {
            return Err(AppError::not_found(format!(
                "No grant for {principal} on folder {folder_id}"
            )));
        }
        self.cache.bump_generation();
        info!(principal = %principal, folder_id = %folder_id, "Folder permissions revoked");
        Ok(())
    }

    /// The principal's own actions on a folder, ignoring groups.
    pub async fn list_actions_for(
        &self,
        principal: Principal,
        folder_id: FolderId,
    ) -> AppResult<ActionSet> {
        Ok(self
            .grants
            .find(folder_id, principal)
            .await?
            .map(|g| g.actions)
            .unwrap_or(ActionSet::NONE))
    }

    /// The raw grants on a folder.
    pub async fn grants_on(&self, folder_id: FolderId) -> AppResult<Vec<PermissionGrant>> {
        self.grants.find_by_folder(folder_id).await
    }

    /// The folder's ACL keyed by principal display name, sorted.
    ///
    /// Fails with `Conflict` if two granted principals render to the same
    /// name.
    pub async fn list_acl(&self, folder_id: FolderId) -> AppResult<BTreeMap<String, ActionSet>> {
        let grants = self.grants.find_by_folder(folder_id).await?;
        let names = try_join_all(
            grants
                .iter()
                .map(|g| self.directory.principal_name(g.principal)),
        )
        .await?;

        let mut acl = BTreeMap::new();
        for (name, grant) in names.into_iter().zip(&grants) {
            if acl.contains_key(&name) {
                return Err(AppError::conflict(format!(
                    "Principal name '{name}' is shared by more than one grant on folder {folder_id}"
                )));
            }
            acl.insert(name, grant.actions);
        }
        Ok(acl)
    }

    /// The ACL as text, one `  <principal> <letters>` line per grant.
    pub async fn acl_text(&self, folder_id: FolderId) -> AppResult<String> {
        let mut out = String::new();
        for (name, actions) in self.list_acl(folder_id).await? {
            // Writing to a String cannot fail.
            let _ = writeln!(out, "  {name} {}", actions.to_code());
        }
        Ok(out)
    }

    /// Make `to`'s ACL an exact copy of `from`'s. Returns the number of
    /// grants copied.
    ///
    /// The generation is bumped even when a write fails, since `to` may
    /// already have lost some of its grants.
    pub async fn copy_acl(&self, from: FolderId, to: FolderId) -> AppResult<usize> {
        let grants = self.grants.find_by_folder(from).await?;
        let written = self.replace_grants(to, &grants).await;
        self.cache.bump_generation();
        written?;
        info!(from = %from, to = %to, count = grants.len(), "Folder ACL copied");
        Ok(grants.len())
    }

    async fn replace_grants(
        &self,
        folder_id: FolderId,
        grants: &[PermissionGrant],
    ) -> AppResult<()> {
        self.grants.delete_by_folder(folder_id).await?;
        for grant in grants {
            self.grants
                .upsert(&PermissionGrant::new(folder_id, grant.principal, grant.actions))
                .await?;
        }
        Ok(())
    }

    /// Remove every grant on a folder.
    pub async fn clear_acl(&self, folder_id: FolderId) -> AppResult<u64> {
        let removed = self.grants.delete_by_folder(folder_id).await?;
        self.cache.bump_generation();
        Ok(removed)
    }

    /// Every `(principal, folder)` pair whose grant includes `action`.
    pub async fn principals_granted(
        &self,
        action: Action,
    ) -> AppResult<Vec<(Principal, FolderId)>> {
        Ok(self
            .grants
            .find_allowing(action)
            .await?
            .into_iter()
            .map(|g| (g.principal, g.folder_id))
            .collect())
    }
}
