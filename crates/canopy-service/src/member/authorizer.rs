//! Folder-derived authorization for arbitrary member entities.
//!
//! A member owns no ACL. Every decision is taken on the folders it belongs
//! to, and a member is allowed an action if any of its folders allows it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use canopy_auth::{FolderScope, PermissionResolver};
use canopy_core::error::AppError;
use canopy_core::result::AppResult;
use canopy_core::types::FolderId;
use canopy_database::traits::MemberStore;
use canopy_entity::member::FolderMember;
use canopy_entity::permission::Action;
use canopy_entity::principal::Requester;

/// Checks and performs member reads and writes on behalf of a requester.
pub struct MemberAuthorizer<T: FolderMember> {
    resolver: PermissionResolver,
    store: Arc<dyn MemberStore<T>>,
}

impl<T: FolderMember> Clone for MemberAuthorizer<T> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: FolderMember> fmt::Debug for MemberAuthorizer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberAuthorizer")
            .field("member", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: FolderMember> MemberAuthorizer<T> {
    /// Creates a new member authorizer.
    pub fn new(resolver: PermissionResolver, store: Arc<dyn MemberStore<T>>) -> Self {
        Self { resolver, store }
    }

    /// The underlying member store.
    pub fn store(&self) -> &Arc<dyn MemberStore<T>> {
        &self.store
    }

    /// Whether any of the entity's folders allows `action`.
    pub async fn is_allowed(
        &self,
        entity: &T,
        requester: &Requester,
        action: Action,
    ) -> AppResult<bool> {
        self.resolver
            .is_allowed_by_any(requester, entity.folders(), action)
            .await
    }

    /// Fail with `AccessDenied` unless [`Self::is_allowed`].
    pub async fn assert_allowed(
        &self,
        entity: &T,
        requester: &Requester,
        action: Action,
    ) -> AppResult<()> {
        self.resolver
            .assert_allowed_by_any(requester, entity.folders(), action)
            .await
    }

    /// Members the requester may view.
    pub async fn allowed(&self, requester: &Requester) -> AppResult<Vec<T>> {
        self.allowed_for(requester, Action::View).await
    }

    /// Members with at least one folder that allows `action`.
    pub async fn allowed_for(&self, requester: &Requester, action: Action) -> AppResult<Vec<T>> {
        match self.resolver.scope(requester, action).await? {
            FolderScope::Unrestricted => self.store.find_all().await,
            FolderScope::Folders(folders) if folders.is_empty() => Ok(Vec::new()),
            FolderScope::Folders(folders) => self.store.find_in_folders(&folders).await,
        }
    }

    /// Save `entity` if the requester may.
    ///
    /// The target folders are the entity's own folders plus any extra
    /// `check_folders`. An update needs CHANGE on one of the stored
    /// entity's folders, and moving it to different target folders goes
    /// through [`Self::assert_folder_change_allowed`]. An insert goes
    /// through the same guard against the target folders.
    pub async fn save_assert_allowed(
        &self,
        entity: T,
        requester: &Requester,
        check_folders: Option<&[FolderId]>,
    ) -> AppResult<T> {
        match entity.member_id() {
            Some(id) => {
                let stored = self
                    .store
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Member {id} does not exist")))?;
                self.assert_allowed(&stored, requester, Action::Change)
                    .await?;

                let target = target_folders(&entity, check_folders);
                if folder_set(stored.folders()) != folder_set(&target) {
                    self.assert_folder_change_allowed(requester, stored.folders(), &target)
                        .await?;
                }

                let saved = self.store.update(&entity).await?;
                info!(member_id = %id, requester = %requester.display_name(), "Member updated");
                Ok(saved)
            }
            None => {
                let target = target_folders(&entity, check_folders);
                self.assert_folder_change_allowed(requester, &[], &target)
                    .await?;

                let saved = self.store.insert(entity).await?;
                if let Some(id) = saved.member_id() {
                    info!(member_id = %id, requester = %requester.display_name(), "Member inserted");
                }
                Ok(saved)
            }
        }
    }

    /// Delete `entity` if the requester may remove it from every folder it
    /// is in. Returns `true` if it existed.
    pub async fn delete_assert_allowed(&self, entity: &T, requester: &Requester) -> AppResult<bool> {
        let Some(id) = entity.member_id() else {
            return Err(AppError::invalid_argument(
                "Cannot delete a member that was never saved",
            ));
        };
        let folders = match self.store.find_by_id(id).await? {
            Some(stored) => stored.folders().to_vec(),
            None => entity.folders().to_vec(),
        };
        self.assert_folder_change_allowed(requester, &folders, &[])
            .await?;

        let deleted = self.store.delete(id).await?;
        if deleted {
            info!(member_id = %id, requester = %requester.display_name(), "Member deleted");
        }
        Ok(deleted)
    }

    /// Guard against moving a member into folders the requester could use
    /// to grant themselves more access.
    ///
    /// A member that already has folders needs ADMIN on one of them. Each
    /// added folder needs INSERT and each removed folder needs DELETE.
    pub async fn assert_folder_change_allowed(
        &self,
        requester: &Requester,
        old_folders: &[FolderId],
        new_folders: &[FolderId],
    ) -> AppResult<()> {
        if !old_folders.is_empty() {
            self.resolver
                .assert_allowed_by_any(requester, old_folders, Action::Admin)
                .await?;
        }

        let old = folder_set(old_folders);
        let new = folder_set(new_folders);
        let hierarchy = self.resolver.hierarchy();

        for id in new.difference(&old) {
            let folder = hierarchy.folder(*id).await?;
            self.resolver
                .assert_allowed(requester, &folder, Action::Insert)
                .await?;
        }
        for id in old.difference(&new) {
            let folder = hierarchy.folder(*id).await?;
            self.resolver
                .assert_allowed(requester, &folder, Action::Delete)
                .await?;
        }

        debug!(
            requester = %requester.display_name(),
            added = new.difference(&old).count(),
            removed = old.difference(&new).count(),
            "Folder change allowed"
        );
        Ok(())
    }
}

fn folder_set(folders: &[FolderId]) -> BTreeSet<FolderId> {
    folders.iter().copied().collect()
}

/// Every folder a save will place the entity in, plus any the caller asked
/// to check on top.
fn target_folders<T: FolderMember>(
    entity: &T,
    check_folders: Option<&[FolderId]>,
) -> Vec<FolderId> {
    let mut folders = folder_set(entity.folders());
    folders.extend(check_folders.unwrap_or_default().iter().copied());
    folders.into_iter().collect()
}
