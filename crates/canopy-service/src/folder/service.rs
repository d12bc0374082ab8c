//! Folder creation, removal, renaming and ACL changes with permission
//! enforcement.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use canopy_auth::{AclStore, PermissionResolver};
use canopy_core::error::AppError;
use canopy_core::result::AppResult;
use canopy_core::types::FolderId;
use canopy_database::traits::{Directory, FolderStore, MemberCounter};
use canopy_entity::folder::{Folder, NewFolder, validate_folder_name};
use canopy_entity::permission::{Action, ActionSet};
use canopy_entity::principal::{Principal, Requester};

/// Mutates the folder tree and its ACLs.
///
/// Every structural change bumps the result cache generation.
#[derive(Debug, Clone)]
pub struct FolderService {
    resolver: PermissionResolver,
    acl: AclStore,
    directory: Arc<dyn Directory>,
    counters: Arc<RwLock<Vec<Arc<dyn MemberCounter>>>>,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(resolver: PermissionResolver, acl: AclStore, directory: Arc<dyn Directory>) -> Self {
        Self {
            resolver,
            acl,
            directory,
            counters: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a member store so folder removal can see its members.
    pub async fn register_counter(&self, counter: Arc<dyn MemberCounter>) {
        self.counters.write().await.push(counter);
    }

    /// The permission resolver.
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// The ACL store.
    pub fn acl(&self) -> &AclStore {
        &self.acl
    }

    fn folders(&self) -> &Arc<dyn FolderStore> {
        self.resolver.hierarchy().store()
    }

    fn invalidate(&self) {
        self.resolver.hierarchy().cache().bump_generation();
    }

    /// The root folder.
    pub async fn root_folder(&self) -> AppResult<Folder> {
        self.resolver.hierarchy().root_folder().await
    }

    /// Resolve a path, requiring LIST on every folder walked through.
    pub async fn get_folder(
        &self,
        path: &str,
        working: FolderId,
        requester: &Requester,
    ) -> AppResult<Folder> {
        self.resolver.resolve_path(path, working, requester).await
    }

    /// Resolve a path without permission checks.
    pub async fn get_folder_no_check(&self, path: &str, working: FolderId) -> AppResult<Folder> {
        self.resolver.hierarchy().resolve(path, working, None).await
    }

    // ── Subfolders ─────────────────────────────────────────────

    /// Create `name` under `parent`. Requires INSERT on `parent`.
    pub async fn create_subfolder(
        &self,
        parent: &Folder,
        name: &str,
        requester: &Requester,
        initial_admin: Option<Principal>,
    ) -> AppResult<Folder> {
        self.resolver
            .assert_allowed(requester, parent, Action::Insert)
            .await?;
        self.create_subfolder_no_check(parent.id, name, initial_admin)
            .await
    }

    /// Create `name` under `parent_id`, copy the parent's ACL onto it, and
    /// grant `initial_admin` full control.
    ///
    /// If the ACL cannot be written the new folder is removed again and the
    /// write error is returned.
    pub async fn create_subfolder_no_check(
        &self,
        parent_id: FolderId,
        name: &str,
        initial_admin: Option<Principal>,
    ) -> AppResult<Folder> {
        validate_folder_name(name)?;
        let folder = self
            .folders()
            .create(&NewFolder::child(parent_id, name))
            .await?;
        self.invalidate();

        if let Err(err) = self.seed_acl(parent_id, folder.id, initial_admin).await {
            warn!(folder_id = %folder.id, error = %err, "Folder ACL setup failed, removing folder");
            self.discard_folder(folder.id).await;
            return Err(err);
        }

        info!(
            folder_id = %folder.id,
            parent_id = %parent_id,
            name = %folder.name,
            "Folder created"
        );
        Ok(folder)
    }

    /// Remove the child `name` of `parent`. Requires DELETE on `parent`.
    pub async fn remove_subfolder(
        &self,
        parent: &Folder,
        name: &str,
        requester: &Requester,
    ) -> AppResult<()> {
        self.resolver
            .assert_allowed(requester, parent, Action::Delete)
            .await?;
        self.remove_subfolder_no_check(parent.id, name).await
    }

    /// Remove the child `name` of `parent_id` and its grants.
    ///
    /// Fails with `Conflict` while the folder has subfolders or members.
    pub async fn remove_subfolder_no_check(&self, parent_id: FolderId, name: &str) -> AppResult<()> {
        let folder = self.find_child(parent_id, name).await?;

        let children = self.folders().count_children(folder.id).await?;
        if children > 0 {
            return Err(AppError::conflict(format!(
                "Folder '{name}' still has {children} subfolders"
            )));
        }
        let members = self.count_members(folder.id).await?;
        if members > 0 {
            return Err(AppError::conflict(format!(
                "Folder '{name}' still has {members} members"
            )));
        }

        self.acl.clear_acl(folder.id).await?;
        self.folders().delete(folder.id).await?;
        self.invalidate();

        info!(folder_id = %folder.id, parent_id = %parent_id, name, "Folder removed");
        Ok(())
    }

    /// Rename the child `old_name` of `parent`. Requires CHANGE on `parent`.
    pub async fn rename_subfolder(
        &self,
        parent: &Folder,
        old_name: &str,
        new_name: &str,
        requester: &Requester,
    ) -> AppResult<Folder> {
        self.resolver
            .assert_allowed(requester, parent, Action::Change)
            .await?;
        self.rename_subfolder_no_check(parent.id, old_name, new_name)
            .await
    }

    /// Rename the child `old_name` of `parent_id`.
    pub async fn rename_subfolder_no_check(
        &self,
        parent_id: FolderId,
        old_name: &str,
        new_name: &str,
    ) -> AppResult<Folder> {
        validate_folder_name(new_name)?;
        let folder = self.find_child(parent_id, old_name).await?;
        let renamed = self.folders().rename(folder.id, new_name).await?;
        self.invalidate();

        info!(folder_id = %renamed.id, old_name, new_name, "Folder renamed");
        Ok(renamed)
    }

    async fn seed_acl(
        &self,
        parent_id: FolderId,
        folder_id: FolderId,
        initial_admin: Option<Principal>,
    ) -> AppResult<()> {
        self.acl.copy_acl(parent_id, folder_id).await?;
        if let Some(admin) = initial_admin {
            self.acl.grant(admin, folder_id, ActionSet::ALL).await?;
        }
        Ok(())
    }

    async fn discard_folder(&self, folder_id: FolderId) {
        if let Err(err) = self.acl.clear_acl(folder_id).await {
            warn!(folder_id = %folder_id, error = %err, "Could not clear grants of discarded folder");
        }
        if let Err(err) = self.folders().delete(folder_id).await {
            warn!(folder_id = %folder_id, error = %err, "Could not delete discarded folder");
        }
        self.invalidate();
    }

    async fn find_child(&self, parent_id: FolderId, name: &str) -> AppResult<Folder> {
        self.folders()
            .find_child(parent_id, name)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Folder '{name}' does not exist in folder {parent_id}"))
            })
    }

    async fn count_members(&self, folder_id: FolderId) -> AppResult<u64> {
        let counters = self.counters.read().await;
        let mut total = 0;
        for counter in counters.iter() {
            total += counter.count_in_folder(folder_id).await?;
        }
        Ok(total)
    }

    // ── Paths ──────────────────────────────────────────────────

    /// Create the folder at `path`. The requester needs LIST along the
    /// parent path and INSERT on the parent, and becomes the new folder's
    /// admin.
    pub async fn mkdir(
        &self,
        path: &str,
        working: FolderId,
        requester: &Requester,
    ) -> AppResult<Folder> {
        let (dirname, basename) = canopy_auth::hierarchy::path::split_last(path);
        let parent = self.get_folder(dirname, working, requester).await?;
        self.create_subfolder(&parent, basename, requester, requester.as_principal())
            .await
    }

    /// Create the folder at `path` without permission checks.
    pub async fn mkdir_no_check(&self, path: &str, working: FolderId) -> AppResult<Folder> {
        let (dirname, basename) = canopy_auth::hierarchy::path::split_last(path);
        let parent = self.get_folder_no_check(dirname, working).await?;
        self.create_subfolder_no_check(parent.id, basename, None)
            .await
    }

    /// Remove the folder at `path`. The requester needs LIST along the
    /// parent path and DELETE on the parent.
    pub async fn rmdir(&self, path: &str, working: FolderId, requester: &Requester) -> AppResult<()> {
        let (dirname, basename) = canopy_auth::hierarchy::path::split_last(path);
        let parent = self.get_folder(dirname, working, requester).await?;
        self.remove_subfolder(&parent, basename, requester).await
    }

    /// Remove the folder at `path` without permission checks.
    pub async fn rmdir_no_check(&self, path: &str, working: FolderId) -> AppResult<()> {
        let (dirname, basename) = canopy_auth::hierarchy::path::split_last(path);
        let parent = self.get_folder_no_check(dirname, working).await?;
        self.remove_subfolder_no_check(parent.id, basename).await
    }

    // ── Permissions ────────────────────────────────────────────

    /// Replace `principal`'s actions on `folder`. Requires ADMIN on `folder`.
    pub async fn set_permissions(
        &self,
        folder: &Folder,
        principal: Principal,
        actions: ActionSet,
        requester: &Requester,
    ) -> AppResult<()> {
        self.resolver
            .assert_allowed(requester, folder, Action::Admin)
            .await?;
        self.set_permissions_no_check(folder.id, principal, actions)
            .await
    }

    /// Replace `principal`'s actions on `folder_id`.
    pub async fn set_permissions_no_check(
        &self,
        folder_id: FolderId,
        principal: Principal,
        actions: ActionSet,
    ) -> AppResult<()> {
        self.acl.grant(principal, folder_id, actions).await
    }

    /// [`Self::set_permissions`] with the principal given by name
    /// (`group:X` or a username).
    pub async fn set_permissions_by_name(
        &self,
        folder: &Folder,
        principal_name: &str,
        actions: ActionSet,
        requester: &Requester,
    ) -> AppResult<()> {
        self.resolver
            .assert_allowed(requester, folder, Action::Admin)
            .await?;
        self.set_permissions_by_name_no_check(folder.id, principal_name, actions)
            .await
    }

    /// [`Self::set_permissions_no_check`] with the principal given by name.
    pub async fn set_permissions_by_name_no_check(
        &self,
        folder_id: FolderId,
        principal_name: &str,
        actions: ActionSet,
    ) -> AppResult<()> {
        let principal = self.directory.resolve_principal(principal_name).await?;
        self.set_permissions_no_check(folder_id, principal, actions)
            .await
    }

    /// Remove every grant on a folder.
    pub async fn clear_acl_no_check(&self, folder_id: FolderId) -> AppResult<u64> {
        self.acl.clear_acl(folder_id).await
    }

    /// The folder's ACL as text.
    pub async fn acl_text(&self, folder_id: FolderId) -> AppResult<String> {
        self.acl.acl_text(folder_id).await
    }
}
