//! Allowed-folder computation and allow/deny decisions.
//!
//! A grant on a folder is *local*: it says nothing about whether the
//! requester can reach the folder. Reachability comes from LIST:
//!
//! 1. `local_allowed_folders` collects folders granted the action to
//!    ANY_USER and, for an active user, to AUTH_USER, to the user and to
//!    each of the user's groups.
//! 2. `listable_folders` is the local LIST set with every folder whose
//!    parent is not itself listable removed, repeated until nothing
//!    changes. Only folders listable all the way from the root survive.
//! 3. `allowed_folders` keeps the local set for an action where the
//!    folder's parent is listable (or the folder is the root).
//!
//! Superusers, and everyone when access control is disabled, bypass all
//! of this.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use canopy_cache::keys;
use canopy_core::config::access::AccessControlConfig;
use canopy_core::error::{AccessDenial, AppError};
use canopy_core::result::AppResult;
use canopy_core::types::FolderId;
use canopy_database::traits::GrantStore;
use canopy_entity::folder::Folder;
use canopy_entity::permission::Action;
use canopy_entity::principal::{Principal, Requester};

use super::scope::FolderScope;
use crate::hierarchy::{FolderHierarchy, FolderTree, ListGuard};

/// Decides what a requester may do where.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    hierarchy: FolderHierarchy,
    grants: Arc<dyn GrantStore>,
    enabled: bool,
}

impl PermissionResolver {
    /// Create a resolver. The hierarchy's result cache also memoizes
    /// folder sets.
    pub fn new(
        hierarchy: FolderHierarchy,
        grants: Arc<dyn GrantStore>,
        config: &AccessControlConfig,
    ) -> Self {
        Self {
            hierarchy,
            grants,
            enabled: config.enabled,
        }
    }

    /// The folder hierarchy this resolver reads.
    pub fn hierarchy(&self) -> &FolderHierarchy {
        &self.hierarchy
    }

    /// Whether the requester skips every check.
    pub fn bypasses(&self, requester: &Requester) -> bool {
        !self.enabled || requester.is_superuser()
    }

    /// Folders granted `action` to any principal the requester matches,
    /// ignoring ancestry.
    pub async fn local_allowed_folders(
        &self,
        requester: &Requester,
        action: Action,
    ) -> AppResult<BTreeSet<FolderId>> {
        let principals = matching_principals(requester);
        Ok(self
            .grants
            .find_allowing(action)
            .await?
            .into_iter()
            .filter(|g| principals.contains(&g.principal))
            .map(|g| g.folder_id)
            .collect())
    }

    /// Folders the requester can list through every ancestor.
    pub async fn listable_folders(&self, requester: &Requester) -> AppResult<BTreeSet<FolderId>> {
        self.hierarchy
            .cache()
            .memoize(keys::LISTABLE_FOLDERS, requester, || async {
                let tree = self.hierarchy.snapshot().await?;
                let local = self.local_allowed_folders(requester, Action::List).await?;
                Ok(listable_closure(&tree, local))
            })
            .await
    }

    /// Folders on which the requester holds `action` and whose parent is
    /// listable. For LIST this is [`Self::listable_folders`].
    pub async fn allowed_folders(
        &self,
        requester: &Requester,
        action: Action,
    ) -> AppResult<BTreeSet<FolderId>> {
        if action == Action::List {
            return self.listable_folders(requester).await;
        }
        self.hierarchy
            .cache()
            .memoize(keys::ALLOWED_FOLDERS, &(requester, action), || async {
                let tree = self.hierarchy.snapshot().await?;
                let listable = self.listable_folders(requester).await?;
                let local = self.local_allowed_folders(requester, action).await?;
                Ok(local
                    .into_iter()
                    .filter(|id| tree.contains(*id))
                    .filter(|id| tree.parent_of(*id).is_none_or(|p| listable.contains(&p)))
                    .collect())
            })
            .await
    }

    /// [`Self::allowed_folders`] with the bypass applied.
    pub async fn scope(&self, requester: &Requester, action: Action) -> AppResult<FolderScope> {
        if self.bypasses(requester) {
            return Ok(FolderScope::Unrestricted);
        }
        Ok(FolderScope::Folders(
            self.allowed_folders(requester, action).await?,
        ))
    }

    /// Whether the requester may perform `action` on the folder.
    pub async fn is_allowed(
        &self,
        requester: &Requester,
        folder_id: FolderId,
        action: Action,
    ) -> AppResult<bool> {
        Ok(self.scope(requester, action).await?.contains(folder_id))
    }

    /// Fail with `AccessDenied` unless [`Self::is_allowed`].
    pub async fn assert_allowed(
        &self,
        requester: &Requester,
        folder: &Folder,
        action: Action,
    ) -> AppResult<()> {
        if self.is_allowed(requester, folder.id, action).await? {
            return Ok(());
        }
        debug!(
            requester = %requester.display_name(),
            action = %action,
            folder_id = %folder.id,
            "Permission denied"
        );
        Err(AppError::access_denied(AccessDenial::new(
            requester.display_name(),
            action.as_str(),
            folder.label(),
        )))
    }

    /// Whether any of `folders` allows `action`.
    pub async fn is_allowed_by_any(
        &self,
        requester: &Requester,
        folders: &[FolderId],
        action: Action,
    ) -> AppResult<bool> {
        Ok(self.scope(requester, action).await?.contains_any(folders))
    }

    /// Fail with `AccessDenied` unless [`Self::is_allowed_by_any`]. The
    /// message lists every candidate folder.
    pub async fn assert_allowed_by_any(
        &self,
        requester: &Requester,
        folders: &[FolderId],
        action: Action,
    ) -> AppResult<()> {
        if self.is_allowed_by_any(requester, folders, action).await? {
            return Ok(());
        }
        let tree = self.hierarchy.snapshot().await?;
        let labels: Vec<String> = folders
            .iter()
            .map(|id| {
                tree.node(*id)
                    .map(|n| n.folder.label().to_string())
                    .unwrap_or_else(|| id.to_string())
            })
            .collect();
        let folder_list = format!("[{}]", labels.join(", "));
        debug!(
            requester = %requester.display_name(),
            action = %action,
            folders = %folder_list,
            "Permission denied on every candidate folder"
        );
        let message = format!(
            "user {} does not have {} permission for any folder in {}",
            requester.display_name(),
            action,
            folder_list
        );
        Err(AppError::access_denied_with(
            AccessDenial::new(requester.display_name(), action.as_str(), folder_list),
            message,
        ))
    }

    /// Keep the candidates with at least one folder that allows `action`.
    pub async fn filter_allowed<T, F>(
        &self,
        candidates: Vec<T>,
        requester: &Requester,
        action: Action,
        folders_of: F,
    ) -> AppResult<Vec<T>>
    where
        F: Fn(&T) -> &[FolderId],
    {
        match self.scope(requester, action).await? {
            FolderScope::Unrestricted => Ok(candidates),
            scope => Ok(candidates
                .into_iter()
                .filter(|c| scope.contains_any(folders_of(c)))
                .collect()),
        }
    }

    /// Resolve a path, requiring LIST on every folder walked through.
    pub async fn resolve_path(
        &self,
        path: &str,
        working: FolderId,
        requester: &Requester,
    ) -> AppResult<Folder> {
        let guard = self.list_guard(requester).await?;
        self.hierarchy.resolve(path, working, guard.as_ref()).await
    }

    /// The guard for a path walk, or `None` if the requester bypasses checks.
    pub async fn list_guard(&self, requester: &Requester) -> AppResult<Option<ListGuard>> {
        if self.bypasses(requester) {
            return Ok(None);
        }
        Ok(Some(ListGuard {
            requester: requester.display_name().to_string(),
            listable: self.listable_folders(requester).await?,
        }))
    }
}

/// Principals whose grants apply to the requester.
fn matching_principals(requester: &Requester) -> BTreeSet<Principal> {
    let mut principals = BTreeSet::from([Principal::ANY_USER]);
    if let Some(user) = requester.active_user() {
        principals.insert(Principal::AUTH_USER);
        principals.insert(Principal::User(user.id));
        principals.extend(user.groups.iter().map(|g| Principal::Group(*g)));
    }
    principals
}

/// Drop folders whose parent is not in the set until a fixed point.
fn listable_closure(tree: &FolderTree, local: BTreeSet<FolderId>) -> BTreeSet<FolderId> {
    let mut listable: BTreeSet<FolderId> =
        local.into_iter().filter(|id| tree.contains(*id)).collect();
    loop {
        let blocked: Vec<FolderId> = listable
            .iter()
            .copied()
            .filter(|id| tree.parent_of(*id).is_some_and(|p| !listable.contains(&p)))
            .collect();
        if blocked.is_empty() {
            return listable;
        }
        for id in blocked {
            listable.remove(&id);
        }
    }
}
