//! In-memory folder and grant store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use canopy_core::error::AppError;
use canopy_core::result::AppResult;
use canopy_core::types::FolderId;
use canopy_entity::folder::{Folder, NewFolder};
use canopy_entity::permission::{Action, ActionSet, PermissionGrant};
use canopy_entity::principal::Principal;

use crate::traits::{FolderStore, GrantStore};

#[derive(Debug)]
struct State {
    folders: BTreeMap<FolderId, Folder>,
    grants: BTreeMap<(FolderId, Principal), ActionSet>,
    next_id: i64,
}

impl State {
    fn sibling_exists(
        &self,
        parent_id: Option<FolderId>,
        name: &str,
        except: Option<FolderId>,
    ) -> bool {
        self.folders
            .values()
            .any(|f| f.parent_id == parent_id && f.name == name && Some(f.id) != except)
    }
}

/// Folders and grants held in one lock.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// A store containing only the root folder, with id [`FolderId::ROOT`].
    pub fn new() -> Self {
        let root = NewFolder::root().into_folder(FolderId::ROOT);
        let mut folders = BTreeMap::new();
        folders.insert(root.id, root);
        Self {
            state: RwLock::new(State {
                folders,
                grants: BTreeMap::new(),
                next_id: FolderId::ROOT.get() + 1,
            }),
        }
    }

    /// A store with no folders at all, not even the root.
    pub fn empty() -> Self {
        Self {
            state: RwLock::new(State {
                folders: BTreeMap::new(),
                grants: BTreeMap::new(),
                next_id: FolderId::ROOT.get(),
            }),
        }
    }

    /// Number of stored grant rows.
    pub async fn grant_count(&self) -> usize {
        self.state.read().await.grants.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FolderStore for MemoryStore {
    async fn find_all(&self) -> AppResult<Vec<Folder>> {
        Ok(self.state.read().await.folders.values().cloned().collect())
    }

    async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        Ok(self.state.read().await.folders.get(&id).cloned())
    }

    async fn find_child(&self, parent_id: FolderId, name: &str) -> AppResult<Option<Folder>> {
        let state = self.state.read().await;
        Ok(state
            .folders
            .values()
            .find(|f| f.parent_id == Some(parent_id) && f.name == name)
            .cloned())
    }

    async fn create(&self, data: &NewFolder) -> AppResult<Folder> {
        let mut state = self.state.write().await;
        if let Some(parent_id) = data.parent_id {
            if !state.folders.contains_key(&parent_id) {
                return Err(AppError::not_found(format!(
                    "Parent folder {parent_id} does not exist"
                )));
            }
        }
        if state.sibling_exists(data.parent_id, &data.name, None) {
            return Err(AppError::conflict(format!(
                "Folder '{}' already exists",
                data.name
            )));
        }

        let id = FolderId::new(state.next_id);
        state.next_id += 1;
        let folder = data.clone().into_folder(id);
        state.folders.insert(id, folder.clone());
        Ok(folder)
    }

    async fn rename(&self, id: FolderId, new_name: &str) -> AppResult<Folder> {
        let mut state = self.state.write().await;
        let parent_id = state
            .folders
            .get(&id)
            .map(|f| f.parent_id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} does not exist")))?;
        if state.sibling_exists(parent_id, new_name, Some(id)) {
            return Err(AppError::conflict(format!(
                "Folder '{new_name}' already exists"
            )));
        }
        let folder = state
            .folders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} does not exist")))?;
        folder.name = new_name.to_string();
        folder.updated_at = Utc::now();
        Ok(folder.clone())
    }

    async fn delete(&self, id: FolderId) -> AppResult<bool> {
        Ok(self.state.write().await.folders.remove(&id).is_some())
    }

    async fn count_children(&self, id: FolderId) -> AppResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .folders
            .values()
            .filter(|f| f.parent_id == Some(id))
            .count() as u64)
    }
}

#[async_trait]
impl GrantStore for MemoryStore {
    async fn find(
        &self,
        folder_id: FolderId,
        principal: Principal,
    ) -> AppResult<Option<PermissionGrant>> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .get(&(folder_id, principal))
            .map(|actions| PermissionGrant::new(folder_id, principal, *actions)))
    }

    async fn find_by_folder(&self, folder_id: FolderId) -> AppResult<Vec<PermissionGrant>> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .range((folder_id, Principal::User(i64::MIN.into()))..)
            .take_while(|((f, _), _)| *f == folder_id)
            .map(|((f, p), actions)| PermissionGrant::new(*f, *p, *actions))
            .collect())
    }

    async fn find_allowing(&self, action: Action) -> AppResult<Vec<PermissionGrant>> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .iter()
            .filter(|(_, actions)| actions.allows(action))
            .map(|((f, p), actions)| PermissionGrant::new(*f, *p, *actions))
            .collect())
    }

    async fn upsert(&self, grant: &PermissionGrant) -> AppResult<()> {
        if grant.actions.is_empty() {
            return Err(AppError::invalid_argument(
                "Refusing to store a grant with no actions",
            ));
        }
        let mut state = self.state.write().await;
        if !state.folders.contains_key(&grant.folder_id) {
            return Err(AppError::not_found(format!(
                "Folder {} does not exist",
                grant.folder_id
            )));
        }
        state
            .grants
            .insert((grant.folder_id, grant.principal), grant.actions);
        Ok(())
    }

    async fn delete(&self, folder_id: FolderId, principal: Principal) -> AppResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.grants.remove(&(folder_id, principal)).is_some())
    }

    async fn delete_by_folder(&self, folder_id: FolderId) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let before = state.grants.len();
        state.grants.retain(|(f, _), _| *f != folder_id);
        let removed = (before - state.grants.len()) as u64;
        if removed > 0 {
            info!(folder_id = %folder_id, removed, "Cleared folder grants");
        }
        Ok(removed)
    }
}
