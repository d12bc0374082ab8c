//! In-memory identity directory.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use canopy_core::error::AppError;
use canopy_core::result::AppResult;
use canopy_core::types::{GroupId, UserId};
use canopy_entity::principal::{GROUP_PREFIX, Group, User};

use crate::traits::Directory;

/// Name of the implicit group matching every request.
pub const ANY_USER_NAME: &str = "anyuser";
/// Name of the implicit group matching every active user.
pub const AUTH_USER_NAME: &str = "authuser";

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    groups: HashMap<GroupId, Group>,
    next_user_id: i64,
    next_group_id: i64,
}

/// Users and groups held in memory.
///
/// Always contains the two implicit groups, `anyuser` and `authuser`.
#[derive(Debug)]
pub struct MemoryDirectory {
    state: RwLock<State>,
}

impl MemoryDirectory {
    /// A directory with only the implicit groups.
    pub fn new() -> Self {
        let mut groups = HashMap::new();
        for group in [
            Group::new(GroupId::ANY_USER, ANY_USER_NAME),
            Group::new(GroupId::AUTH_USER, AUTH_USER_NAME),
        ] {
            groups.insert(group.id, group);
        }
        Self {
            state: RwLock::new(State {
                users: HashMap::new(),
                groups,
                next_user_id: 1,
                next_group_id: GroupId::AUTH_USER.get() + 1,
            }),
        }
    }

    /// Register an active user with the next free id.
    pub async fn create_user(&self, username: &str) -> AppResult<User> {
        let mut state = self.state.write().await;
        let id = UserId::new(state.next_user_id);
        let user = User::new(id, username);
        Self::insert_user_locked(&mut state, user.clone())?;
        Ok(user)
    }

    /// Register a fully specified user, replacing any user with the same id.
    pub async fn insert_user(&self, user: User) -> AppResult<User> {
        let mut state = self.state.write().await;
        Self::insert_user_locked(&mut state, user.clone())?;
        Ok(user)
    }

    /// Register a group with the next free id.
    pub async fn create_group(&self, name: &str) -> AppResult<Group> {
        let mut state = self.state.write().await;
        if state.groups.values().any(|g| g.name == name) {
            return Err(AppError::conflict(format!("Group '{name}' already exists")));
        }
        let group = Group::new(GroupId::new(state.next_group_id), name);
        state.next_group_id += 1;
        state.groups.insert(group.id, group.clone());
        info!(group_id = %group.id, name, "Group created");
        Ok(group)
    }

    /// Add an existing user to an existing group.
    pub async fn add_to_group(&self, user_id: UserId, group_id: GroupId) -> AppResult<User> {
        let mut state = self.state.write().await;
        if !state.groups.contains_key(&group_id) {
            return Err(AppError::not_found(format!("Group {group_id} not found")));
        }
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        if !user.groups.contains(&group_id) {
            user.groups.push(group_id);
        }
        Ok(user.clone())
    }

    fn insert_user_locked(state: &mut State, user: User) -> AppResult<()> {
        if user.username.starts_with(GROUP_PREFIX) {
            return Err(AppError::invalid_argument(format!(
                "Username '{}' must not start with '{GROUP_PREFIX}'",
                user.username
            )));
        }
        if state
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(AppError::conflict(format!(
                "User '{}' already exists",
                user.username
            )));
        }
        state.next_user_id = state.next_user_id.max(user.id.get() + 1);
        info!(user_id = %user.id, username = %user.username, "User registered");
        state.users.insert(user.id, user);
        Ok(())
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_name(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_group(&self, id: GroupId) -> AppResult<Option<Group>> {
        Ok(self.state.read().await.groups.get(&id).cloned())
    }

    async fn find_group_by_name(&self, name: &str) -> AppResult<Option<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.values().find(|g| g.name == name).cloned())
    }
}
