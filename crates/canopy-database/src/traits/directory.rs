//! Identity directory boundary.

use async_trait::async_trait;

use canopy_core::error::AppError;
use canopy_core::result::AppResult;
use canopy_core::types::{GroupId, UserId};
use canopy_entity::principal::{GROUP_PREFIX, Group, Principal, Requester, User};

/// Who the users and groups are.
///
/// Only the four `find_*` lookups are required; everything else is derived
/// from them.
#[async_trait]
pub trait Directory: Send + Sync + std::fmt::Debug + 'static {
    /// A user by id.
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>>;

    /// A user by login name.
    async fn find_user_by_name(&self, username: &str) -> AppResult<Option<User>>;

    /// A group by id.
    async fn find_group(&self, id: GroupId) -> AppResult<Option<Group>>;

    /// A group by name (without the `group:` prefix).
    async fn find_group_by_name(&self, name: &str) -> AppResult<Option<Group>>;

    /// Whether the user exists and is active.
    async fn is_active(&self, id: UserId) -> AppResult<bool> {
        Ok(self.find_user(id).await?.is_some_and(|u| u.is_active))
    }

    /// Whether the user exists and is a superuser.
    async fn is_superuser(&self, id: UserId) -> AppResult<bool> {
        Ok(self.find_user(id).await?.is_some_and(|u| u.is_superuser))
    }

    /// Explicit group memberships of a user.
    async fn groups_of(&self, id: UserId) -> AppResult<Vec<GroupId>> {
        Ok(self.find_user(id).await?.map(|u| u.groups).unwrap_or_default())
    }

    /// Resolve `group:X` to group X and any other name to a user.
    async fn resolve_principal(&self, name: &str) -> AppResult<Principal> {
        if let Some(group_name) = name.strip_prefix(GROUP_PREFIX) {
            return self
                .find_group_by_name(group_name)
                .await?
                .map(|g| Principal::Group(g.id))
                .ok_or_else(|| AppError::not_found(format!("Group '{group_name}' not found")));
        }
        self.find_user_by_name(name)
            .await?
            .map(|u| Principal::User(u.id))
            .ok_or_else(|| AppError::not_found(format!("User '{name}' not found")))
    }

    /// Display name of a principal, with groups rendered as `group:X`.
    ///
    /// Principals missing from the directory fall back to `user:<id>` or
    /// `group:<id>`.
    async fn principal_name(&self, principal: Principal) -> AppResult<String> {
        let name = match principal {
            Principal::User(id) => self
                .find_user(id)
                .await?
                .map(|u| u.username)
                .unwrap_or_else(|| format!("user:{id}")),
            Principal::Group(id) => {
                let name = self
                    .find_group(id)
                    .await?
                    .map(|g| g.name)
                    .unwrap_or_else(|| id.to_string());
                format!("{GROUP_PREFIX}{name}")
            }
        };
        Ok(name)
    }

    /// Load the requester for a request: `None` is anonymous.
    async fn requester(&self, user: Option<UserId>) -> AppResult<Requester> {
        match user {
            None => Ok(Requester::Anonymous),
            Some(id) => self
                .find_user(id)
                .await?
                .map(Requester::User)
                .ok_or_else(|| AppError::not_found(format!("User {id} not found"))),
        }
    }
}
