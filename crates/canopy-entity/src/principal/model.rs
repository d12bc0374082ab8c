//! Principal entity models.

use std::fmt;

use serde::{Deserialize, Serialize};

use canopy_core::types::{GroupId, UserId};

/// Prefix that marks a principal name as a group (`group:staff`).
pub const GROUP_PREFIX: &str = "group:";

/// Display name used for requests without a user.
pub const ANONYMOUS_NAME: &str = "<anonymous>";

/// A grantee: either a user or a group.
///
/// Resolved once at the directory boundary; downstream code matches on the
/// variant rather than inspecting types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Principal {
    /// A single user.
    User(UserId),
    /// A group of users, including the implicit ANY_USER and AUTH_USER groups.
    Group(GroupId),
}

impl Principal {
    /// The implicit group matching every request.
    pub const ANY_USER: Principal = Principal::Group(GroupId::ANY_USER);
    /// The implicit group matching every active, non-anonymous user.
    pub const AUTH_USER: Principal = Principal::Group(GroupId::AUTH_USER);

    /// Storage discriminator: `"user"` or `"group"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Group(_) => "group",
        }
    }

    /// Raw id of the user or group.
    pub fn raw_id(&self) -> i64 {
        match self {
            Self::User(id) => id.get(),
            Self::Group(id) => id.get(),
        }
    }

    /// Rebuild a principal from its storage discriminator and raw id.
    pub fn from_parts(kind: &str, raw_id: i64) -> Option<Self> {
        match kind {
            "user" => Some(Self::User(UserId::new(raw_id))),
            "group" => Some(Self::Group(GroupId::new(raw_id))),
            _ => None,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.raw_id())
    }
}

/// A user as known to the identity directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Inactive users are treated like anonymous requests.
    pub is_active: bool,
    /// Superusers bypass every permission check.
    pub is_superuser: bool,
    /// Explicit group memberships (never includes the implicit groups).
    pub groups: Vec<GroupId>,
}

impl User {
    /// An active, non-superuser account with no groups.
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_active: true,
            is_superuser: false,
            groups: Vec::new(),
        }
    }

    /// Builder-style superuser flag.
    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }

    /// Builder-style group membership.
    pub fn in_group(mut self, group: GroupId) -> Self {
        self.groups.push(group);
        self
    }
}

/// A group as known to the identity directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group identifier.
    pub id: GroupId,
    /// Group name, without the `group:` prefix.
    pub name: String,
}

impl Group {
    /// Create a new group.
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Whoever is asking for an operation: a user, or nobody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requester {
    /// No authenticated user.
    Anonymous,
    /// An authenticated user.
    User(User),
}

impl Requester {
    /// Display name used in denial messages.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Anonymous => ANONYMOUS_NAME,
            Self::User(user) => &user.username,
        }
    }

    /// Whether this requester bypasses all checks.
    pub fn is_superuser(&self) -> bool {
        matches!(self, Self::User(user) if user.is_superuser)
    }

    /// The user, if the requester is active. Inactive users only match
    /// ANY_USER grants, same as anonymous requests.
    pub fn active_user(&self) -> Option<&User> {
        match self {
            Self::User(user) if user.is_active => Some(user),
            _ => None,
        }
    }

    /// Principal to grant full control to when this requester creates a folder.
    pub fn as_principal(&self) -> Option<Principal> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(Principal::User(user.id)),
        }
    }
}

impl From<User> for Requester {
    fn from(user: User) -> Self {
        Self::User(user)
    }
}
