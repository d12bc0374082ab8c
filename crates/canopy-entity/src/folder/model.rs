//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use canopy_core::error::AppError;
use canopy_core::result::AppResult;
use canopy_core::types::FolderId;

/// Maximum length of a folder name, in characters.
pub const MAX_FOLDER_NAME_LEN: usize = 32;

/// A node in the authorization hierarchy.
///
/// `(name, parent_id)` is unique, and exactly one folder (the root) has no
/// parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Folder {
    /// Store-assigned folder identifier.
    pub id: FolderId,
    /// Folder name, unique among its siblings.
    pub name: String,
    /// Parent folder (`None` only for the root).
    pub parent_id: Option<FolderId>,
    /// Free-form notes.
    pub notes: String,
    /// Globally unique external identifier.
    pub uuid: Uuid,
    /// Open-ended key/value extension map (a JSON object).
    pub extras: serde_json::Value,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is the root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Name used in messages; the unnamed root reads as `/`.
    pub fn label(&self) -> &str {
        if self.is_root() && self.name.is_empty() {
            "/"
        } else {
            &self.name
        }
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFolder {
    /// Folder name.
    pub name: String,
    /// Parent folder; `None` is only valid when seeding the root.
    pub parent_id: Option<FolderId>,
    /// Free-form notes.
    pub notes: String,
    /// Extension map.
    pub extras: serde_json::Value,
}

impl NewFolder {
    /// A child folder with empty notes and extras.
    pub fn child(parent_id: FolderId, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: Some(parent_id),
            notes: String::new(),
            extras: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// The root folder.
    pub fn root() -> Self {
        Self {
            name: String::new(),
            parent_id: None,
            notes: String::new(),
            extras: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Materialize the row with a store-assigned id.
    pub fn into_folder(self, id: FolderId) -> Folder {
        let now = Utc::now();
        Folder {
            id,
            name: self.name,
            parent_id: self.parent_id,
            notes: self.notes,
            uuid: Uuid::new_v4(),
            extras: self.extras,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validate a child folder name.
///
/// Names must be non-empty, at most [`MAX_FOLDER_NAME_LEN`] characters,
/// contain no `/`, and must not be `.` or `..`.
pub fn validate_folder_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::invalid_argument("Folder name cannot be empty"));
    }
    if name.chars().count() > MAX_FOLDER_NAME_LEN {
        return Err(AppError::invalid_argument(format!(
            "Folder name '{name}' exceeds {MAX_FOLDER_NAME_LEN} characters"
        )));
    }
    if name.contains('/') || name == "." || name == ".." {
        return Err(AppError::invalid_argument(format!(
            "Folder name '{name}' is not a valid path segment"
        )));
    }
    Ok(())
}
