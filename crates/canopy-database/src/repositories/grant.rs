//! Permission grant repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use canopy_core::error::{AppError, ErrorKind};
use canopy_core::result::AppResult;
use canopy_core::types::FolderId;
use canopy_entity::permission::{Action, ActionSet, PermissionGrant};
use canopy_entity::principal::Principal;

use crate::traits::GrantStore;

const COLUMNS: &str = "folder_id, principal_kind, principal_id, actions";

/// Raw `folder_permissions` row.
#[derive(Debug, sqlx::FromRow)]
struct GrantRow {
    folder_id: FolderId,
    principal_kind: String,
    principal_id: i64,
    actions: i16,
}

impl TryFrom<GrantRow> for PermissionGrant {
    type Error = AppError;

    fn try_from(row: GrantRow) -> Result<Self, Self::Error> {
        let principal = Principal::from_parts(&row.principal_kind, row.principal_id)
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Unknown principal kind '{}' in folder_permissions",
                    row.principal_kind
                ))
            })?;
        Ok(PermissionGrant::new(
            row.folder_id,
            principal,
            ActionSet::from_i16(row.actions),
        ))
    }
}

fn into_grants(rows: Vec<GrantRow>) -> AppResult<Vec<PermissionGrant>> {
    rows.into_iter().map(PermissionGrant::try_from).collect()
}

/// Repository for folder permission rows.
#[derive(Debug, Clone)]
pub struct PgGrantRepository {
    pool: PgPool,
}

impl PgGrantRepository {
    /// Create a new grant repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrantStore for PgGrantRepository {
    async fn find(
        &self,
        folder_id: FolderId,
        principal: Principal,
    ) -> AppResult<Option<PermissionGrant>> {
        let row = sqlx::query_as::<_, GrantRow>(&format!(
            "SELECT {COLUMNS} FROM folder_permissions \
             WHERE folder_id = $1 AND principal_kind = $2 AND principal_id = $3"
        ))
        .bind(folder_id)
        .bind(principal.kind())
        .bind(principal.raw_id())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find grant", e))?;
        row.map(PermissionGrant::try_from).transpose()
    }

    async fn find_by_folder(&self, folder_id: FolderId) -> AppResult<Vec<PermissionGrant>> {
        let rows = sqlx::query_as::<_, GrantRow>(&format!(
            "SELECT {COLUMNS} FROM folder_permissions WHERE folder_id = $1 \
             ORDER BY principal_kind DESC, principal_id ASC"
        ))
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list folder grants", e)
        })?;
        into_grants(rows)
    }

    async fn find_allowing(&self, action: Action) -> AppResult<Vec<PermissionGrant>> {
        let rows = sqlx::query_as::<_, GrantRow>(&format!(
            "SELECT {COLUMNS} FROM folder_permissions WHERE (actions & $1) <> 0"
        ))
        .bind(action.bit().to_i16())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to scan grants by action", e)
        })?;
        into_grants(rows)
    }

    async fn upsert(&self, grant: &PermissionGrant) -> AppResult<()> {
        if grant.actions.is_empty() {
            return Err(AppError::invalid_argument(
                "Refusing to store a grant with no actions",
            ));
        }
        sqlx::query(
            "INSERT INTO folder_permissions (folder_id, principal_kind, principal_id, actions) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (folder_id, principal_kind, principal_id) \
             DO UPDATE SET actions = EXCLUDED.actions",
        )
        .bind(grant.folder_id)
        .bind(grant.principal.kind())
        .bind(grant.principal.raw_id())
        .bind(grant.actions.to_i16())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::not_found(format!("Folder {} does not exist", grant.folder_id))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to upsert grant", e),
        })?;
        Ok(())
    }

    async fn delete(&self, folder_id: FolderId, principal: Principal) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM folder_permissions \
             WHERE folder_id = $1 AND principal_kind = $2 AND principal_id = $3",
        )
        .bind(folder_id)
        .bind(principal.kind())
        .bind(principal.raw_id())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete grant", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_folder(&self, folder_id: FolderId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM folder_permissions WHERE folder_id = $1")
            .bind(folder_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear folder grants", e)
            })?;
        Ok(result.rows_affected())
    }
}
