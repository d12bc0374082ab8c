//! In-memory member store backed by a concurrent map.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use canopy_core::error::AppError;
use canopy_core::result::AppResult;
use canopy_core::types::{FolderId, MemberId};
use canopy_entity::member::FolderMember;

use crate::traits::{MemberCounter, MemberStore};

/// Stores members of one type keyed by their assigned id.
pub struct MemoryMemberStore<T: FolderMember> {
    rows: DashMap<MemberId, T>,
    next_id: AtomicI64,
}

impl<T: FolderMember> MemoryMemberStore<T> {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored members.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T: FolderMember> Default for MemoryMemberStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FolderMember> fmt::Debug for MemoryMemberStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryMemberStore")
            .field("len", &self.rows.len())
            .finish()
    }
}

#[async_trait]
impl<T: FolderMember> MemberStore<T> for MemoryMemberStore<T> {
    async fn find_all(&self) -> AppResult<Vec<T>> {
        let mut rows: Vec<(MemberId, T)> = self
            .rows
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        rows.sort_by_key(|(id, _)| *id);
        Ok(rows.into_iter().map(|(_, v)| v).collect())
    }

    async fn find_by_id(&self, id: MemberId) -> AppResult<Option<T>> {
        Ok(self.rows.get(&id).map(|r| r.value().clone()))
    }

    async fn find_in_folders(&self, folders: &BTreeSet<FolderId>) -> AppResult<Vec<T>> {
        let all = self.find_all().await?;
        Ok(all
            .into_iter()
            .filter(|m| m.folders().iter().any(|f| folders.contains(f)))
            .collect())
    }

    async fn insert(&self, entity: T) -> AppResult<T> {
        if entity.is_persisted() {
            return Err(AppError::invalid_argument(
                "Cannot insert a member that already has an id",
            ));
        }
        let id = MemberId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let stored = entity.with_member_id(id);
        self.rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, entity: &T) -> AppResult<T> {
        let id = entity
            .member_id()
            .ok_or_else(|| AppError::invalid_argument("Cannot update a member without an id"))?;
        let mut row = self
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Member {id} not found")))?;
        *row = entity.clone();
        Ok(entity.clone())
    }

    async fn delete(&self, id: MemberId) -> AppResult<bool> {
        Ok(self.rows.remove(&id).is_some())
    }
}

#[async_trait]
impl<T: FolderMember> MemberCounter for MemoryMemberStore<T> {
    async fn count_in_folder(&self, folder_id: FolderId) -> AppResult<u64> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.value().folders().contains(&folder_id))
            .count() as u64)
    }
}
