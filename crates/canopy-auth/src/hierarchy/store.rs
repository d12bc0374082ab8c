//! Folder hierarchy store with cached snapshots.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use canopy_cache::{ResultCache, keys};
use canopy_core::error::{AccessDenial, AppError};
use canopy_core::result::AppResult;
use canopy_core::types::FolderId;
use canopy_database::traits::FolderStore;
use canopy_entity::folder::Folder;
use canopy_entity::permission::Action;

use super::path;
use super::tree::FolderTree;

/// Folders a requester may list, checked at every step of a path walk.
#[derive(Debug, Clone)]
pub struct ListGuard {
    /// Display name of the requester, for denial messages.
    pub requester: String,
    /// Folders the requester holds LIST on, ancestry included.
    pub listable: BTreeSet<FolderId>,
}

/// Read access to the folder tree.
#[derive(Debug, Clone)]
pub struct FolderHierarchy {
    folders: Arc<dyn FolderStore>,
    cache: ResultCache,
}

impl FolderHierarchy {
    /// Create a hierarchy over `folders`, memoizing snapshots in `cache`.
    pub fn new(folders: Arc<dyn FolderStore>, cache: ResultCache) -> Self {
        Self { folders, cache }
    }

    /// The backing folder store.
    pub fn store(&self) -> &Arc<dyn FolderStore> {
        &self.folders
    }

    /// The result cache shared with the resolver.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// The current folder tree.
    pub async fn snapshot(&self) -> AppResult<Arc<FolderTree>> {
        let tree = self
            .cache
            .memoize(keys::FOLDER_TREE, &(), || async {
                debug!("Building folder tree snapshot");
                FolderTree::build(self.folders.find_all().await?)
            })
            .await?;
        Ok(Arc::new(tree))
    }

    /// The root folder.
    pub async fn root_folder(&self) -> AppResult<Folder> {
        Ok(self.snapshot().await?.root().folder.clone())
    }

    /// A folder by id, or `NotFound`.
    pub async fn folder(&self, id: FolderId) -> AppResult<Folder> {
        self.snapshot()
            .await?
            .node(id)
            .map(|n| n.folder.clone())
            .ok_or_else(|| AppError::not_found(format!("Folder {id} does not exist")))
    }

    /// Absolute path of a folder.
    pub async fn path_of(&self, id: FolderId) -> AppResult<String> {
        self.snapshot()
            .await?
            .node(id)
            .map(|n| n.path.clone())
            .ok_or_else(|| AppError::not_found(format!("Folder {id} does not exist")))
    }

    /// Resolve `path` relative to `working`.
    ///
    /// With a guard, the requester must be able to list each folder before
    /// descending into it. A denial names the first folder that blocked the
    /// walk, never the requested target.
    pub async fn resolve(
        &self,
        path: &str,
        working: FolderId,
        guard: Option<&ListGuard>,
    ) -> AppResult<Folder> {
        let tree = self.snapshot().await?;
        let working_path = tree
            .node(working)
            .map(|n| n.path.as_str())
            .ok_or_else(|| AppError::not_found(format!("Working folder {working} does not exist")))?;
        let context = format!(
            "while trying to access folder '{path}' from working folder '{working_path}'"
        );

        let mut current = tree.root();
        for segment in path::normalize(path, working_path) {
            if let Some(guard) = guard {
                if !guard.listable.contains(&current.folder.id) {
                    debug!(
                        requester = %guard.requester,
                        folder = %current.path,
                        "Path walk denied"
                    );
                    let message = format!(
                        "{context}: user {} is not allowed to list folder '{}'",
                        guard.requester, current.path
                    );
                    let denial =
                        AccessDenial::new(&guard.requester, Action::List.as_str(), &current.path);
                    return Err(AppError::access_denied_with(denial, message));
                }
            }
            current = tree.child(current.folder.id, segment).ok_or_else(|| {
                AppError::not_found(format!(
                    "{context}: folder '{}' does not exist",
                    path::child_path(&current.path, segment)
                ))
            })?;
        }
        Ok(current.folder.clone())
    }
}

#[cfg(test)]
mod tests {
    use canopy_core::config::cache::{CacheConfig, MemoryCacheConfig};
    use canopy_database::memory::MemoryStore;
    use canopy_entity::folder::NewFolder;

    use super::*;

    async fn setup() -> (FolderHierarchy, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(canopy_cache::memory::MemoryCacheProvider::new(
            &MemoryCacheConfig::default(),
        ));
        let cache = ResultCache::new(provider, &CacheConfig::default());
        let a = store.create(&NewFolder::child(FolderId::ROOT, "a")).await.unwrap();
        store.create(&NewFolder::child(a.id, "b")).await.unwrap();
        (FolderHierarchy::new(store.clone(), cache), store)
    }

    #[tokio::test]
    async fn test_resolve_absolute_and_relative() {
        let (hierarchy, _) = setup().await;
        let b = hierarchy.resolve("/a/b", FolderId::ROOT, None).await.unwrap();
        assert_eq!(b.name, "b");
        let a = hierarchy.resolve("..", b.id, None).await.unwrap();
        assert_eq!(a.name, "a");
        let same = hierarchy.resolve("b/.", a.id, None).await.unwrap();
        assert_eq!(same.id, b.id);
        let root = hierarchy.resolve("/", b.id, None).await.unwrap();
        assert!(root.is_root());
    }

    #[tokio::test]
    async fn test_resolve_missing_names_folder() {
        let (hierarchy, _) = setup().await;
        let err = hierarchy.resolve("/a/zz/b", FolderId::ROOT, None).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.message.ends_with("folder '/a/zz' does not exist"));
    }

    #[tokio::test]
    async fn test_guard_reports_first_blocking_folder() {
        let (hierarchy, _) = setup().await;
        let guard = ListGuard {
            requester: "dave".to_string(),
            listable: [FolderId::ROOT].into_iter().collect(),
        };
        let err = hierarchy
            .resolve("/a/b", FolderId::ROOT, Some(&guard))
            .await
            .unwrap_err();
        assert!(err.is_access_denied());
        assert_eq!(err.denial.unwrap().folder, "/a");
    }

    #[tokio::test]
    async fn test_snapshot_is_memoized_until_bump() {
        let (hierarchy, store) = setup().await;
        assert_eq!(hierarchy.snapshot().await.unwrap().len(), 3);

        store.create(&NewFolder::child(FolderId::ROOT, "c")).await.unwrap();
        assert_eq!(hierarchy.snapshot().await.unwrap().len(), 3);

        hierarchy.cache().bump_generation();
        assert_eq!(hierarchy.snapshot().await.unwrap().len(), 4);
    }
}
