//! Immutable folder tree snapshot.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::error;

use canopy_core::error::AppError;
use canopy_core::result::AppResult;
use canopy_core::types::FolderId;
use canopy_entity::folder::Folder;

use super::path::{ROOT_PATH, child_path};

/// A folder with its absolute path and child index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderNode {
    /// The folder row.
    pub folder: Folder,
    /// Absolute path; the root is `/`.
    pub path: String,
    /// Child name to child id.
    pub children: BTreeMap<String, FolderId>,
}

/// Every folder reachable from the root, indexed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderTree {
    root: FolderId,
    nodes: BTreeMap<FolderId, FolderNode>,
}

impl FolderTree {
    /// Build the tree from every folder row.
    ///
    /// Fails with an internal error unless exactly one folder has no parent
    /// and every folder is reachable from it.
    pub fn build(folders: Vec<Folder>) -> AppResult<Self> {
        let total = folders.len();
        let mut roots = Vec::new();
        let mut by_parent: BTreeMap<FolderId, Vec<Folder>> = BTreeMap::new();
        for folder in folders {
            match folder.parent_id {
                None => roots.push(folder),
                Some(parent_id) => by_parent.entry(parent_id).or_default().push(folder),
            }
        }

        if roots.len() != 1 {
            error!(roots = roots.len(), "Folder store must contain exactly one root");
            return Err(AppError::internal(format!(
                "Folder store must contain exactly one root, found {}",
                roots.len()
            )));
        }
        let root = roots.remove(0);
        let root_id = root.id;

        let mut nodes = BTreeMap::new();
        let mut queue = VecDeque::from([(root, ROOT_PATH.to_string())]);
        while let Some((folder, path)) = queue.pop_front() {
            let mut children = BTreeMap::new();
            for child in by_parent.remove(&folder.id).unwrap_or_default() {
                children.insert(child.name.clone(), child.id);
                let path_of_child = child_path(&path, &child.name);
                queue.push_back((child, path_of_child));
            }
            nodes.insert(folder.id, FolderNode {
                folder,
                path,
                children,
            });
        }

        if nodes.len() != total {
            error!(
                reachable = nodes.len(),
                total, "Folder store contains folders unreachable from the root"
            );
            return Err(AppError::internal(format!(
                "{} folders are unreachable from the root",
                total - nodes.len()
            )));
        }

        Ok(Self {
            root: root_id,
            nodes,
        })
    }

    /// The root node.
    pub fn root(&self) -> &FolderNode {
        // `build` guarantees the root is present.
        &self.nodes[&self.root]
    }

    /// A node by folder id.
    pub fn node(&self, id: FolderId) -> Option<&FolderNode> {
        self.nodes.get(&id)
    }

    /// The parent id of a folder, or `None` for the root and unknown ids.
    pub fn parent_of(&self, id: FolderId) -> Option<FolderId> {
        self.nodes.get(&id).and_then(|n| n.folder.parent_id)
    }

    /// Whether the tree contains `id`.
    pub fn contains(&self, id: FolderId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// The named child of `parent`.
    pub fn child(&self, parent: FolderId, name: &str) -> Option<&FolderNode> {
        self.nodes
            .get(&parent)
            .and_then(|n| n.children.get(name))
            .and_then(|id| self.nodes.get(id))
    }

    /// Every folder id, ascending.
    pub fn ids(&self) -> impl Iterator<Item = FolderId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of folders.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a built tree.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
