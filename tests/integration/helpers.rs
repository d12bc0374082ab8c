//! Shared test fixture.

use std::collections::BTreeMap;
use std::sync::Arc;

use canopy::{ActionSet, AppConfig, Canopy, Folder, FolderMember, MemberAuthorizer, Requester};
use canopy_core::types::{FolderId, MemberId};
use canopy_database::MemoryDirectory;
use canopy_database::MemoryMemberStore;
use canopy_entity::principal::{Principal, User};

/// Permission levels used by the per-group fixture folders.
pub const LEVELS: [&str; 4] = ["all", "write", "read", "none"];

/// A member type for tests: a named item filed in folders.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: Option<MemberId>,
    pub name: String,
    pub folders: Vec<FolderId>,
}

impl Item {
    pub fn new(name: &str, folders: &[FolderId]) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            folders: folders.to_vec(),
        }
    }
}

impl FolderMember for Item {
    fn member_id(&self) -> Option<MemberId> {
        self.id
    }

    fn with_member_id(mut self, id: MemberId) -> Self {
        self.id = Some(id);
        self
    }

    fn folders(&self) -> &[FolderId] {
        &self.folders
    }
}

/// Test application context.
///
/// The root grants READ to `group:anyuser`. `/f1` grants alice ALL, bob
/// WRITE and clara READ, and nothing to anyone else. For each level in
/// [`LEVELS`] there is `/anyuser_<level>` granting only `group:anyuser`
/// that level and `/authuser_<level>` granting only `group:authuser`, each
/// holding one item named `foo`.
pub struct TestApp {
    pub canopy: Canopy,
    pub directory: Arc<MemoryDirectory>,
    pub items: MemberAuthorizer<Item>,
    pub item_store: Arc<MemoryMemberStore<Item>>,
    pub admin: Requester,
    pub alice: Requester,
    pub bob: Requester,
    pub clara: Requester,
    pub dave: Requester,
    pub root: Folder,
    pub f1: Folder,
    pub anyuser_dir: BTreeMap<&'static str, Folder>,
    pub authuser_dir: BTreeMap<&'static str, Folder>,
}

impl TestApp {
    /// Create a new test application with default configuration.
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    /// Create a new test application.
    pub async fn with_config(config: AppConfig) -> Self {
        let directory = Arc::new(MemoryDirectory::new());
        let canopy = Canopy::in_memory(config, directory.clone());

        let admin = directory
            .insert_user(User::new(canopy_core::types::UserId::new(1000), "admin").superuser())
            .await
            .expect("Failed to create admin");
        let alice = directory.create_user("alice").await.expect("Failed to create alice");
        let bob = directory.create_user("bob").await.expect("Failed to create bob");
        let clara = directory.create_user("clara").await.expect("Failed to create clara");
        let dave = directory.create_user("dave").await.expect("Failed to create dave");

        let item_store = Arc::new(MemoryMemberStore::new());
        let items = canopy.members(item_store.clone()).await;

        let folders = canopy.folders();
        let root = folders.root_folder().await.expect("Failed to load root");
        folders
            .set_permissions_no_check(root.id, Principal::ANY_USER, ActionSet::READ)
            .await
            .expect("Failed to grant root");

        let f1 = folders
            .create_subfolder_no_check(root.id, "f1", None)
            .await
            .expect("Failed to create f1");
        for (name, actions) in [
            ("alice", ActionSet::ALL),
            ("bob", ActionSet::WRITE),
            ("clara", ActionSet::READ),
            ("group:anyuser", ActionSet::NONE),
        ] {
            folders
                .set_permissions_by_name_no_check(f1.id, name, actions)
                .await
                .expect("Failed to grant f1");
        }

        let mut app = Self {
            canopy,
            directory,
            items,
            item_store,
            admin: Requester::User(admin),
            alice: Requester::User(alice),
            bob: Requester::User(bob),
            clara: Requester::User(clara),
            dave: Requester::User(dave),
            root,
            f1,
            anyuser_dir: BTreeMap::new(),
            authuser_dir: BTreeMap::new(),
        };

        for level in LEVELS {
            let folder = app.make_folder_with_perms("group:anyuser", level).await;
            app.anyuser_dir.insert(level, folder);
            let folder = app.make_folder_with_perms("group:authuser", level).await;
            app.authuser_dir.insert(level, folder);
        }
        app
    }

    /// `/<group>_<level>` granting only `principal` the named level, with
    /// one item inside.
    async fn make_folder_with_perms(&self, principal: &str, level: &str) -> Folder {
        let folders = self.canopy.folders();
        let actions: ActionSet = level.parse().expect("Invalid level");
        let prefix = principal.trim_start_matches("group:");

        let folder = folders
            .create_subfolder_no_check(self.root.id, &format!("{prefix}_{level}"), None)
            .await
            .expect("Failed to create fixture folder");
        folders
            .clear_acl_no_check(folder.id)
            .await
            .expect("Failed to clear ACL");
        folders
            .set_permissions_by_name_no_check(folder.id, principal, actions)
            .await
            .expect("Failed to grant fixture folder");

        self.insert_item("foo", &[folder.id]).await;
        folder
    }

    /// Store an item without permission checks.
    pub async fn insert_item(&self, name: &str, folders: &[FolderId]) -> Item {
        use canopy_database::traits::MemberStore;
        self.item_store
            .insert(Item::new(name, folders))
            .await
            .expect("Failed to insert item")
    }

    /// Names of items the requester may view that live in `folder`.
    pub async fn visible_in(&self, requester: &Requester, folder: &Folder) -> Vec<String> {
        self.items
            .allowed(requester)
            .await
            .expect("allowed() failed")
            .into_iter()
            .filter(|i| i.folders.contains(&folder.id))
            .map(|i| i.name)
            .collect()
    }
}
