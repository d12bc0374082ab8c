//! Folder creation, removal and ACL changes through the folder service.

use std::collections::BTreeMap;

use canopy::{Action, ActionSet, Folder, Requester};
use canopy_core::ErrorKind;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_mkdir() {
    let app = TestApp::new().await;
    let folders = app.canopy.folders();

    for (requester, name) in [(&app.admin, "byAdmin"), (&app.alice, "byAlice"), (&app.bob, "byBob")] {
        let path = format!("/f1/{name}");
        folders.mkdir(&path, app.root.id, requester).await.unwrap();
        let found = folders.get_folder(&path, app.root.id, requester).await.unwrap();
        assert_eq!(found.name, name);
        assert_eq!(found.parent_id, Some(app.f1.id));
    }

    // clara has only read privileges
    let err = folders
        .mkdir("/f1/byClara", app.root.id, &app.clara)
        .await
        .unwrap_err();
    assert!(err.is_access_denied());
    assert!(folders.get_folder_no_check("/f1/byClara", app.root.id).await.is_err());
}

#[tokio::test]
async fn test_mkdir_relative_to_working_folder() {
    let app = TestApp::new().await;
    let folders = app.canopy.folders();

    let made = folders.mkdir("sub", app.f1.id, &app.alice).await.unwrap();
    assert_eq!(made.parent_id, Some(app.f1.id));
    let found = folders.get_folder("../f1/./sub", app.f1.id, &app.alice).await.unwrap();
    assert_eq!(found.id, made.id);
    assert_eq!(app.canopy.hierarchy().path_of(made.id).await.unwrap(), "/f1/sub");
}

#[tokio::test]
async fn test_path_walk_denial_names_blocking_folder() {
    let app = TestApp::new().await;
    let folders = app.canopy.folders();
    folders.mkdir_no_check("/f1/deep", app.root.id).await.unwrap();
    folders.mkdir_no_check("/f1/deep/er", app.root.id).await.unwrap();

    let err = folders
        .get_folder("/f1/deep/er", app.root.id, &app.dave)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccessDenied);
    assert_eq!(err.denial.as_ref().unwrap().folder, "/f1");
    assert!(err.message.contains("user dave is not allowed to list folder '/f1'"));
    assert!(!err.message.contains("'/f1/deep'"));

    // Missing folders are reported only to those who can look.
    let err = folders
        .get_folder("/f1/ghost", app.root.id, &app.clara)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.message.contains("folder '/f1/ghost' does not exist"));
}

#[tokio::test]
async fn test_mkdir_name_conflict() {
    let app = TestApp::new().await;
    let err = app
        .canopy
        .folders()
        .mkdir("/f1", app.root.id, &app.admin)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_rmdir() {
    let app = TestApp::new().await;
    let folders = app.canopy.folders();
    folders.mkdir_no_check("/f1/a", app.root.id).await.unwrap();
    folders.mkdir_no_check("/f1/b", app.root.id).await.unwrap();

    let err = folders.rmdir("/f1/a", app.root.id, &app.clara).await.unwrap_err();
    assert_eq!(err.denial.unwrap().action, "delete");

    folders.rmdir("/f1/a", app.root.id, &app.bob).await.unwrap();
    assert!(folders.get_folder_no_check("/f1/a", app.root.id).await.is_err());
    assert!(folders.get_folder_no_check("/f1/b", app.root.id).await.is_ok());
}

#[tokio::test]
async fn test_rmdir_blocked_by_children_and_members() {
    let app = TestApp::new().await;
    let folders = app.canopy.folders();
    let a = folders.mkdir("/f1/a", app.root.id, &app.alice).await.unwrap();
    folders.mkdir("/f1/a/b", app.root.id, &app.alice).await.unwrap();

    let err = folders.rmdir("/f1/a", app.root.id, &app.alice).await.unwrap_err();
    assert!(err.is_conflict());

    folders.rmdir("/f1/a/b", app.root.id, &app.alice).await.unwrap();
    let item = app.insert_item("pinned", &[a.id]).await;
    let err = folders.rmdir("/f1/a", app.root.id, &app.alice).await.unwrap_err();
    assert!(err.is_conflict());

    app.items.delete_assert_allowed(&item, &app.alice).await.unwrap();
    folders.rmdir("/f1/a", app.root.id, &app.alice).await.unwrap();
    assert!(app.canopy.acl().grants_on(a.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rename_subfolder() {
    let app = TestApp::new().await;
    let folders = app.canopy.folders();
    folders.mkdir_no_check("/f1/draft", app.root.id).await.unwrap();

    let err = folders
        .rename_subfolder(&app.f1, "draft", "final", &app.clara)
        .await
        .unwrap_err();
    assert_eq!(err.denial.unwrap().action, "change");

    folders
        .rename_subfolder(&app.f1, "draft", "final", &app.bob)
        .await
        .unwrap();
    assert!(folders.get_folder("/f1/final", app.root.id, &app.bob).await.is_ok());
    assert!(folders.get_folder("/f1/draft", app.root.id, &app.bob).await.is_err());

    folders.mkdir_no_check("/f1/other", app.root.id).await.unwrap();
    let err = folders
        .rename_subfolder(&app.f1, "other", "final", &app.bob)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_acl_text() {
    let app = TestApp::new().await;
    let text = app.canopy.folders().acl_text(app.f1.id).await.unwrap();
    assert_eq!(text, "  alice vlidca\n  bob vlidc\n  clara vl\n");
}

/// ACL changes need ADMIN: allowed on `all`, denied on `write`.
async fn check_acl_changes(app: &TestApp, dirs: &BTreeMap<&'static str, Folder>, requester: &Requester) {
    let folders = app.canopy.folders();
    folders
        .set_permissions_by_name(&dirs["all"], "alice", ActionSet::READ, requester)
        .await
        .unwrap();
    assert!(
        app.canopy
            .resolver()
            .is_allowed(&app.alice, dirs["all"].id, Action::View)
            .await
            .unwrap()
    );

    let err = folders
        .set_permissions_by_name(&dirs["write"], "alice", ActionSet::READ, requester)
        .await
        .unwrap_err();
    assert!(err.is_access_denied());
}

#[tokio::test]
async fn test_anyuser_acl_changes() {
    let app = TestApp::new().await;
    check_acl_changes(&app, &app.anyuser_dir, &Requester::Anonymous).await;
}

#[tokio::test]
async fn test_authuser_acl_changes() {
    let app = TestApp::new().await;
    check_acl_changes(&app, &app.authuser_dir, &app.dave).await;

    // authuser grants never reach anonymous requesters.
    let err = app
        .canopy
        .folders()
        .set_permissions_by_name(
            &app.authuser_dir["all"],
            "alice",
            ActionSet::ALL,
            &Requester::Anonymous,
        )
        .await
        .unwrap_err();
    assert!(err.is_access_denied());
}
