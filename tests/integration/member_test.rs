//! Member authorization against folder grants.

use std::collections::BTreeMap;

use canopy::{Action, Folder, Requester};

use crate::helpers::{Item, TestApp};

#[tokio::test]
async fn test_insert_object() {
    let app = TestApp::new().await;
    let f1 = [app.f1.id];

    for (requester, name) in [(&app.admin, "byAdmin"), (&app.alice, "byAlice"), (&app.bob, "byBob")] {
        let saved = app
            .items
            .save_assert_allowed(Item::new(name, &f1), requester, Some(&f1))
            .await
            .unwrap();
        assert!(saved.id.is_some());
    }

    let err = app
        .items
        .save_assert_allowed(Item::new("byClara", &f1), &app.clara, Some(&f1))
        .await
        .unwrap_err();
    assert!(err.is_access_denied());

    let names: Vec<String> = app
        .items
        .allowed(&app.admin)
        .await
        .unwrap()
        .into_iter()
        .filter(|i| i.folders.contains(&app.f1.id))
        .map(|i| i.name)
        .collect();
    assert_eq!(names, vec!["byAdmin", "byAlice", "byBob"]);
}

#[tokio::test]
async fn test_read_object() {
    let app = TestApp::new().await;
    app.insert_item("x", &[app.f1.id]).await;

    for requester in [&app.admin, &app.alice, &app.bob, &app.clara] {
        assert_eq!(app.visible_in(requester, &app.f1).await, vec!["x"]);
    }
    assert!(app.visible_in(&app.dave, &app.f1).await.is_empty());
    assert!(app.visible_in(&Requester::Anonymous, &app.f1).await.is_empty());
}

#[tokio::test]
async fn test_multi_folder_item_uses_any_folder() {
    let app = TestApp::new().await;
    let item = app
        .insert_item("shared", &[app.f1.id, app.anyuser_dir["read"].id])
        .await;

    assert!(app.items.is_allowed(&item, &app.dave, Action::View).await.unwrap());
    assert!(!app.items.is_allowed(&item, &app.dave, Action::Change).await.unwrap());

    let err = app
        .items
        .assert_allowed(&item, &app.dave, Action::Change)
        .await
        .unwrap_err();
    assert_eq!(
        err.message,
        "user dave does not have change permission for any folder in [f1, anyuser_read]"
    );
}

#[tokio::test]
async fn test_update_requires_change() {
    let app = TestApp::new().await;
    let mut item = app.insert_item("x", &[app.f1.id]).await;
    item.name = "renamed".to_string();

    assert!(
        app.items
            .save_assert_allowed(item.clone(), &app.clara, None)
            .await
            .is_err()
    );
    let saved = app
        .items
        .save_assert_allowed(item, &app.bob, None)
        .await
        .unwrap();
    assert_eq!(saved.name, "renamed");
}

#[tokio::test]
async fn test_privilege_escalation_guard() {
    let app = TestApp::new().await;
    let folders = app.canopy.folders();
    // bob administers his own folder but has only WRITE on f1.
    let mine = folders
        .create_subfolder(&app.root, "bobs", &app.admin, app.bob.as_principal())
        .await
        .unwrap();
    let item = app.insert_item("secret", &[app.f1.id]).await;

    // Moving it out of f1 into a folder bob controls needs ADMIN on f1.
    let err = app
        .items
        .assert_folder_change_allowed(&app.bob, &item.folders, &[mine.id])
        .await
        .unwrap_err();
    assert_eq!(err.denial.unwrap().action, "admin");

    let mut moved = item.clone();
    moved.folders = vec![mine.id];
    assert!(app.items.save_assert_allowed(moved, &app.bob, None).await.is_err());

    // With ADMIN but no DELETE on f1 the move is still refused.
    folders
        .set_permissions_by_name_no_check(app.f1.id, "bob", "vlica".parse().unwrap())
        .await
        .unwrap();
    let err = app
        .items
        .assert_folder_change_allowed(&app.bob, &item.folders, &[mine.id])
        .await
        .unwrap_err();
    assert_eq!(err.denial.unwrap().action, "delete");

    // alice holds everything on f1 but only READ on bob's folder.
    let err = app
        .items
        .assert_folder_change_allowed(&app.alice, &item.folders, &[mine.id])
        .await
        .unwrap_err();
    assert_eq!(err.denial.unwrap().action, "insert");
}

#[tokio::test]
async fn test_delete_object() {
    let app = TestApp::new().await;
    let item = app.insert_item("x", &[app.f1.id]).await;

    assert!(app.items.delete_assert_allowed(&item, &app.bob).await.is_err());
    assert!(app.items.delete_assert_allowed(&item, &app.alice).await.unwrap());
    assert!(app.visible_in(&app.admin, &app.f1).await.is_empty());
}

/// Inserting needs INSERT (`write` yes, `read` no) and viewing needs VIEW
/// (`read` yes, `none` no).
async fn check_members(app: &TestApp, dirs: &BTreeMap<&'static str, Folder>, requester: &Requester) {
    let write = [dirs["write"].id];
    app.items
        .save_assert_allowed(Item::new("writeGood", &write), requester, Some(&write))
        .await
        .unwrap();
    assert!(
        app.visible_in(requester, &dirs["write"])
            .await
            .contains(&"writeGood".to_string())
    );

    let read = [dirs["read"].id];
    let err = app
        .items
        .save_assert_allowed(Item::new("writeBad", &read), requester, Some(&read))
        .await
        .unwrap_err();
    assert!(err.is_access_denied());

    assert_eq!(app.visible_in(requester, &dirs["read"]).await, vec!["foo"]);
    assert!(app.visible_in(requester, &dirs["none"]).await.is_empty());
}

#[tokio::test]
async fn test_anyuser_members() {
    let app = TestApp::new().await;
    check_members(&app, &app.anyuser_dir, &Requester::Anonymous).await;
    assert!(
        app.visible_in(&Requester::Anonymous, &app.authuser_dir["read"])
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn test_authuser_members() {
    let app = TestApp::new().await;
    check_members(&app, &app.authuser_dir, &app.dave).await;
}
