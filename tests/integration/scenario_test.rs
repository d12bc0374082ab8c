//! Permission resolution scenarios over the shared fixture.

use canopy::{Action, ActionSet, FolderScope, Requester};
use canopy_core::ErrorKind;
use canopy_entity::principal::Principal;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_end_to_end_scenario() {
    let app = TestApp::new().await;
    let resolver = app.canopy.resolver();
    let f1 = app.f1.id;

    assert!(resolver.is_allowed(&app.alice, f1, Action::Admin).await.unwrap());
    assert!(!resolver.is_allowed(&app.bob, f1, Action::Admin).await.unwrap());
    assert!(resolver.is_allowed(&app.bob, f1, Action::Insert).await.unwrap());
    assert!(!resolver.is_allowed(&app.clara, f1, Action::Insert).await.unwrap());
    assert!(resolver.is_allowed(&app.clara, f1, Action::View).await.unwrap());
    assert!(!resolver.is_allowed(&Requester::Anonymous, f1, Action::View).await.unwrap());
    assert!(!resolver.is_allowed(&app.dave, f1, Action::View).await.unwrap());
}

#[tokio::test]
async fn test_denial_carries_context() {
    let app = TestApp::new().await;
    let err = app
        .canopy
        .resolver()
        .assert_allowed(&Requester::Anonymous, &app.f1, Action::View)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::AccessDenied);
    assert_eq!(
        err.message,
        "user <anonymous> does not have view permission for folder f1"
    );
    let denial = err.denial.unwrap();
    assert_eq!(denial.principal, "<anonymous>");
    assert_eq!(denial.action, "view");
    assert_eq!(denial.folder, "f1");
}

#[tokio::test]
async fn test_superuser_bypass() {
    let app = TestApp::new().await;
    let resolver = app.canopy.resolver();
    let tree = app.canopy.hierarchy().snapshot().await.unwrap();

    for id in tree.ids() {
        for action in Action::ALL {
            assert!(resolver.is_allowed(&app.admin, id, action).await.unwrap());
        }
    }
    assert_eq!(
        resolver.scope(&app.admin, Action::Delete).await.unwrap(),
        FolderScope::Unrestricted
    );
}

#[tokio::test]
async fn test_unreachable_grants_are_void() {
    let app = TestApp::new().await;
    let folders = app.canopy.folders();
    let hidden = folders
        .create_subfolder_no_check(app.root.id, "hidden", None)
        .await
        .unwrap();
    folders.clear_acl_no_check(hidden.id).await.unwrap();
    let inner = folders
        .create_subfolder_no_check(hidden.id, "inner", None)
        .await
        .unwrap();
    folders
        .set_permissions_by_name_no_check(inner.id, "dave", ActionSet::ALL)
        .await
        .unwrap();

    let resolver = app.canopy.resolver();
    let local = resolver
        .local_allowed_folders(&app.dave, Action::List)
        .await
        .unwrap();
    assert!(local.contains(&inner.id));

    let listable = resolver.listable_folders(&app.dave).await.unwrap();
    assert!(listable.contains(&app.root.id));
    assert!(!listable.contains(&hidden.id));
    assert!(!listable.contains(&inner.id));

    assert!(!resolver.is_allowed(&app.dave, inner.id, Action::Insert).await.unwrap());

    // Opening the parent makes the grant reachable.
    folders
        .set_permissions_by_name_no_check(hidden.id, "dave", ActionSet::LIST)
        .await
        .unwrap();
    assert!(resolver.is_allowed(&app.dave, inner.id, Action::Insert).await.unwrap());
    assert!(!resolver.is_allowed(&app.dave, hidden.id, Action::View).await.unwrap());
}

#[tokio::test]
async fn test_insert_requires_parent_listability() {
    let app = TestApp::new().await;
    let folders = app.canopy.folders();
    let hidden = folders
        .create_subfolder_no_check(app.root.id, "hidden", None)
        .await
        .unwrap();
    folders.clear_acl_no_check(hidden.id).await.unwrap();
    let inner = folders
        .create_subfolder_no_check(hidden.id, "inner", None)
        .await
        .unwrap();
    folders
        .set_permissions_by_name_no_check(inner.id, "dave", ActionSet::INSERT)
        .await
        .unwrap();

    assert!(
        !app.canopy
            .resolver()
            .is_allowed(&app.dave, inner.id, Action::Insert)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_empty_grant_leaves_no_row() {
    let app = TestApp::new().await;
    let acl = app.canopy.acl();
    let bob = app.canopy.directory().resolve_principal("bob").await.unwrap();

    acl.grant(bob, app.f1.id, ActionSet::NONE).await.unwrap();
    assert_eq!(acl.list_actions_for(bob, app.f1.id).await.unwrap(), ActionSet::NONE);
    assert!(
        acl.grants_on(app.f1.id)
            .await
            .unwrap()
            .iter()
            .all(|g| g.principal != bob)
    );

    // Granting nothing twice is still fine.
    acl.grant(bob, app.f1.id, ActionSet::NONE).await.unwrap();
    let err = acl.revoke(bob, app.f1.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_acl_inheritance_on_creation() {
    let app = TestApp::new().await;
    let alice_principal = app.alice.as_principal().unwrap();
    let folders = app.canopy.folders();

    let child = folders
        .create_subfolder(&app.f1, "x", &app.bob, app.bob.as_principal())
        .await
        .unwrap();

    let resolver = app.canopy.resolver();
    assert!(resolver.is_allowed(&app.bob, child.id, Action::Admin).await.unwrap());

    let acl = app.canopy.acl();
    let parent_acl = acl.list_acl(app.f1.id).await.unwrap();
    let child_acl = acl.list_acl(child.id).await.unwrap();
    for (name, actions) in &parent_acl {
        if name == "bob" {
            assert_eq!(child_acl.get(name), Some(&ActionSet::ALL));
        } else {
            assert_eq!(child_acl.get(name), Some(actions), "grant for {name}");
        }
    }
    assert_eq!(
        acl.list_actions_for(alice_principal, child.id).await.unwrap(),
        ActionSet::ALL
    );
}

#[tokio::test]
async fn test_group_grants_apply_to_members() {
    let app = TestApp::new().await;
    let editors = app.directory.create_group("editors").await.unwrap();
    let dave_id = app.dave.active_user().unwrap().id;
    let dave = Requester::User(app.directory.add_to_group(dave_id, editors.id).await.unwrap());

    app.canopy
        .folders()
        .set_permissions_no_check(app.f1.id, Principal::Group(editors.id), ActionSet::WRITE)
        .await
        .unwrap();

    let resolver = app.canopy.resolver();
    assert!(resolver.is_allowed(&dave, app.f1.id, Action::Change).await.unwrap());
    assert!(!resolver.is_allowed(&dave, app.f1.id, Action::Admin).await.unwrap());

    let acl = app.canopy.acl().list_acl(app.f1.id).await.unwrap();
    assert_eq!(acl.get("group:editors"), Some(&ActionSet::WRITE));
}

#[tokio::test]
async fn test_inactive_user_matches_only_anyuser() {
    let app = TestApp::new().await;
    let mut clara = app.clara.active_user().unwrap().clone();
    clara.is_active = false;
    let clara = Requester::User(clara);

    let resolver = app.canopy.resolver();
    assert!(!resolver.is_allowed(&clara, app.f1.id, Action::View).await.unwrap());
    assert!(
        resolver
            .is_allowed(&clara, app.anyuser_dir["read"].id, Action::View)
            .await
            .unwrap()
    );
    assert!(
        !resolver
            .is_allowed(&clara, app.authuser_dir["read"].id, Action::View)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_access_control_disabled() {
    let mut config = canopy::AppConfig::default();
    config.access_control.enabled = false;
    let app = TestApp::with_config(config).await;

    let resolver = app.canopy.resolver();
    assert!(
        resolver
            .is_allowed(&Requester::Anonymous, app.f1.id, Action::Admin)
            .await
            .unwrap()
    );
    app.canopy
        .folders()
        .mkdir("/f1/open", app.root.id, &Requester::Anonymous)
        .await
        .unwrap();
}
