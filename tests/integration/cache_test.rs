//! Result cache coherence as seen through the engine.

use std::sync::Arc;

use canopy::{Action, ActionSet, AppConfig, Canopy, Requester};
use canopy_cache::memory::MemoryCacheProvider;
use canopy_core::types::FolderId;
use canopy_database::traits::GrantStore;
use canopy_database::{MemoryDirectory, MemoryStore};
use canopy_entity::permission::PermissionGrant;
use canopy_entity::principal::Principal;

use crate::helpers::TestApp;

/// An engine whose grant store the test can write to behind its back.
fn engine(config: AppConfig) -> (Canopy, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(MemoryCacheProvider::new(&config.cache.memory));
    let canopy = Canopy::with_stores(
        config,
        store.clone(),
        store.clone(),
        Arc::new(MemoryDirectory::new()),
        provider,
    );
    (canopy, store)
}

#[tokio::test]
async fn test_repeated_reads_are_identical() {
    let app = TestApp::new().await;
    let resolver = app.canopy.resolver();

    let first = resolver.allowed_folders(&app.bob, Action::Insert).await.unwrap();
    let second = resolver.allowed_folders(&app.bob, Action::Insert).await.unwrap();
    assert_eq!(first, second);
    assert!(first.contains(&app.f1.id));
}

#[tokio::test]
async fn test_structural_change_is_seen_immediately() {
    let app = TestApp::new().await;
    let resolver = app.canopy.resolver();
    let before = resolver.allowed_folders(&app.alice, Action::Admin).await.unwrap();

    let made = app
        .canopy
        .folders()
        .mkdir("/f1/new", app.root.id, &app.alice)
        .await
        .unwrap();
    let after = resolver.allowed_folders(&app.alice, Action::Admin).await.unwrap();
    assert!(!before.contains(&made.id));
    assert!(after.contains(&made.id));

    app.canopy
        .folders()
        .rmdir("/f1/new", app.root.id, &app.alice)
        .await
        .unwrap();
    let removed = resolver.allowed_folders(&app.alice, Action::Admin).await.unwrap();
    assert_eq!(removed, before);
}

#[tokio::test]
async fn test_mutations_bump_generation() {
    let app = TestApp::new().await;
    let cache = app.canopy.cache();
    let folders = app.canopy.folders();

    let start = cache.current_generation();
    folders.mkdir_no_check("/f1/a", app.root.id).await.unwrap();
    let after_create = cache.current_generation();
    assert!(after_create > start);

    folders
        .rename_subfolder_no_check(app.f1.id, "a", "b")
        .await
        .unwrap();
    let after_rename = cache.current_generation();
    assert!(after_rename > after_create);

    folders
        .set_permissions_by_name_no_check(app.f1.id, "dave", ActionSet::READ)
        .await
        .unwrap();
    let after_grant = cache.current_generation();
    assert!(after_grant > after_rename);

    folders.rmdir_no_check("/f1/b", app.root.id).await.unwrap();
    assert!(cache.current_generation() > after_grant);

    // Reads never bump.
    let settled = cache.current_generation();
    app.canopy.resolver().listable_folders(&app.dave).await.unwrap();
    assert_eq!(cache.current_generation(), settled);
}

#[tokio::test]
async fn test_out_of_band_writes_wait_for_a_bump() {
    let (canopy, store) = engine(AppConfig::default());
    let resolver = canopy.resolver();
    let anon = Requester::Anonymous;

    assert!(!resolver.is_allowed(&anon, FolderId::ROOT, Action::View).await.unwrap());
    store
        .upsert(&PermissionGrant::new(FolderId::ROOT, Principal::ANY_USER, ActionSet::READ))
        .await
        .unwrap();

    // Served from cache until something bumps the generation.
    assert!(!resolver.is_allowed(&anon, FolderId::ROOT, Action::View).await.unwrap());
    canopy.cache().bump_generation();
    assert!(resolver.is_allowed(&anon, FolderId::ROOT, Action::View).await.unwrap());
}

#[tokio::test]
async fn test_disabled_cache_reads_through() {
    let mut config = AppConfig::default();
    config.cache.enabled = false;
    let (canopy, store) = engine(config);
    let resolver = canopy.resolver();
    let anon = Requester::Anonymous;

    assert!(!resolver.is_allowed(&anon, FolderId::ROOT, Action::View).await.unwrap());
    store
        .upsert(&PermissionGrant::new(FolderId::ROOT, Principal::ANY_USER, ActionSet::READ))
        .await
        .unwrap();
    assert!(resolver.is_allowed(&anon, FolderId::ROOT, Action::View).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_reads_agree() {
    let app = Arc::new(TestApp::new().await);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = Arc::clone(&app);
        handles.push(tokio::spawn(async move {
            app.canopy
                .resolver()
                .allowed_folders(&app.clara, Action::View)
                .await
                .unwrap()
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert!(results[0].contains(&app.f1.id));
}

#[tokio::test]
async fn test_in_memory_engine_is_healthy() {
    let (canopy, _store) = engine(AppConfig::default());
    assert!(canopy.health_check().await.unwrap());
    assert!(canopy.database().is_none());
}
