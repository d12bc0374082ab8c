//! Engine bootstrap.

use std::sync::Arc;

use tracing::info;

use canopy_auth::{AclStore, FolderHierarchy, PermissionResolver};
use canopy_cache::{CacheManager, ResultCache};
use canopy_core::config::AppConfig;
use canopy_core::error::AppError;
use canopy_core::result::AppResult;
use canopy_core::traits::cache::CacheProvider;
use canopy_database::repositories::{PgFolderRepository, PgGrantRepository};
use canopy_database::traits::{
    Directory, FolderStore, GrantStore, MemberCounter, MemberStore,
};
use canopy_database::{DatabasePool, MemoryStore};
use canopy_entity::member::FolderMember;
use canopy_service::{FolderService, MemberAuthorizer};

/// A fully wired authorization engine.
///
/// Cloning is cheap; every component shares the same stores and result
/// cache generation.
#[derive(Debug, Clone)]
pub struct Canopy {
    config: Arc<AppConfig>,
    cache: ResultCache,
    directory: Arc<dyn Directory>,
    resolver: PermissionResolver,
    acl: AclStore,
    folders: FolderService,
    database: Option<DatabasePool>,
}

impl Canopy {
    /// Build the engine from configuration.
    ///
    /// `store.backend = "postgres"` connects to `database.url` and runs the
    /// migrations; `"memory"` keeps the hierarchy in process. Users and
    /// groups always come from the caller's directory.
    pub async fn new(config: AppConfig, directory: Arc<dyn Directory>) -> AppResult<Self> {
        info!(
            cache_provider = %config.cache.provider,
            store_backend = %config.store.backend,
            access_control = config.access_control.enabled,
            "Starting Canopy v{}",
            env!("CARGO_PKG_VERSION")
        );

        let cache: Arc<dyn CacheProvider> = Arc::new(CacheManager::new(&config.cache).await?);

        match config.store.backend.as_str() {
            "memory" => {
                let store = Arc::new(MemoryStore::new());
                Ok(Self::with_stores(config, store.clone(), store, directory, cache))
            }
            "postgres" => {
                let pool = DatabasePool::connect(&config.database).await?;
                let folders = Arc::new(PgFolderRepository::new(pool.pool().clone()));
                let grants = Arc::new(PgGrantRepository::new(pool.pool().clone()));
                let mut canopy = Self::with_stores(config, folders, grants, directory, cache);
                canopy.database = Some(pool);
                Ok(canopy)
            }
            other => Err(AppError::configuration(format!(
                "Unknown store backend: '{other}'. Supported: memory, postgres"
            ))),
        }
    }

    /// Build the engine over caller-supplied stores.
    pub fn with_stores(
        config: AppConfig,
        folders: Arc<dyn FolderStore>,
        grants: Arc<dyn GrantStore>,
        directory: Arc<dyn Directory>,
        cache: Arc<dyn CacheProvider>,
    ) -> Self {
        let cache = ResultCache::new(cache, &config.cache);
        let hierarchy = FolderHierarchy::new(folders, cache.clone());
        let resolver =
            PermissionResolver::new(hierarchy, grants.clone(), &config.access_control);
        let acl = AclStore::new(grants, directory.clone(), cache.clone());
        let folders = FolderService::new(resolver.clone(), acl.clone(), directory.clone());

        Self {
            config: Arc::new(config),
            cache,
            directory,
            resolver,
            acl,
            folders,
            database: None,
        }
    }

    /// An in-memory engine with default cache settings.
    pub fn in_memory(config: AppConfig, directory: Arc<dyn Directory>) -> Self {
        let provider = Arc::new(canopy_cache::memory::MemoryCacheProvider::new(
            &config.cache.memory,
        ));
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(config, store.clone(), store, directory, provider)
    }

    /// Authorizer for one kind of folder member.
    ///
    /// The store is also registered so that folder removal sees its members.
    pub async fn members<T, S>(&self, store: Arc<S>) -> MemberAuthorizer<T>
    where
        T: FolderMember,
        S: MemberStore<T> + MemberCounter,
    {
        self.folders.register_counter(store.clone()).await;
        MemberAuthorizer::new(self.resolver.clone(), store)
    }

    /// The effective configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Folder and ACL mutations.
    pub fn folders(&self) -> &FolderService {
        &self.folders
    }

    /// Allowed-folder sets and allow/deny decisions.
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// The folder tree.
    pub fn hierarchy(&self) -> &FolderHierarchy {
        self.resolver.hierarchy()
    }

    /// Raw grant access.
    pub fn acl(&self) -> &AclStore {
        &self.acl
    }

    /// The memoized result cache.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// The user and group directory.
    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    /// The database pool, when running on PostgreSQL.
    pub fn database(&self) -> Option<&DatabasePool> {
        self.database.as_ref()
    }

    /// Whether the cache provider and, on PostgreSQL, the database respond.
    pub async fn health_check(&self) -> AppResult<bool> {
        if !self.cache.health_check().await? {
            return Ok(false);
        }
        match &self.database {
            Some(pool) => pool.health_check().await,
            None => Ok(true),
        }
    }

    /// Close the database pool, if any.
    pub async fn shutdown(&self) {
        if let Some(pool) = &self.database {
            pool.close().await;
        }
        info!("Canopy shut down");
    }
}
