//! PostgreSQL implementations of the store traits.

pub mod folder;
pub mod grant;

pub use folder::PgFolderRepository;
pub use grant::PgGrantRepository;
