use async_trait::async_trait;
use iine_core::{ArticleStore, Error, Result};
use std::path::PathBuf;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

pub const DEFAULT_DB_PATH: &str = "iine.db";

#[async_trait]
pub trait StorageBackend: ArticleStore {
    fn name() -> &'static str where Self: Sized;
    async fn open(config: &StoreConfig) -> Result<Self> where Self: Sized;
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

async fn open_backend<T: StorageBackend + 'static>(config: &StoreConfig) -> Result<Arc<dyn ArticleStore>> {
    let store = T::open(config).await?;
    tracing::debug!(backend = T::name(), "store opened");
    Ok(Arc::new(store))
}

/// Open the store named on the command line (`memory` or `sqlite`).
pub async fn create_store(kind: &str, config: &StoreConfig) -> Result<Arc<dyn ArticleStore>> {
    match kind {
        "memory" => open_backend::<InMemoryStore>(config).await,
        #[cfg(feature = "sqlite")]
        "sqlite" => open_backend::<SQLiteStore>(config).await,
        other => Err(Error::Config(format!(
            "Unsupported storage backend: {} (built with: {})",
            other,
            available_backends().join(", ")
        ))),
    }
}

pub fn available_backends() -> Vec<&'static str> {
    let mut names = vec![InMemoryStore::name()];
    #[cfg(feature = "sqlite")]
    names.push(SQLiteStore::name());
    names
}

pub mod prelude {
    pub use super::{create_store, StorageBackend, StoreConfig};
    pub use super::backends::*;
}
