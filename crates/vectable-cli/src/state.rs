//! Application state: the loaded config and the store it describes.

use std::path::{Path, PathBuf};

use anyhow::Context;
use vectable_infra::config::{load_config, resolve_config_path};
use vectable_infra::{DatabasePool, SqliteVectorStore};
use vectable_types::config::StoreConfig;

pub struct AppState {
    pub config_path: PathBuf,
    pub config: StoreConfig,
    pub store: SqliteVectorStore,
}

impl AppState {
    /// Resolve and load the config, open the database, build the store.
    ///
    /// Does not touch the table; `migrate` creates it.
    pub async fn init(explicit_config: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = resolve_config_path(explicit_config);
        let config = load_config(&config_path).await?;

        let pool = DatabasePool::connect(&config.database_url)
            .await
            .with_context(|| format!("failed to open database {}", config.database_url))?;

        let store = SqliteVectorStore::new(pool, config.schema.clone(), config.vector)
            .with_context(|| format!("invalid store config in {}", config_path.display()))?;

        tracing::debug!(
            config = %config_path.display(),
            table = %store.schema().name,
            "store ready"
        );

        Ok(Self {
            config_path,
            config,
            store,
        })
    }
}
