use std::sync::Arc;

use crate::config::{AppConfig, StorageConfig};
use crate::storage::{MemoryStorage, Storage, StorageClient};
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub store: DocumentStore,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let storage = Arc::new(
            Storage::new(
                &config.storage.endpoint,
                &config.storage.bucket,
                &config.storage.access_key,
                &config.storage.secret_key,
                &config.storage.region,
            )
            .await?,
        ) as Arc<dyn StorageClient>;

        Ok(Self::from_parts(config, storage))
    }

    pub fn from_parts(config: Arc<AppConfig>, storage: Arc<dyn StorageClient>) -> Self {
        let store = DocumentStore::new(storage.clone());
        Self {
            config,
            storage,
            store,
        }
    }

    /// State over in-memory storage for unit tests.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            storage: StorageConfig {
                endpoint: "fake".into(),
                bucket: "fake".into(),
                access_key: "fake".into(),
                secret_key: "fake".into(),
                region: "us-east-1".into(),
            },
        });
        Self::from_parts(config, Arc::new(MemoryStorage::default()))
    }
}
