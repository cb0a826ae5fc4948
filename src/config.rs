use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let storage = StorageConfig {
            endpoint: std::env::var("STORAGE_ENDPOINT")?,
            bucket: std::env::var("STORAGE_BUCKET").unwrap_or_else(|_| "catfeeder-data".into()),
            access_key: std::env::var("STORAGE_ACCESS_KEY")?,
            secret_key: std::env::var("STORAGE_SECRET_KEY")?,
            region: std::env::var("STORAGE_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };
        Ok(Self { storage })
    }
}
