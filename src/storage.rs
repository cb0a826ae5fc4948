use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

/// Whole-document blob storage. Every persisted record is read and written
/// as a complete object keyed by logical name; there are no partial updates
/// and no transactional guarantees beyond last-write-wins.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// `None` when no object exists under the key.
    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Bytes>>;
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    async fn list_keys(&self, prefix: &str) -> anyhow::Result<Vec<String>>;
    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl Storage {
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
    ) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ))
            .endpoint_url(endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl StorageClient for Storage {
    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(out) => {
                let data = out.body.collect().await.context("s3 read body")?;
                Ok(Some(data.into_bytes()))
            }
            // A missing document is a normal state, not a failure.
            Err(err) if err.as_service_error().map(|e| e.is_no_such_key()).unwrap_or(false) => {
                Ok(None)
            }
            Err(err) => Err(anyhow::Error::from(err).context("s3 get_object")),
        }
    }

    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .send()
            .await
            .context("s3 list_objects")?;
        Ok(resp
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(str::to_string))
            .collect())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        let req = self.client.get_object().bucket(&self.bucket).key(key);
        let presigned = req
            .presigned(PresigningConfig::expires_in(
                std::time::Duration::from_secs(seconds),
            )?)
            .await
            .context("s3 presign_get")?;
        Ok(presigned.uri().to_string())
    }
}

/// In-memory storage backing `AppState::fake()` and the unit tests.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<Mutex<HashMap<String, Bytes>>>,
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn presign_get(&self, key: &str, _seconds: u64) -> anyhow::Result<String> {
        Ok(format!("https://storage.local/{}", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_storage_round_trips_objects() {
        let storage = MemoryStorage::default();
        assert!(storage.get_object("cats/a.json").await.unwrap().is_none());

        storage
            .put_object("cats/a.json", Bytes::from_static(b"{}"), "application/json")
            .await
            .unwrap();
        storage
            .put_object("cats/b.json", Bytes::from_static(b"{}"), "application/json")
            .await
            .unwrap();
        storage
            .put_object("foods.json", Bytes::from_static(b"{}"), "application/json")
            .await
            .unwrap();

        let body = storage.get_object("cats/a.json").await.unwrap().unwrap();
        assert_eq!(&body[..], b"{}");

        let keys = storage.list_keys("cats/").await.unwrap();
        assert_eq!(keys, vec!["cats/a.json".to_string(), "cats/b.json".to_string()]);

        storage.delete_object("cats/a.json").await.unwrap();
        assert!(storage.get_object("cats/a.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_storage_presign_embeds_the_key() {
        let storage = MemoryStorage::default();
        let url = storage.presign_get("cats/a/photo.jpg", 600).await.unwrap();
        assert!(url.contains("cats/a/photo.jpg"));
    }
}
