pub mod location;
#[cfg(test)]
pub(crate) mod testing;

pub use location::{Backend, StorageLocation};

use common::config::StorageConfig;
use common::{Error, Result};
use dashmap::DashMap;
use datafusion::execution::context::SessionContext;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Builds and caches one object store per `scheme://bucket`.
#[derive(Clone)]
pub struct StorageManager {
    pub config: StorageConfig,
    object_store_cache: Arc<DashMap<String, Arc<dyn ObjectStore>>>,
}

impl StorageManager {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            object_store_cache: Arc::new(DashMap::new()),
        }
    }

    pub fn get_object_store(&self, location: &StorageLocation) -> Result<Arc<dyn ObjectStore>> {
        let key = location.store_url();
        if let Some(store) = self.object_store_cache.get(&key) {
            return Ok(store.clone());
        }

        let store: Arc<dyn ObjectStore> = match location.backend() {
            Backend::S3 => Arc::new(self.build_s3(location.bucket())?),
            Backend::Local => Arc::new(LocalFileSystem::new()),
            Backend::Memory => Arc::new(InMemory::new()),
        };

        debug!(store = %key, "Created object store");

        // Another task may have raced us; keep whichever landed first.
        let store = self
            .object_store_cache
            .entry(key)
            .or_insert(store)
            .clone();
        Ok(store)
    }

    /// Uses `store` for every location in the same `scheme://bucket`.
    pub fn insert_object_store(&self, location: &StorageLocation, store: Arc<dyn ObjectStore>) {
        self.object_store_cache.insert(location.store_url(), store);
    }

    fn build_s3(&self, bucket: &str) -> Result<object_store::aws::AmazonS3> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(&self.config.region)
            .with_allow_http(self.config.allow_http);

        if let Some(endpoint) = &self.config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if let Some(access_key) = &self.config.access_key {
            builder = builder.with_access_key_id(access_key);
        }
        if let Some(secret_key) = &self.config.secret_key {
            builder = builder.with_secret_access_key(secret_key);
        }

        Ok(builder.build()?)
    }

    /// Makes `location` resolvable by DataFusion readers and writers.
    pub fn register_object_store(
        &self,
        ctx: &SessionContext,
        location: &StorageLocation,
    ) -> Result<()> {
        let store = self.get_object_store(location)?;
        let url = Url::parse(&location.store_url())?;
        ctx.runtime_env().register_object_store(&url, store);
        Ok(())
    }

    /// Lists every object key below `prefix`, sorted.
    pub async fn list_keys(&self, location: &StorageLocation, prefix: &Path) -> Result<Vec<Path>> {
        let store = self.get_object_store(location)?;
        let mut keys: Vec<Path> = store
            .list(Some(prefix))
            .map_ok(|meta| meta.location)
            .try_collect()
            .await?;
        keys.sort();
        Ok(keys)
    }

    /// True when at least one object or sub-directory sits directly below
    /// `prefix`.
    pub async fn prefix_exists(&self, location: &StorageLocation, prefix: &Path) -> Result<bool> {
        let store = self.get_object_store(location)?;
        let listing = store.list_with_delimiter(Some(prefix)).await?;
        Ok(!listing.objects.is_empty() || !listing.common_prefixes.is_empty())
    }

    /// Removes every object below `prefix`. Returns the number deleted.
    pub async fn delete_prefix(&self, location: &StorageLocation, prefix: &Path) -> Result<usize> {
        let store = self.get_object_store(location)?;
        let keys = self.list_keys(location, prefix).await?;
        let count = keys.len();

        let locations = futures::stream::iter(keys.into_iter().map(Ok)).boxed();
        store
            .delete_stream(locations)
            .try_collect::<Vec<Path>>()
            .await?;

        if count > 0 {
            info!(prefix = %prefix, deleted = count, "Cleared existing objects");
        }
        Ok(count)
    }

    pub async fn put_object(
        &self,
        location: &StorageLocation,
        key: &Path,
        data: Vec<u8>,
    ) -> Result<()> {
        let store = self.get_object_store(location)?;
        store
            .put(key, PutPayload::from(data))
            .await
            .map_err(|e| Error::Storage(format!("Failed to put {}: {}", key, e)))?;
        Ok(())
    }

    pub async fn get_object(&self, location: &StorageLocation, key: &Path) -> Result<bytes::Bytes> {
        let store = self.get_object_store(location)?;
        let bytes = store.get(key).await?.bytes().await?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> StorageManager {
        StorageManager::new(StorageConfig::default())
    }

    #[tokio::test]
    async fn test_memory_store_is_shared_per_bucket() {
        let manager = manager();
        let input = StorageLocation::parse("memory://lake/input").unwrap();
        let output = StorageLocation::parse("memory://lake/output").unwrap();
        let other = StorageLocation::parse("memory://elsewhere/input").unwrap();

        let key = Path::from("input/song_data/a.json");
        manager.put_object(&input, &key, b"{}".to_vec()).await.unwrap();

        // Same bucket, different prefix: same store.
        let fetched = manager.get_object(&output, &key).await.unwrap();
        assert_eq!(fetched.as_ref(), b"{}");

        assert!(manager.get_object(&other, &key).await.is_err());
    }

    #[tokio::test]
    async fn test_list_and_delete_prefix() {
        let manager = manager();
        let location = StorageLocation::parse("memory://lake/out").unwrap();
        for key in [
            "out/songs/year=2000/part-0.parquet",
            "out/songs/_SUCCESS",
            "out/songs_backup/part-0.parquet",
            "out/users/part-0.parquet",
        ] {
            manager
                .put_object(&location, &Path::from(key), b"x".to_vec())
                .await
                .unwrap();
        }

        let songs = location.child_prefix("songs");
        let keys = manager.list_keys(&location, &songs).await.unwrap();
        assert_eq!(
            keys,
            vec![
                Path::from("out/songs/_SUCCESS"),
                Path::from("out/songs/year=2000/part-0.parquet"),
            ]
        );

        let deleted = manager.delete_prefix(&location, &songs).await.unwrap();
        assert_eq!(deleted, 2);
        assert!(manager.list_keys(&location, &songs).await.unwrap().is_empty());

        // Sibling prefixes sharing a name stem are untouched.
        let remaining = manager.list_keys(&location, location.prefix()).await.unwrap();
        assert_eq!(remaining.len(), 2);
    }

    #[tokio::test]
    async fn test_prefix_exists() {
        let manager = manager();
        let location = StorageLocation::parse("memory://lake/input").unwrap();
        manager
            .put_object(&location, &Path::from("input/song_data/A/a.json"), b"{}".to_vec())
            .await
            .unwrap();

        assert!(manager.prefix_exists(&location, location.prefix()).await.unwrap());
        assert!(!manager.prefix_exists(&location, &Path::from("missing")).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_local_directory_does_not_exist() {
        let dir = tempfile::tempdir().unwrap();
        let location =
            StorageLocation::parse(dir.path().join("not/here").to_str().unwrap()).unwrap();

        let exists = manager().prefix_exists(&location, location.prefix()).await;

        assert!(!exists.unwrap_or(false));
    }

    #[tokio::test]
    async fn test_register_object_store() {
        let manager = manager();
        let ctx = SessionContext::new();
        let location = StorageLocation::parse("memory://lake/out").unwrap();

        manager.register_object_store(&ctx, &location).unwrap();

        let url = Url::parse("memory://lake").unwrap();
        assert!(ctx.runtime_env().object_store(datafusion::execution::object_store::ObjectStoreUrl::parse(url.as_str()).unwrap()).is_ok());
    }
}
