//! Object store wrapper that injects failures, for tests.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore, PutMultipartOpts,
    PutOptions, PutPayload, PutResult,
};

#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: InMemory,
    deny_list: bool,
    deny_reads: Option<Path>,
    deny_writes: Option<Path>,
}

impl FaultyStore {
    pub fn deny_list() -> Self {
        Self {
            deny_list: true,
            ..Default::default()
        }
    }

    pub fn deny_reads_under(prefix: &str) -> Self {
        Self {
            deny_reads: Some(Path::from(prefix)),
            ..Default::default()
        }
    }

    pub fn deny_writes_under(prefix: &str) -> Self {
        Self {
            deny_writes: Some(Path::from(prefix)),
            ..Default::default()
        }
    }

    pub async fn seed(&self, key: &str, body: &str) {
        self.inner
            .put(&Path::from(key), PutPayload::from(body.as_bytes().to_vec()))
            .await
            .unwrap();
    }

    fn denied(location: &Path) -> object_store::Error {
        object_store::Error::Generic {
            store: "FaultyStore",
            source: format!("access denied: {}", location).into(),
        }
    }

    fn is_under(prefix: &Option<Path>, location: &Path) -> bool {
        prefix
            .as_ref()
            .is_some_and(|prefix| location.prefix_matches(prefix))
    }
}

impl std::fmt::Display for FaultyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FaultyStore")
    }
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn put_opts(
        &self,
        location: &Path,
        payload: PutPayload,
        opts: PutOptions,
    ) -> object_store::Result<PutResult> {
        if Self::is_under(&self.deny_writes, location) {
            return Err(Self::denied(location));
        }
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &Path,
        opts: PutMultipartOpts,
    ) -> object_store::Result<Box<dyn MultipartUpload>> {
        if Self::is_under(&self.deny_writes, location) {
            return Err(Self::denied(location));
        }
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(
        &self,
        location: &Path,
        options: GetOptions,
    ) -> object_store::Result<GetResult> {
        if Self::is_under(&self.deny_reads, location) {
            return Err(Self::denied(location));
        }
        self.inner.get_opts(location, options).await
    }

    async fn delete(&self, location: &Path) -> object_store::Result<()> {
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&Path>) -> BoxStream<'_, object_store::Result<ObjectMeta>> {
        if self.deny_list {
            let location = prefix.cloned().unwrap_or_default();
            return futures::stream::once(async move { Err(Self::denied(&location)) }).boxed();
        }
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(&self, prefix: Option<&Path>) -> object_store::Result<ListResult> {
        if self.deny_list {
            return Err(Self::denied(&prefix.cloned().unwrap_or_default()));
        }
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> object_store::Result<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(&self, from: &Path, to: &Path) -> object_store::Result<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}
