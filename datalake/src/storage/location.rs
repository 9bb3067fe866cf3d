use common::{Error, Result};
use object_store::path::Path;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    S3,
    Local,
    Memory,
}

/// A base location in object storage: which store it lives in and the key
/// prefix inside that store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    backend: Backend,
    bucket: String,
    prefix: Path,
}

impl StorageLocation {
    /// Parses `s3://`, `s3a://`, `file://`, `memory://` URLs or absolute
    /// local paths.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::InvalidUri("location cannot be empty".to_string()));
        }

        if std::path::Path::new(raw).is_absolute() {
            let url = Url::from_file_path(raw)
                .map_err(|_| Error::InvalidUri(format!("invalid local path: {}", raw)))?;
            return Self::from_url(&url);
        }

        let url = Url::parse(raw)?;
        Self::from_url(&url)
    }

    fn from_url(url: &Url) -> Result<Self> {
        let backend = match url.scheme() {
            "s3" | "s3a" => Backend::S3,
            "file" => Backend::Local,
            "memory" => Backend::Memory,
            other => {
                return Err(Error::InvalidUri(format!(
                    "unsupported scheme '{}' in {}",
                    other, url
                )));
            }
        };

        let bucket = url.host_str().unwrap_or_default().to_string();
        if backend == Backend::S3 && bucket.is_empty() {
            return Err(Error::InvalidUri(format!("missing bucket in {}", url)));
        }

        let prefix = Path::from_url_path(url.path())
            .map_err(|e| Error::InvalidUri(format!("invalid path in {}: {}", url, e)))?;

        Ok(Self {
            backend,
            bucket,
            prefix,
        })
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// `scheme://bucket`, the key object stores are registered under.
    pub fn store_url(&self) -> String {
        format!("{}://{}", self.scheme(), self.bucket)
    }

    /// Prefix extended by `relative` (e.g. `song_data` or `songplays`).
    pub fn child_prefix(&self, relative: &str) -> Path {
        self.prefix
            .parts()
            .chain(Path::from(relative).parts())
            .collect()
    }

    /// Directory URL for `relative`, with a trailing slash so writers treat
    /// it as a collection of files.
    pub fn directory_url(&self, relative: &str) -> String {
        format!("{}/{}/", self.store_url(), self.child_prefix(relative))
    }

    fn scheme(&self) -> &'static str {
        match self.backend {
            Backend::S3 => "s3",
            Backend::Local => "file",
            Backend::Memory => "memory",
        }
    }
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.store_url(), self.prefix)
    }
}
