//! Newline-delimited JSON reader for the song and log record families.
//!
//! Listing happens up front so an unreachable input fails the run before
//! any work is done. File contents are fetched lazily, a bounded number at
//! a time, in key order.

use crate::models::{LogRecord, SongRecord};
use crate::storage::{StorageLocation, StorageManager};
use common::{Error, Result};
use futures::stream::{self, Stream, StreamExt};
use object_store::path::Path;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tracing::{debug, info, warn};

const FETCH_CONCURRENCY: usize = 16;
const SOURCE_EXTENSION: &str = ".json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFamily {
    Songs,
    Logs,
}

impl RecordFamily {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Songs => "song_data",
            Self::Logs => "log_data",
        }
    }
}

/// A record type that can be read from one of the source families.
pub trait SourceRecord: DeserializeOwned + Send + 'static {
    const FAMILY: RecordFamily;
}

impl SourceRecord for SongRecord {
    const FAMILY: RecordFamily = RecordFamily::Songs;
}

impl SourceRecord for LogRecord {
    const FAMILY: RecordFamily = RecordFamily::Logs;
}

/// Parsed contents of one source file.
#[derive(Debug)]
pub struct FileRecords<R> {
    pub path: Path,
    pub records: Vec<R>,
    pub malformed: usize,
    /// Set when the file could not be fetched at all.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub files: usize,
    pub failed_files: usize,
    pub records: usize,
    pub malformed: usize,
}

impl ScanStats {
    fn record<R>(&mut self, file: &FileRecords<R>) {
        self.files += 1;
        self.records += file.records.len();
        self.malformed += file.malformed;
        if file.error.is_some() {
            self.failed_files += 1;
        }
    }
}

pub struct RecordReader {
    storage: StorageManager,
    location: StorageLocation,
}

impl RecordReader {
    pub fn new(storage: StorageManager, location: StorageLocation) -> Self {
        Self { storage, location }
    }

    /// Fails with `SourceUnavailable` unless something exists directly
    /// below the base location. Object stores list a missing prefix as
    /// empty, so an absent directory or bucket path is caught here.
    pub async fn check_available(&self) -> Result<()> {
        let unavailable = |reason: String| Error::SourceUnavailable {
            location: self.location.to_string(),
            reason,
        };

        let exists = self
            .storage
            .prefix_exists(&self.location, self.location.prefix())
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        if exists {
            Ok(())
        } else {
            Err(unavailable("location does not exist or is empty".to_string()))
        }
    }

    /// Lists the source files of one family, recursively, sorted by key.
    pub async fn list_files(&self, family: RecordFamily) -> Result<Vec<Path>> {
        self.check_available().await?;

        let prefix = self.location.child_prefix(family.prefix());
        let keys = self
            .storage
            .list_keys(&self.location, &prefix)
            .await
            .map_err(|e| Error::SourceUnavailable {
                location: format!("{}/{}", self.location.store_url(), prefix),
                reason: e.to_string(),
            })?;

        let files: Vec<Path> = keys
            .into_iter()
            .filter(|key| key.as_ref().ends_with(SOURCE_EXTENSION))
            .collect();

        if files.is_empty() {
            warn!(family = family.prefix(), prefix = %prefix, "No source files found");
        } else {
            info!(family = family.prefix(), files = files.len(), "Listed source files");
        }

        Ok(files)
    }

    pub async fn scan<R: SourceRecord>(&self) -> Result<RecordScan<R>> {
        let files = self.list_files(R::FAMILY).await?;
        Ok(RecordScan {
            storage: self.storage.clone(),
            location: self.location.clone(),
            files,
            _record: PhantomData,
        })
    }
}

/// A listed set of source files. Every call to [`RecordScan::stream`]
/// starts a fresh pass over the same files.
pub struct RecordScan<R> {
    storage: StorageManager,
    location: StorageLocation,
    files: Vec<Path>,
    _record: PhantomData<fn() -> R>,
}

impl<R: SourceRecord> RecordScan<R> {
    pub fn files(&self) -> &[Path] {
        &self.files
    }

    pub fn stream(&self) -> impl Stream<Item = FileRecords<R>> + '_ {
        stream::iter(self.files.iter())
            .map(move |path| self.read_file(path))
            .buffered(FETCH_CONCURRENCY)
    }

    /// Drains one pass into memory.
    pub async fn collect(&self) -> (Vec<R>, ScanStats) {
        let mut records = Vec::new();
        let mut stats = ScanStats::default();

        let mut files = std::pin::pin!(self.stream());
        while let Some(file) = files.next().await {
            debug!(path = %file.path, records = file.records.len(), "Read source file");
            stats.record(&file);
            records.extend(file.records);
        }

        info!(
            family = R::FAMILY.prefix(),
            files = stats.files,
            records = stats.records,
            malformed = stats.malformed,
            failed_files = stats.failed_files,
            "Finished reading source records"
        );

        (records, stats)
    }

    async fn read_file(&self, path: &Path) -> FileRecords<R> {
        match self.storage.get_object(&self.location, path).await {
            Ok(bytes) => {
                let (records, malformed) = parse_lines::<R>(path, &bytes);
                if malformed > 0 {
                    warn!(path = %path, malformed, "Skipped malformed records");
                }
                FileRecords {
                    path: path.clone(),
                    records,
                    malformed,
                    error: None,
                }
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to fetch source file, skipping");
                FileRecords {
                    path: path.clone(),
                    records: Vec::new(),
                    malformed: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Parses one JSON object per line. Blank lines are ignored; lines that do
/// not parse are counted and skipped.
pub fn parse_lines<R: DeserializeOwned>(path: &Path, data: &[u8]) -> (Vec<R>, usize) {
    let mut records = Vec::new();
    let mut malformed = 0;

    for (index, line) in data.split(|byte| *byte == b'\n').enumerate() {
        let line = line.trim_ascii();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_slice::<R>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                malformed += 1;
                let err = Error::MalformedRecord {
                    path: path.to_string(),
                    line: index + 1,
                    reason: e.to_string(),
                };
                debug!("{}", err);
            }
        }
    }

    (records, malformed)
}
