use crate::models::{LogRecord, SongRecord};
use crate::processor::StarSchema;
use crate::reader::RecordReader;
use crate::report::RunReport;
use crate::storage::{StorageLocation, StorageManager};
use crate::writer::PartitionedWriter;
use common::Result;
use common::config::Settings;
use tracing::{info, instrument, warn};

/// Reads both record families, builds the star schema and writes the five
/// tables. Source listing failures abort before anything is written;
/// per-table write failures are recorded in the report.
pub struct PipelineService {
    storage: StorageManager,
    input: StorageLocation,
    output: StorageLocation,
}

impl PipelineService {
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_storage(StorageManager::new(settings.storage.clone()), settings)
    }

    pub fn with_storage(storage: StorageManager, settings: &Settings) -> Result<Self> {
        Ok(Self {
            storage,
            input: StorageLocation::parse(&settings.input.url)?,
            output: StorageLocation::parse(&settings.output.url)?,
        })
    }

    #[instrument(skip(self), fields(input = %self.input, output = %self.output))]
    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::start();
        info!(run_id = %report.run_id, "Starting run");

        let reader = RecordReader::new(self.storage.clone(), self.input.clone());
        let song_scan = reader.scan::<SongRecord>().await?;
        let log_scan = reader.scan::<LogRecord>().await?;
        info!(
            song_files = song_scan.files().len(),
            log_files = log_scan.files().len(),
            "Listed input files"
        );

        let (songs, song_stats) = song_scan.collect().await;
        let (logs, log_stats) = log_scan.collect().await;
        report.songs = song_stats;
        report.logs = log_stats;

        let star = StarSchema::build(&songs, &logs);
        report.record_star(&star);

        let writer = PartitionedWriter::new(
            self.storage.clone(),
            self.output.clone(),
            &report.run_id.to_string(),
        )?;
        let outcomes = writer.write_all(&star).await;
        report.finish(outcomes);

        if report.is_success() {
            info!(run_id = %report.run_id, "Run completed");
        } else {
            let failed: Vec<&str> = report.failed_tables().map(|o| o.table.as_str()).collect();
            warn!(run_id = %report.run_id, failed = ?failed, "Run completed with failed tables");
        }

        Ok(report)
    }
}
