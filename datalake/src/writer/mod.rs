//! Partitioned Parquet writer for the star schema tables.
//!
//! Every table is written independently: existing objects under its
//! directory are cleared, the new files are written through DataFusion with
//! hive-style partition directories, the result is verified by listing, and
//! a `_SUCCESS` marker is written last. A failure in one table is recorded
//! in its outcome and does not stop the others.

mod marker;

pub use marker::{ColumnDescription, MARKER_FILE, TableMarker, partitions_from_keys};

use crate::processor::StarSchema;
use crate::schema::StarTable;
use crate::storage::{StorageLocation, StorageManager};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use common::{Error, Result};
use datafusion::common::config::TableParquetOptions;
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::logical_expr::cast;
use datafusion::prelude::{SessionContext, col};
use object_store::path::Path;
use serde::Serialize;
use tracing::{error, info, instrument};

const PARQUET_EXTENSION: &str = ".parquet";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableStatus {
    Written {
        rows: usize,
        files: usize,
        partitions: usize,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOutcome {
    pub table: String,
    pub destination: String,
    #[serde(flatten)]
    pub status: TableStatus,
}

impl TableOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self.status, TableStatus::Written { .. })
    }
}

pub struct PartitionedWriter {
    ctx: SessionContext,
    storage: StorageManager,
    output: StorageLocation,
    run_id: String,
}

impl PartitionedWriter {
    pub fn new(storage: StorageManager, output: StorageLocation, run_id: &str) -> Result<Self> {
        let ctx = SessionContext::new();
        storage.register_object_store(&ctx, &output)?;
        Ok(Self {
            ctx,
            storage,
            output,
            run_id: run_id.to_string(),
        })
    }

    pub fn destination(&self, table: StarTable) -> String {
        self.output.directory_url(table.name())
    }

    /// Writes all five tables, one after another, and reports each.
    pub async fn write_all(&self, star: &StarSchema) -> Vec<TableOutcome> {
        let mut outcomes = Vec::with_capacity(StarTable::ALL.len());
        for table in StarTable::ALL {
            let result = match star.to_batch(table) {
                Ok(batch) => self.write_table(table, batch).await,
                Err(e) => Err(e),
            };
            outcomes.push(self.outcome(table, result));
        }
        outcomes
    }

    fn outcome(&self, table: StarTable, result: Result<TableStatus>) -> TableOutcome {
        let status = result.unwrap_or_else(|e| {
            let reason = match e {
                Error::DestinationWrite { reason, .. } => reason,
                other => other.to_string(),
            };
            error!(table = %table, reason = %reason, "Table write failed");
            TableStatus::Failed { reason }
        });

        TableOutcome {
            table: table.name().to_string(),
            destination: self.destination(table),
            status,
        }
    }

    /// Replaces the contents of the table's directory with `batch`.
    #[instrument(skip(self, batch), fields(run_id = %self.run_id, rows = batch.num_rows()))]
    pub async fn write_table(&self, table: StarTable, batch: RecordBatch) -> Result<TableStatus> {
        self.replace_table(table, batch)
            .await
            .map_err(|e| match e {
                Error::DestinationWrite { .. } => e,
                other => Error::DestinationWrite {
                    table: table.name().to_string(),
                    reason: other.to_string(),
                },
            })
    }

    async fn replace_table(&self, table: StarTable, batch: RecordBatch) -> Result<TableStatus> {
        let prefix = self.output.child_prefix(table.name());
        let rows = batch.num_rows();

        self.storage.delete_prefix(&self.output, &prefix).await?;

        if rows > 0 {
            self.write_parquet(table, batch.clone()).await?;
        }

        let files = self.written_files(&prefix).await?;
        if rows > 0 && files.is_empty() {
            return Err(Error::DestinationWrite {
                table: table.name().to_string(),
                reason: format!("no parquet files found under {} after write", prefix),
            });
        }

        let marker = TableMarker::new(
            &self.run_id,
            table.name(),
            table.partition_columns(),
            &batch,
            &prefix,
            &files,
        );
        let marker_key = prefix.child(MARKER_FILE);
        self.storage
            .put_object(&self.output, &marker_key, serde_json::to_vec_pretty(&marker)?)
            .await?;

        info!(
            table = %table,
            rows,
            files = files.len(),
            partitions = marker.partitions.len(),
            "Table written"
        );

        Ok(TableStatus::Written {
            rows,
            files: files.len(),
            partitions: marker.partitions.len(),
        })
    }

    async fn write_parquet(&self, table: StarTable, batch: RecordBatch) -> Result<()> {
        let partition_columns = table.partition_columns();
        let parquet_options = self.parquet_options(table, batch.num_rows());
        let mut df = self.ctx.read_batch(batch)?;

        // Hive partition values are written from string columns
        for column in partition_columns {
            df = df.with_column(column, cast(col(*column), DataType::Utf8))?;
        }

        let options = DataFrameWriteOptions::new()
            .with_partition_by(partition_columns.iter().map(|c| c.to_string()).collect());

        df.write_parquet(&self.destination(table), options, Some(parquet_options)).await?;
        Ok(())
    }

    fn parquet_options(&self, table: StarTable, record_count: usize) -> TableParquetOptions {
        let mut options = TableParquetOptions::new();
        options.global.compression = Some("snappy".to_string());
        for (key, value) in [
            ("table", table.name().to_string()),
            ("run_id", self.run_id.clone()),
            ("record_count", record_count.to_string()),
            ("written_at", Utc::now().to_rfc3339()),
        ] {
            options.key_value_metadata.insert(key.to_string(), Some(value));
        }
        options
    }

    async fn written_files(&self, prefix: &Path) -> Result<Vec<Path>> {
        let keys = self.storage.list_keys(&self.output, prefix).await?;
        Ok(keys
            .into_iter()
            .filter(|key| key.as_ref().ends_with(PARQUET_EXTENSION))
            .collect())
    }
}
