use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use object_store::path::Path;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const MARKER_FILE: &str = "_SUCCESS";

static PARTITION_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<column>[A-Za-z_][A-Za-z0-9_]*)=(?P<value>.+)$")
        .expect("Invalid partition segment regex")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// Written last into each table directory; its presence means the table's
/// files for `run_id` are complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMarker {
    pub run_id: String,
    pub table: String,
    pub record_count: usize,
    pub partition_columns: Vec<String>,
    pub partitions: Vec<String>,
    pub files: Vec<String>,
    pub schema: Vec<ColumnDescription>,
    pub null_counts: BTreeMap<String, usize>,
    pub created_at: DateTime<Utc>,
}

impl TableMarker {
    pub fn new(
        run_id: &str,
        table: &str,
        partition_columns: &[&str],
        batch: &RecordBatch,
        table_prefix: &Path,
        files: &[Path],
    ) -> Self {
        let schema = batch
            .schema()
            .fields()
            .iter()
            .map(|field| ColumnDescription {
                name: field.name().clone(),
                data_type: field.data_type().to_string(),
                nullable: field.is_nullable(),
            })
            .collect();

        let null_counts = batch
            .schema()
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, column)| (field.name().clone(), column.null_count()))
            .collect();

        Self {
            run_id: run_id.to_string(),
            table: table.to_string(),
            record_count: batch.num_rows(),
            partition_columns: partition_columns.iter().map(|c| c.to_string()).collect(),
            partitions: partitions_from_keys(table_prefix, files),
            files: files.iter().map(|f| f.to_string()).collect(),
            schema,
            null_counts,
            created_at: Utc::now(),
        }
    }
}

/// Distinct hive partition directories (`year=2018/month=11`) of `keys`,
/// relative to `table_prefix`.
pub fn partitions_from_keys(table_prefix: &Path, keys: &[Path]) -> Vec<String> {
    let mut partitions = BTreeSet::new();

    for key in keys {
        let Some(parts) = key.prefix_match(table_prefix) else {
            continue;
        };
        let segments: Vec<String> = parts
            .map(|part| part.as_ref().to_string())
            .filter(|segment| PARTITION_SEGMENT.is_match(segment))
            .collect();
        if !segments.is_empty() {
            partitions.insert(segments.join("/"));
        }
    }

    partitions.into_iter().collect()
}
