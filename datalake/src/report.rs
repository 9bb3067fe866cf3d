use crate::processor::StarSchema;
use crate::reader::ScanStats;
use crate::schema::StarTable;
use crate::writer::TableOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Summary of one pipeline run, printed as JSON by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub songs: ScanStats,
    pub logs: ScanStats,
    pub unresolved_songplays: usize,
    pub invalid_timestamps: usize,
    pub row_counts: BTreeMap<String, usize>,
    pub tables: Vec<TableOutcome>,
}

impl RunReport {
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            songs: ScanStats::default(),
            logs: ScanStats::default(),
            unresolved_songplays: 0,
            invalid_timestamps: 0,
            row_counts: BTreeMap::new(),
            tables: Vec::new(),
        }
    }

    pub fn record_star(&mut self, star: &StarSchema) {
        self.unresolved_songplays = star.songplay_stats.unresolved;
        self.invalid_timestamps = star.songplay_stats.invalid_timestamps;
        self.row_counts = StarTable::ALL
            .iter()
            .map(|table| (table.name().to_string(), star.row_count(*table)))
            .collect();
    }

    pub fn finish(&mut self, tables: Vec<TableOutcome>) {
        self.tables = tables;
        self.finished_at = Some(Utc::now());
    }

    pub fn failed_tables(&self) -> impl Iterator<Item = &TableOutcome> {
        self.tables.iter().filter(|outcome| !outcome.is_written())
    }

    /// True only when all five tables were written.
    pub fn is_success(&self) -> bool {
        self.tables.len() == StarTable::ALL.len() && self.failed_tables().next().is_none()
    }
}
