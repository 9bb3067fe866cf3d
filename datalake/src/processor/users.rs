use crate::models::{LogRecord, TimeRow, UserRow};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// One row per user id across all log events, taken from the event with
/// the greatest timestamp. Equal timestamps go to the later event.
pub fn build_user_dimension(records: &[LogRecord]) -> Vec<UserRow> {
    let mut latest: BTreeMap<&str, &LogRecord> = BTreeMap::new();

    for record in records {
        let Some(user_id) = record.user_id.as_deref() else {
            continue;
        };

        latest
            .entry(user_id)
            .and_modify(|current| {
                if record.event_timestamp >= current.event_timestamp {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    latest
        .into_iter()
        .map(|(user_id, record)| UserRow {
            user_id: user_id.to_string(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            gender: record.gender.clone(),
            level: record.level.clone(),
        })
        .collect()
}

/// One row per distinct song-play start time.
pub fn build_time_dimension(records: &[LogRecord]) -> Vec<TimeRow> {
    let start_times: BTreeSet<DateTime<Utc>> =
        records.iter().filter_map(LogRecord::play_time).collect();

    start_times.into_iter().map(TimeRow::from_instant).collect()
}
