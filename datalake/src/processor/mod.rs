mod batch;
mod songplays;
mod songs;
mod users;

pub use batch::{artists_batch, songplays_batch, songs_batch, time_batch, users_batch};
pub use songplays::{SongIndex, SongplayStats, build_songplays};
pub use songs::build_song_dimensions;
pub use users::{build_time_dimension, build_user_dimension};

use crate::models::{ArtistRow, LogRecord, SongRecord, SongRow, SongplayRow, TimeRow, UserRow};
use crate::schema::StarTable;
use arrow::record_batch::RecordBatch;
use common::Result;
use tracing::info;

/// The five tables of one run, built in memory from the full input.
#[derive(Debug, Clone, Default)]
pub struct StarSchema {
    pub songs: Vec<SongRow>,
    pub artists: Vec<ArtistRow>,
    pub users: Vec<UserRow>,
    pub time: Vec<TimeRow>,
    pub songplays: Vec<SongplayRow>,
    pub songplay_stats: SongplayStats,
}

impl StarSchema {
    pub fn build(song_records: &[SongRecord], log_records: &[LogRecord]) -> Self {
        let (songs, artists) = build_song_dimensions(song_records);
        let users = build_user_dimension(log_records);
        let time = build_time_dimension(log_records);
        let (songplays, songplay_stats) = build_songplays(log_records, &songs, &artists);

        info!(
            songs = songs.len(),
            artists = artists.len(),
            users = users.len(),
            time = time.len(),
            songplays = songplays.len(),
            unresolved = songplay_stats.unresolved,
            invalid_timestamps = songplay_stats.invalid_timestamps,
            "Built star schema"
        );

        Self {
            songs,
            artists,
            users,
            time,
            songplays,
            songplay_stats,
        }
    }

    pub fn row_count(&self, table: StarTable) -> usize {
        match table {
            StarTable::Songs => self.songs.len(),
            StarTable::Artists => self.artists.len(),
            StarTable::Users => self.users.len(),
            StarTable::Time => self.time.len(),
            StarTable::Songplays => self.songplays.len(),
        }
    }

    pub fn to_batch(&self, table: StarTable) -> Result<RecordBatch> {
        match table {
            StarTable::Songs => songs_batch(&self.songs),
            StarTable::Artists => artists_batch(&self.artists),
            StarTable::Users => users_batch(&self.users),
            StarTable::Time => time_batch(&self.time),
            StarTable::Songplays => songplays_batch(&self.songplays),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashMap};

    fn song_record() -> SongRecord {
        serde_json::from_str(
            r#"{"song_id":"SOSA1","title":"Test Song","artist_id":"AR1","artist_name":"Test Artist","duration":210.5,"year":2000}"#,
        )
        .unwrap()
    }

    fn log_record(line: &str) -> LogRecord {
        serde_json::from_str(line).unwrap()
    }

    const MATCHING_PLAY: &str = r#"{"page":"NextSong","song":"Test Song","artist":"Test Artist","length":210.5,"ts":1541990000000,"userId":"10","level":"free","sessionId":100,"location":"NY","userAgent":"UA"}"#;

    #[test]
    fn test_single_matching_play() {
        let schema = StarSchema::build(&[song_record()], &[log_record(MATCHING_PLAY)]);

        assert_eq!(schema.songplays.len(), 1);
        let play = &schema.songplays[0];
        assert_eq!(play.song_id.as_deref(), Some("SOSA1"));
        assert_eq!(play.artist_id.as_deref(), Some("AR1"));
        assert_eq!(play.start_time.timestamp_millis(), 1_541_990_000_000);
        assert_eq!(schema.users.len(), 1);
        assert_eq!(schema.users[0].user_id, "10");
        assert_eq!(schema.time.len(), 1);
        assert_eq!(schema.songplay_stats.unresolved, 0);
    }

    #[test]
    fn test_non_play_event_feeds_users_only() {
        let home = r#"{"page":"Home","ts":1541990000000,"userId":"11","firstName":"Ann","level":"paid"}"#;

        let schema = StarSchema::build(&[song_record()], &[log_record(home)]);

        assert!(schema.songplays.is_empty());
        assert!(schema.time.is_empty());
        assert_eq!(schema.users.len(), 1);
        assert_eq!(schema.users[0].user_id, "11");
    }

    #[test]
    fn test_unmatched_play_has_null_keys() {
        let unmatched = r#"{"page":"NextSong","song":"Other Song","artist":"Test Artist","length":210.5,"ts":1541990000000,"userId":"10"}"#;

        let schema = StarSchema::build(&[song_record()], &[log_record(unmatched)]);

        assert_eq!(schema.songplays.len(), 1);
        assert_eq!(schema.songplays[0].song_id, None);
        assert_eq!(schema.songplays[0].artist_id, None);
        assert_eq!(schema.songplay_stats.unresolved, 1);
    }

    fn sample_logs() -> Vec<LogRecord> {
        [
            MATCHING_PLAY,
            r#"{"page":"NextSong","song":"Nope","artist":"Nobody","length":1.0,"ts":1541990060000,"userId":"12","level":"paid"}"#,
            r#"{"page":"Logout","ts":1541990070000,"userId":"12","level":"free"}"#,
            r#"{"page":"NextSong","song":"Test Song","artist":"Test Artist","length":210.5,"ts":1543622400000,"userId":"10","level":"paid"}"#,
            r#"{"page":"NextSong","song":"Test Song","artist":"Test Artist","length":210.5,"ts":1541990000000,"userId":"13"}"#,
        ]
        .iter()
        .map(|line| log_record(line))
        .collect()
    }

    #[test]
    fn test_fact_keys_reference_dimensions() {
        let schema = StarSchema::build(&[song_record()], &sample_logs());

        let songs: HashMap<_, _> = schema.songs.iter().map(|s| (s.song_id.as_str(), s)).collect();
        let artist_ids: BTreeSet<_> = schema.artists.iter().map(|a| a.artist_id.as_str()).collect();
        let user_ids: BTreeSet<_> = schema.users.iter().map(|u| u.user_id.as_str()).collect();
        let times: BTreeSet<_> = schema.time.iter().map(|t| t.start_time).collect();

        for play in &schema.songplays {
            if let Some(song_id) = &play.song_id {
                let song = songs[song_id.as_str()];
                assert_eq!(song.title, "Test Song");
                assert_eq!(song.duration, 210.5);
                assert!(artist_ids.contains(play.artist_id.as_deref().unwrap()));
            }
            if let Some(user_id) = &play.user_id {
                assert!(user_ids.contains(user_id.as_str()));
            }
            assert!(times.contains(&play.start_time));
        }

        let fact_times: BTreeSet<_> = schema.songplays.iter().map(|p| p.start_time).collect();
        assert_eq!(fact_times, times);
    }

    #[test]
    fn test_rebuild_is_stable_under_reordering() {
        let logs = sample_logs();
        let mut reversed = logs.clone();
        reversed.reverse();

        let first = StarSchema::build(&[song_record()], &logs);
        let second = StarSchema::build(&[song_record()], &reversed);

        assert_eq!(first.songs, second.songs);
        assert_eq!(first.artists, second.artists);
        assert_eq!(first.users, second.users);
        assert_eq!(first.time, second.time);

        let strip_ids = |rows: &[SongplayRow]| {
            let mut rows: Vec<_> = rows
                .iter()
                .map(|row| SongplayRow {
                    songplay_id: 0,
                    ..row.clone()
                })
                .collect();
            rows.sort_by(|a, b| (a.start_time, &a.user_id).cmp(&(b.start_time, &b.user_id)));
            rows
        };
        assert_eq!(strip_ids(&first.songplays), strip_ids(&second.songplays));
    }

    #[test]
    fn test_row_counts_match_batches() {
        let schema = StarSchema::build(&[song_record()], &sample_logs());
        for table in StarTable::ALL {
            let batch = schema.to_batch(table).unwrap();
            assert_eq!(batch.num_rows(), schema.row_count(table), "{}", table);
        }
    }
}
