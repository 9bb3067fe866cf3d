use crate::models::{ArtistRow, LogRecord, SongRow, SongplayRow};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SongplayStats {
    pub plays: usize,
    /// Plays with no catalog match; emitted with null song and artist ids.
    pub unresolved: usize,
    /// Plays dropped because `ts` is not a representable instant.
    pub invalid_timestamps: usize,
}

/// Lookup of catalog songs by exact title and duration, cross-checked
/// against the artist name.
pub struct SongIndex<'a> {
    candidates: HashMap<(&'a str, u64), Vec<&'a SongRow>>,
    artist_names: HashMap<&'a str, &'a str>,
}

impl<'a> SongIndex<'a> {
    pub fn new(songs: &'a [SongRow], artists: &'a [ArtistRow]) -> Self {
        let mut candidates: HashMap<(&str, u64), Vec<&SongRow>> = HashMap::new();
        for song in songs {
            if let Some(bits) = duration_key(song.duration) {
                candidates
                    .entry((song.title.as_str(), bits))
                    .or_default()
                    .push(song);
            }
        }
        for list in candidates.values_mut() {
            list.sort_by(|a, b| a.song_id.cmp(&b.song_id));
        }

        let artist_names = artists
            .iter()
            .map(|artist| (artist.artist_id.as_str(), artist.name.as_str()))
            .collect();

        Self {
            candidates,
            artist_names,
        }
    }

    /// Returns the lowest song id whose title, duration and artist name all
    /// match exactly.
    pub fn resolve(&self, title: &str, artist: &str, duration: f64) -> Option<&'a SongRow> {
        let bits = duration_key(duration)?;
        self.candidates
            .get(&(title, bits))?
            .iter()
            .copied()
            .find(|song| self.artist_names.get(song.artist_id.as_str()) == Some(&artist))
    }

    fn resolve_event(&self, record: &LogRecord) -> Option<&'a SongRow> {
        match (&record.song_title, &record.artist_name, record.duration) {
            (Some(title), Some(artist), Some(duration)) => self.resolve(title, artist, duration),
            _ => None,
        }
    }
}

fn duration_key(duration: f64) -> Option<u64> {
    if duration.is_nan() {
        return None;
    }
    // -0.0 and 0.0 compare equal but differ in bits
    Some(if duration == 0.0 { 0 } else { duration.to_bits() })
}

/// Builds one fact row per song-play event, in input order, numbering them
/// from 1.
pub fn build_songplays(
    logs: &[LogRecord],
    songs: &[SongRow],
    artists: &[ArtistRow],
) -> (Vec<SongplayRow>, SongplayStats) {
    let index = SongIndex::new(songs, artists);
    let mut rows = Vec::new();
    let mut stats = SongplayStats::default();

    for record in logs.iter().filter(|record| record.is_song_play()) {
        let Some(start_time) = record.event_time() else {
            stats.invalid_timestamps += 1;
            debug!(ts = record.event_timestamp, "Dropping song play with invalid timestamp");
            continue;
        };

        let song = index.resolve_event(record);
        let row = SongplayRow {
            songplay_id: rows.len() as i64 + 1,
            start_time,
            user_id: record.user_id.clone(),
            level: record.level.clone(),
            song_id: song.map(|s| s.song_id.clone()),
            artist_id: song.map(|s| s.artist_id.clone()),
            session_id: record.session_id,
            location: record.location.clone(),
            user_agent: record.user_agent.clone(),
        };
        if !row.is_resolved() {
            stats.unresolved += 1;
        }
        rows.push(row);
    }

    stats.plays = rows.len();
    (rows, stats)
}
