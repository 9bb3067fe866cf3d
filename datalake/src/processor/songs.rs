use crate::models::{ArtistRow, SongRecord, SongRow};
use std::collections::BTreeMap;

/// Projects the song and artist dimensions out of the catalog records.
///
/// Both tables are keyed on their id; for repeated ids the last record in
/// input order wins. Output is sorted by key.
pub fn build_song_dimensions(records: &[SongRecord]) -> (Vec<SongRow>, Vec<ArtistRow>) {
    let mut songs: BTreeMap<&str, SongRow> = BTreeMap::new();
    let mut artists: BTreeMap<&str, ArtistRow> = BTreeMap::new();

    for record in records {
        if !record.song_id.is_empty() {
            songs.insert(
                &record.song_id,
                SongRow {
                    song_id: record.song_id.clone(),
                    title: record.title.clone(),
                    artist_id: record.artist_id.clone(),
                    year: record.year,
                    duration: record.duration,
                },
            );
        }

        if !record.artist_id.is_empty() {
            artists.insert(
                &record.artist_id,
                ArtistRow {
                    artist_id: record.artist_id.clone(),
                    name: record.artist_name.clone(),
                    location: record.artist_location.clone(),
                    latitude: record.artist_latitude,
                    longitude: record.artist_longitude,
                },
            );
        }
    }

    (songs.into_values().collect(), artists.into_values().collect())
}
