use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongRow {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistRow {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRow {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

/// Calendar breakdown of one song-play instant, in UTC.
///
/// `week` is the ISO 8601 week of year and `weekday` uses ISO numbering,
/// Monday = 1 through Sunday = 7.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRow {
    pub start_time: DateTime<Utc>,
    pub hour: i32,
    pub day: i32,
    pub week: i32,
    pub month: i32,
    pub year: i32,
    pub weekday: i32,
}

impl TimeRow {
    pub fn from_instant(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            hour: start_time.hour() as i32,
            day: start_time.day() as i32,
            week: start_time.iso_week().week() as i32,
            month: start_time.month() as i32,
            year: start_time.year(),
            weekday: start_time.weekday().number_from_monday() as i32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongplayRow {
    pub songplay_id: i64,
    pub start_time: DateTime<Utc>,
    pub user_id: Option<String>,
    pub level: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl SongplayRow {
    pub fn is_resolved(&self) -> bool {
        self.song_id.is_some() && self.artist_id.is_some()
    }

    pub fn year(&self) -> i32 {
        self.start_time.year()
    }

    pub fn month(&self) -> i32 {
        self.start_time.month() as i32
    }
}
