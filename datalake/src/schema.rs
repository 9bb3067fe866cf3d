use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use once_cell::sync::Lazy;
use std::sync::Arc;

pub const UTC: &str = "UTC";

fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Millisecond, Some(UTC.into()))
}

pub fn songs_schema() -> Schema {
    Schema::new(vec![
        Field::new("song_id", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, false),
        Field::new("artist_id", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("duration", DataType::Float64, false),
    ])
}

pub fn artists_schema() -> Schema {
    Schema::new(vec![
        Field::new("artist_id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("location", DataType::Utf8, true),
        Field::new("latitude", DataType::Float64, true),
        Field::new("longitude", DataType::Float64, true),
    ])
}

pub fn users_schema() -> Schema {
    Schema::new(vec![
        Field::new("user_id", DataType::Utf8, false),
        Field::new("first_name", DataType::Utf8, true),
        Field::new("last_name", DataType::Utf8, true),
        Field::new("gender", DataType::Utf8, true),
        Field::new("level", DataType::Utf8, true),
    ])
}

pub fn time_schema() -> Schema {
    Schema::new(vec![
        Field::new("start_time", timestamp_type(), false),
        Field::new("hour", DataType::Int32, false),
        Field::new("day", DataType::Int32, false),
        Field::new("week", DataType::Int32, false),
        Field::new("month", DataType::Int32, false),
        Field::new("year", DataType::Int32, false),
        Field::new("weekday", DataType::Int32, false),
    ])
}

// year and month are derived from start_time and only exist as partition keys
pub fn songplays_schema() -> Schema {
    Schema::new(vec![
        Field::new("songplay_id", DataType::Int64, false),
        Field::new("start_time", timestamp_type(), false),
        Field::new("user_id", DataType::Utf8, true),
        Field::new("level", DataType::Utf8, true),
        Field::new("song_id", DataType::Utf8, true),
        Field::new("artist_id", DataType::Utf8, true),
        Field::new("session_id", DataType::Int64, true),
        Field::new("location", DataType::Utf8, true),
        Field::new("user_agent", DataType::Utf8, true),
        Field::new("year", DataType::Int32, false),
        Field::new("month", DataType::Int32, false),
    ])
}

static SONGS_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| Arc::new(songs_schema()));
static ARTISTS_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| Arc::new(artists_schema()));
static USERS_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| Arc::new(users_schema()));
static TIME_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| Arc::new(time_schema()));
static SONGPLAYS_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| Arc::new(songplays_schema()));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StarTable {
    Songs,
    Artists,
    Users,
    Time,
    Songplays,
}

impl StarTable {
    pub const ALL: [StarTable; 5] = [
        StarTable::Songs,
        StarTable::Artists,
        StarTable::Users,
        StarTable::Time,
        StarTable::Songplays,
    ];

    /// Table name, also used as the destination directory.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Songs => "songs",
            Self::Artists => "artists",
            Self::Users => "users",
            Self::Time => "time",
            Self::Songplays => "songplays",
        }
    }

    pub fn partition_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Songs => &["year", "artist_id"],
            Self::Time | Self::Songplays => &["year", "month"],
            Self::Artists | Self::Users => &[],
        }
    }

    pub fn schema(&self) -> SchemaRef {
        match self {
            Self::Songs => SONGS_SCHEMA.clone(),
            Self::Artists => ARTISTS_SCHEMA.clone(),
            Self::Users => USERS_SCHEMA.clone(),
            Self::Time => TIME_SCHEMA.clone(),
            Self::Songplays => SONGPLAYS_SCHEMA.clone(),
        }
    }
}

impl std::fmt::Display for StarTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
