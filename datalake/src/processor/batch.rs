//! Row-to-Arrow encoding for the star schema tables.

use crate::models::{ArtistRow, SongRow, SongplayRow, TimeRow, UserRow};
use crate::schema::{StarTable, UTC};
use arrow::array::{
    ArrayRef, Float64Array, Int32Array, Int64Array, StringArray, TimestampMillisecondArray,
};
use arrow::record_batch::RecordBatch;
use common::Result;
use std::sync::Arc;

fn utf8<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(values.map(Some).collect::<StringArray>())
}

fn nullable_utf8<'a>(values: impl Iterator<Item = Option<&'a str>>) -> ArrayRef {
    Arc::new(values.collect::<StringArray>())
}

fn timestamps(values: impl Iterator<Item = i64>) -> ArrayRef {
    Arc::new(TimestampMillisecondArray::from(values.collect::<Vec<_>>()).with_timezone(UTC))
}

fn int32(values: impl Iterator<Item = i32>) -> ArrayRef {
    Arc::new(Int32Array::from(values.collect::<Vec<_>>()))
}

pub fn songs_batch(rows: &[SongRow]) -> Result<RecordBatch> {
    let columns = vec![
        utf8(rows.iter().map(|r| r.song_id.as_str())),
        utf8(rows.iter().map(|r| r.title.as_str())),
        utf8(rows.iter().map(|r| r.artist_id.as_str())),
        int32(rows.iter().map(|r| r.year)),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.duration))) as ArrayRef,
    ];
    Ok(RecordBatch::try_new(StarTable::Songs.schema(), columns)?)
}

pub fn artists_batch(rows: &[ArtistRow]) -> Result<RecordBatch> {
    let columns = vec![
        utf8(rows.iter().map(|r| r.artist_id.as_str())),
        utf8(rows.iter().map(|r| r.name.as_str())),
        nullable_utf8(rows.iter().map(|r| r.location.as_deref())),
        Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.latitude))) as ArrayRef,
        Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.longitude))) as ArrayRef,
    ];
    Ok(RecordBatch::try_new(StarTable::Artists.schema(), columns)?)
}

pub fn users_batch(rows: &[UserRow]) -> Result<RecordBatch> {
    let columns = vec![
        utf8(rows.iter().map(|r| r.user_id.as_str())),
        nullable_utf8(rows.iter().map(|r| r.first_name.as_deref())),
        nullable_utf8(rows.iter().map(|r| r.last_name.as_deref())),
        nullable_utf8(rows.iter().map(|r| r.gender.as_deref())),
        nullable_utf8(rows.iter().map(|r| r.level.as_deref())),
    ];
    Ok(RecordBatch::try_new(StarTable::Users.schema(), columns)?)
}

pub fn time_batch(rows: &[TimeRow]) -> Result<RecordBatch> {
    let columns = vec![
        timestamps(rows.iter().map(|r| r.start_time.timestamp_millis())),
        int32(rows.iter().map(|r| r.hour)),
        int32(rows.iter().map(|r| r.day)),
        int32(rows.iter().map(|r| r.week)),
        int32(rows.iter().map(|r| r.month)),
        int32(rows.iter().map(|r| r.year)),
        int32(rows.iter().map(|r| r.weekday)),
    ];
    Ok(RecordBatch::try_new(StarTable::Time.schema(), columns)?)
}

pub fn songplays_batch(rows: &[SongplayRow]) -> Result<RecordBatch> {
    let columns = vec![
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.songplay_id))) as ArrayRef,
        timestamps(rows.iter().map(|r| r.start_time.timestamp_millis())),
        nullable_utf8(rows.iter().map(|r| r.user_id.as_deref())),
        nullable_utf8(rows.iter().map(|r| r.level.as_deref())),
        nullable_utf8(rows.iter().map(|r| r.song_id.as_deref())),
        nullable_utf8(rows.iter().map(|r| r.artist_id.as_deref())),
        Arc::new(Int64Array::from_iter(rows.iter().map(|r| r.session_id))) as ArrayRef,
        nullable_utf8(rows.iter().map(|r| r.location.as_deref())),
        nullable_utf8(rows.iter().map(|r| r.user_agent.as_deref())),
        int32(rows.iter().map(SongplayRow::year)),
        int32(rows.iter().map(SongplayRow::month)),
    ];
    Ok(RecordBatch::try_new(StarTable::Songplays.schema(), columns)?)
}
