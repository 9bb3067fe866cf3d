mod source;
mod tables;

pub use source::{LogRecord, NEXT_SONG_PAGE, SongRecord};
pub use tables::{ArtistRow, SongRow, SongplayRow, TimeRow, UserRow};
