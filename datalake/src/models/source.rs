use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Page value marking a song-play event in the activity logs.
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// One song catalog entry as found in `song_data` files.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub artist_name: String,
    #[serde(default)]
    pub artist_latitude: Option<f64>,
    #[serde(default)]
    pub artist_longitude: Option<f64>,
    #[serde(default)]
    pub artist_location: Option<String>,
    pub duration: f64,
    #[serde(default)]
    pub year: i32,
}

/// One line of the user activity logs in `log_data` files.
///
/// Only `ts` is mandatory. Events other than song plays (logins, page
/// views, ...) carry nulls for most of the descriptive fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Event time in epoch milliseconds.
    #[serde(rename = "ts")]
    pub event_timestamp: i64,
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(rename = "song", default)]
    pub song_title: Option<String>,
    #[serde(rename = "artist", default)]
    pub artist_name: Option<String>,
    #[serde(rename = "length", default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl LogRecord {
    pub fn is_song_play(&self) -> bool {
        self.page.as_deref() == Some(NEXT_SONG_PAGE)
    }

    /// Event time as a UTC instant, `None` when `ts` is out of range.
    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.event_timestamp)
    }

    /// Start time of a song play. `None` for other pages and for plays
    /// whose timestamp cannot be represented.
    pub fn play_time(&self) -> Option<DateTime<Utc>> {
        if self.is_song_play() {
            self.event_time()
        } else {
            None
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
}

/// Accepts `"10"`, `10`, `""` or `null`. Empty strings become `None`.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawId>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawId::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(RawId::Integer(value)) => Some(value.to_string()),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_song_record() {
        let line = r#"{"num_songs": 1, "artist_id": "ARJIE2Y1187B994AB7", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Line Renaud", "song_id": "SOUPIRU12A6D4FA1E1", "title": "Der Kleine Dompfaff", "duration": 152.92036, "year": 0}"#;

        let record: SongRecord = serde_json::from_str(line).unwrap();

        assert_eq!(record.song_id, "SOUPIRU12A6D4FA1E1");
        assert_eq!(record.artist_name, "Line Renaud");
        assert_eq!(record.artist_latitude, None);
        assert_eq!(record.artist_location.as_deref(), Some(""));
        assert_eq!(record.duration, 152.92036);
        assert_eq!(record.year, 0);
    }

    #[test]
    fn test_parse_song_play_event() {
        let line = r#"{"artist":"Des'ree","auth":"Logged In","firstName":"Kaylee","gender":"F","itemInSession":1,"lastName":"Summers","length":246.30812,"level":"free","location":"Phoenix-Mesa-Scottsdale, AZ","method":"PUT","page":"NextSong","registration":1540344794796.0,"sessionId":139,"song":"You Gotta Be","status":200,"ts":1541106106796,"userAgent":"Mozilla/5.0","userId":"8"}"#;

        let record: LogRecord = serde_json::from_str(line).unwrap();

        assert!(record.is_song_play());
        assert_eq!(record.user_id.as_deref(), Some("8"));
        assert_eq!(record.song_title.as_deref(), Some("You Gotta Be"));
        assert_eq!(record.artist_name.as_deref(), Some("Des'ree"));
        assert_eq!(record.duration, Some(246.30812));
        assert_eq!(record.session_id, Some(139));
        assert_eq!(record.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(
            record.event_time().unwrap().to_rfc3339(),
            "2018-11-01T21:01:46.796+00:00"
        );
    }

    #[test]
    fn test_parse_non_play_event_with_nulls() {
        let line = r#"{"artist":null,"auth":"Logged Out","firstName":null,"gender":null,"itemInSession":0,"lastName":null,"length":null,"level":"paid","location":null,"method":"PUT","page":"Login","registration":null,"sessionId":52,"song":null,"status":307,"ts":1541207073796,"userAgent":null,"userId":""}"#;

        let record: LogRecord = serde_json::from_str(line).unwrap();

        assert!(!record.is_song_play());
        assert_eq!(record.user_id, None);
        assert_eq!(record.song_title, None);
        assert_eq!(record.duration, None);
    }

    #[test]
    fn test_numeric_user_id() {
        let record: LogRecord =
            serde_json::from_str(r#"{"ts": 1541990000000, "userId": 10, "page": "Home"}"#).unwrap();
        assert_eq!(record.user_id.as_deref(), Some("10"));
    }

    #[test]
    fn test_missing_timestamp_is_rejected() {
        let result = serde_json::from_str::<LogRecord>(r#"{"userId": "10", "page": "NextSong"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_timestamp_has_no_event_time() {
        let record: LogRecord =
            serde_json::from_str(r#"{"ts": 9223372036854775807, "page": "NextSong"}"#).unwrap();
        assert!(record.event_time().is_none());
    }
}
