use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::store::ClientError;

/// Title and body limits are a UI contract; the client never enforces them.
pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_BODY_LEN: usize = 5000;

/// Time-of-day layouts after the date separator. Hour-only is handled separately.
const CLOCK_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// One remote blog entry. Immutable once decoded: edits go through the server
/// and come back as a fresh authoritative copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: i64,
    pub author: String,
    pub created: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

/// A `created` value as it arrives, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    Text(String),
    Structured(DateTime<Utc>),
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp::Structured(value)
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Timestamp::Text(value.to_string())
    }
}

impl From<String> for Timestamp {
    fn from(value: String) -> Self {
        Timestamp::Text(value)
    }
}

impl Timestamp {
    /// Normalizes to a structured UTC time. Unparseable text is an error, never a default.
    pub fn normalize(self) -> Result<DateTime<Utc>, ClientError> {
        match self {
            Timestamp::Structured(dt) => Ok(dt),
            Timestamp::Text(text) => parse_iso8601(&text).ok_or_else(|| {
                ClientError::Malformed(format!("created is not an ISO-8601 timestamp: {text:?}"))
            }),
        }
    }
}

/// Parses `YYYY-MM-DD[(T| )HH[:MM[:SS[.fff]]][Z|±HH[:MM]|±HHMM]]`.
/// A missing offset means UTC; a bare date is midnight UTC.
fn parse_iso8601(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    let (date, time) = match text.find(['T', ' ']) {
        Some(idx) => (&text[..idx], Some(&text[idx + 1..])),
        None => (text, None),
    };
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let Some(time) = time else {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    };

    let (clock, offset) = split_offset(time)?;
    let naive = date.and_time(parse_clock(clock)?);
    match offset {
        Some(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc)),
        None => Some(naive.and_utc()),
    }
}

fn split_offset(time: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(clock) = time.strip_suffix('Z') {
        return Some((clock, Some(FixedOffset::east_opt(0)?)));
    }
    match time.rfind(['+', '-']) {
        Some(idx) => Some((&time[..idx], Some(parse_offset(&time[idx..])?))),
        None => Some((time, None)),
    }
}

/// `±HH`, `±HH:MM` or `±HHMM`.
fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, rest) = match text.split_at_checked(1)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_clock(clock: &str) -> Option<NaiveTime> {
    if clock.len() == 2 && clock.chars().all(|c| c.is_ascii_digit()) {
        return NaiveTime::from_hms_opt(clock.parse().ok()?, 0, 0);
    }
    CLOCK_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(clock, format).ok())
}

impl Post {
    pub fn new(
        id: i64,
        author: impl Into<String>,
        created: impl Into<Timestamp>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Ok(Post {
            id,
            author: author.into(),
            created: created.into().normalize()?,
            title: title.into(),
            body: body.into(),
        })
    }

    /// Decodes a post from a raw JSON object, field by field.
    ///
    /// `author` falls back to `username`. `created` may be an ISO-8601 string or
    /// a number of seconds since the Unix epoch.
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        let map = value
            .as_object()
            .ok_or_else(|| ClientError::Malformed(format!("expected a post object, got {value}")))?;

        let id = require(map, "id")?
            .as_i64()
            .ok_or_else(|| ClientError::Malformed("id must be an integer".to_string()))?;
        let author = match map.get("author") {
            Some(_) => string_field(map, "author")?,
            None => string_field(map, "username")
                .map_err(|_| ClientError::Malformed("missing field: author".to_string()))?,
        };
        let created = timestamp_field(require(map, "created")?)?;

        Post::new(
            id,
            author,
            created,
            string_field(map, "title")?,
            string_field(map, "body")?,
        )
    }

    /// A post is "mine" iff its author equals the locally authenticated user.
    pub fn is_owned_by(&self, user: Option<&str>) -> bool {
        user == Some(self.author.as_str())
    }
}

fn require<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a Value, ClientError> {
    map.get(key)
        .ok_or_else(|| ClientError::Malformed(format!("missing field: {key}")))
}

fn string_field(map: &Map<String, Value>, key: &str) -> Result<String, ClientError> {
    require(map, key)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ClientError::Malformed(format!("{key} must be a string")))
}

fn timestamp_field(value: &Value) -> Result<Timestamp, ClientError> {
    match value {
        Value::String(text) => Ok(Timestamp::Text(text.clone())),
        Value::Number(n) => {
            let dt = match n.as_i64() {
                Some(secs) => DateTime::<Utc>::from_timestamp(secs, 0),
                None => n.as_f64().and_then(|secs| {
                    let whole = secs.floor();
                    let nanos = ((secs - whole) * 1e9).round() as u32;
                    DateTime::<Utc>::from_timestamp(whole as i64, nanos.min(999_999_999))
                }),
            };
            dt.map(Timestamp::Structured)
                .ok_or_else(|| ClientError::Malformed(format!("created out of range: {n}")))
        }
        other => Err(ClientError::Malformed(format!(
            "created must be a string or epoch seconds, got {other}"
        ))),
    }
}

/// A finite, forward-only run over one fetched collection.
/// Consumed exactly once; to start over, fetch again.
#[derive(Debug)]
pub struct PostSequence {
    items: std::vec::IntoIter<Post>,
}

impl PostSequence {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            items: posts.into_iter(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

impl Iterator for PostSequence {
    type Item = Post;

    fn next(&mut self) -> Option<Post> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}
