use crate::error::{CrmError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Returns the first candidate that is present and non-empty.
pub fn first_present<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates.iter().flatten().copied().find(|s| !s.is_empty())
}

/// Calendar-date prefix of an upstream timestamp string (first 10 characters).
pub fn day_key(raw: &str) -> String {
    raw.chars().take(10).collect()
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse an upstream timestamp. Accepts RFC 3339, a naive ISO date-time with
/// second or minute precision (taken as UTC, optional trailing `Z`) or a bare
/// `YYYY-MM-DD` (UTC midnight).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = raw.strip_suffix('Z').unwrap_or(raw);
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Identifier that upstream sends as either a string or a number.
/// Other JSON types are treated as absent.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Time field as a string, or epoch milliseconds rendered as RFC 3339.
/// Other JSON types are treated as absent.
fn lenient_time<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        _ => None,
    })
}

/// Inclusive time window built from two calendar dates.
///
/// `start` is the first second of `from`, `end` the last second of `to`.
/// An inverted range is accepted and simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Build a window from `YYYY-MM-DD` strings.
    pub fn from_dates(from: &str, to: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| CrmError::validation("Invalid from/to dates"))
        };
        let from = parse(from)?;
        let to = parse(to)?;
        let last_second = NaiveTime::from_hms_opt(23, 59, 59)
            .ok_or_else(|| CrmError::validation("Invalid from/to dates"))?;
        Ok(Self {
            start: from.and_time(NaiveTime::MIN).and_utc(),
            end: to.and_time(last_second).and_utc(),
        })
    }

    /// Upstream query value for the window start (`YYYY-MM-DDT00:00:00Z`).
    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Upstream query value for the window end (`YYYY-MM-DDT23:59:59Z`).
    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// A conversation record from the upstream search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub contact_id: Option<String>,
}

impl Conversation {
    pub fn id(&self) -> Option<&str> {
        first_present(&[self.id.as_deref()])
    }

    pub fn contact_id(&self) -> Option<&str> {
        first_present(&[self.contact_id.as_deref()])
    }
}

/// A single conversation message. Upstream uses several overlapping
/// conventions for authorship, so every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub message_by: Option<String>,
    #[serde(default)]
    pub author_type: Option<String>,
    #[serde(default)]
    pub from_role: Option<String>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub date_added: Option<String>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub timestamp: Option<String>,
}

impl Message {
    /// Raw time string: `dateAdded`, else `createdAt`, else `timestamp`.
    pub fn time_field(&self) -> Option<&str> {
        first_present(&[
            self.date_added.as_deref(),
            self.created_at.as_deref(),
            self.timestamp.as_deref(),
        ])
    }
}

/// One page of `GET /conversations/search`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPage {
    #[serde(default)]
    pub conversations: Option<Vec<Conversation>>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// One page of `GET /conversations/{id}/messages`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Pagination state shared by every paginated upstream resource.
pub trait Paginated {
    /// Cursor for the following page; `None` once the resource is exhausted.
    fn next_token(&self) -> Option<String>;
}

impl Paginated for ConversationPage {
    fn next_token(&self) -> Option<String> {
        self.next_page_token.clone().filter(|t| !t.is_empty())
    }
}

impl Paginated for MessagePage {
    fn next_token(&self) -> Option<String> {
        self.next_page_token.clone().filter(|t| !t.is_empty())
    }
}

/// A calendar event from `GET /calendars/events`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub date_added: Option<String>,
}

impl CalendarEvent {
    /// Day bucket: date prefix of `startTime`, else of `dateAdded`.
    pub fn day(&self) -> Option<String> {
        first_present(&[self.start_time.as_deref(), self.date_added.as_deref()])
            .map(day_key)
            .filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventListing {
    #[serde(default)]
    pub events: Option<Vec<CalendarEvent>>,
}

/// A calendar record in any of the naming conventions upstream uses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub calendar_name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarListing {
    #[serde(default)]
    pub calendars: Option<Vec<CalendarRecord>>,
    #[serde(default)]
    pub items: Option<Vec<CalendarRecord>>,
}

/// A location record in any of the naming conventions upstream uses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationListing {
    #[serde(default)]
    pub locations: Option<Vec<LocationRecord>>,
    #[serde(default)]
    pub items: Option<Vec<LocationRecord>>,
}
