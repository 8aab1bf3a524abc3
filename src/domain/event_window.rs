use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

use crate::domain::models::{CampaignEvent, OutputRecord, OutputShape};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventWindowError {
    #[error("event {code} has an unreadable end timestamp: {value}")]
    InvalidTimestamp { code: String, value: String },
}

/// Parses an ISO-8601 timestamp as served by the campaign API.
///
/// Values without an explicit zone are taken as UTC. Seconds may be omitted.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(trimmed, format).ok())
    {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = trimmed
        .strip_suffix('Z')
        .or_else(|| trimmed.strip_suffix('z'))
        .unwrap_or(trimmed);

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .map(|parsed| parsed.and_utc())
}

/// Keeps the events that have not ended by `now`, ordered by start.
///
/// The result is never empty: with nothing upcoming it holds the single
/// null placeholder record.
pub fn upcoming_windows(
    events: &[CampaignEvent],
    now: DateTime<Utc>,
    shape: OutputShape,
) -> Result<Vec<OutputRecord>, EventWindowError> {
    let mut upcoming = Vec::with_capacity(events.len());

    for event in events {
        let end = parse_timestamp(&event.end_at).ok_or_else(|| {
            EventWindowError::InvalidTimestamp {
                code: event.code.clone(),
                value: event.end_at.clone(),
            }
        })?;

        if end > now {
            upcoming.push(event);
        }
    }

    if upcoming.is_empty() {
        return Ok(vec![OutputRecord::placeholder()]);
    }

    // All starts share the API's ISO-8601 layout, so string order is time order.
    upcoming.sort_by(|a, b| a.start_at.cmp(&b.start_at));

    Ok(upcoming
        .into_iter()
        .map(|event| OutputRecord::from_event(event, shape))
        .collect())
}
