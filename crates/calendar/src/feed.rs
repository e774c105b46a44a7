//! Minimal iCalendar feed parsing: line unfolding, VEVENT extraction,
//! and the handful of properties the import engine cares about.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// One event as the feed describes it, before diffing against local
/// records. `uid` is the feed-provided idempotency key.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEvent {
    pub uid: String,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default)]
pub struct ParsedFeed {
    pub events: Vec<FeedEvent>,
    /// VEVENT blocks dropped for lacking a UID or a parseable DTSTART.
    pub skipped: usize,
}

/// Parse an iCalendar payload into events.
///
/// Tolerant by design: unknown properties are ignored and malformed
/// events are skipped (and counted), never an error — a partially
/// usable feed still imports.
pub fn parse_feed(payload: &str) -> ParsedFeed {
    let mut parsed = ParsedFeed::default();

    let mut in_event = false;
    let mut current: Vec<(String, String)> = Vec::new();

    for line in unfold_lines(payload) {
        if line.eq_ignore_ascii_case("BEGIN:VEVENT") {
            in_event = true;
            current.clear();
            continue;
        }
        if line.eq_ignore_ascii_case("END:VEVENT") {
            if in_event {
                match build_event(&current) {
                    Some(event) => parsed.events.push(event),
                    None => parsed.skipped += 1,
                }
            }
            in_event = false;
            continue;
        }
        if !in_event {
            continue;
        }
        if let Some((name, value)) = split_property(&line) {
            current.push((name, value));
        }
    }

    parsed
}

/// Join folded lines: a line starting with space or tab continues the
/// previous one (RFC 5545 §3.1).
fn unfold_lines(payload: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in payload.lines() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(cont) = line.strip_prefix(' ').or_else(|| line.strip_prefix('\t')) {
            if let Some(last) = out.last_mut() {
                last.push_str(cont);
                continue;
            }
        }
        out.push(line.to_string());
    }
    out
}

/// Split `NAME;PARAM=X:value` into (NAME, value), dropping parameters.
fn split_property(line: &str) -> Option<(String, String)> {
    let (head, value) = line.split_once(':')?;
    let name = head.split(';').next().unwrap_or(head);
    Some((name.to_ascii_uppercase(), value.to_string()))
}

fn build_event(props: &[(String, String)]) -> Option<FeedEvent> {
    let get = |name: &str| {
        props
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    };

    let uid = get("UID").map(str::trim).filter(|s| !s.is_empty())?;
    let starts_at = parse_datetime(get("DTSTART")?)?;

    Some(FeedEvent {
        uid: uid.to_string(),
        title: get("SUMMARY")
            .map(unescape_text)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "(untitled)".to_string()),
        starts_at,
        ends_at: get("DTEND").and_then(parse_datetime),
        location: get("LOCATION").map(unescape_text).filter(|s| !s.is_empty()),
        description: get("DESCRIPTION").map(unescape_text).filter(|s| !s.is_empty()),
    })
}

/// Accepts the three DTSTART shapes seen in the wild: UTC datetimes
/// (`...Z`), floating datetimes (treated as UTC), and all-day dates.
fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y%m%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

fn unescape_text(value: &str) -> String {
    value
        .replace("\\n", "\n")
        .replace("\\N", "\n")
        .replace("\\,", ",")
        .replace("\\;", ";")
        .replace("\\\\", "\\")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "BEGIN:VCALENDAR\r\n\
        VERSION:2.0\r\n\
        BEGIN:VEVENT\r\n\
        UID:show-1@venue.example\r\n\
        SUMMARY:Midnight Ramble\r\n\
        DTSTART:20260704T200000Z\r\n\
        DTEND:20260704T230000Z\r\n\
        LOCATION:The Velvet Room\\, Asbury Park\r\n\
        END:VEVENT\r\n\
        END:VCALENDAR\r\n";

    #[test]
    fn parses_a_basic_event() {
        let parsed = parse_feed(FEED);
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.skipped, 0);

        let event = &parsed.events[0];
        assert_eq!(event.uid, "show-1@venue.example");
        assert_eq!(event.title, "Midnight Ramble");
        assert_eq!(event.location.as_deref(), Some("The Velvet Room, Asbury Park"));
        assert_eq!(event.starts_at, Utc.with_ymd_and_hms(2026, 7, 4, 20, 0, 0).unwrap());
        assert!(event.ends_at.is_some());
    }

    #[test]
    fn folded_lines_are_joined() {
        let feed = "BEGIN:VEVENT\r\n\
            UID:folded-1\r\n\
            SUMMARY:An Evening\r\n With Friends\r\n\
            DTSTART:20260801\r\n\
            END:VEVENT\r\n";
        let parsed = parse_feed(feed);
        assert_eq!(parsed.events[0].title, "An EveningWith Friends");
    }

    #[test]
    fn all_day_dates_become_midnight_utc() {
        let feed = "BEGIN:VEVENT\nUID:d1\nSUMMARY:Festival\nDTSTART;VALUE=DATE:20260815\nEND:VEVENT\n";
        let parsed = parse_feed(feed);
        assert_eq!(
            parsed.events[0].starts_at,
            Utc.with_ymd_and_hms(2026, 8, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn events_without_uid_or_start_are_skipped() {
        let feed = "BEGIN:VEVENT\nSUMMARY:No uid\nDTSTART:20260815\nEND:VEVENT\n\
            BEGIN:VEVENT\nUID:u2\nSUMMARY:No start\nEND:VEVENT\n\
            BEGIN:VEVENT\nUID:u3\nSUMMARY:Ok\nDTSTART:20260815\nEND:VEVENT\n";
        let parsed = parse_feed(feed);
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.events[0].uid, "u3");
    }

    #[test]
    fn missing_summary_gets_a_placeholder() {
        let feed = "BEGIN:VEVENT\nUID:u1\nDTSTART:20260815T190000\nEND:VEVENT\n";
        let parsed = parse_feed(feed);
        assert_eq!(parsed.events[0].title, "(untitled)");
    }
}
