use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

// ── Source ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Active,
    Paused,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Active => "active",
            SourceStatus::Paused => "paused",
        }
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SourceStatus::Active),
            "paused" => Ok(SourceStatus::Paused),
            other => Err(DomainError::InvalidSourceStatus(other.to_string())),
        }
    }
}

/// One subscribed external calendar feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarSyncSource {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub source_url: String,
    pub sync_interval_minutes: i32,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub status: SourceStatus,
}

impl CalendarSyncSource {
    pub fn new(
        tenant_id: Uuid,
        source_url: impl Into<String>,
        sync_interval_minutes: i32,
    ) -> Result<Self, DomainError> {
        if sync_interval_minutes <= 0 {
            return Err(DomainError::InvalidSyncInterval(sync_interval_minutes));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            source_url: source_url.into(),
            sync_interval_minutes,
            last_synced_at: None,
            last_error: None,
            status: SourceStatus::Active,
        })
    }

    /// A source is due when it has never synced, or its interval has
    /// elapsed since the last successful sync. Pure function over
    /// persisted timestamps — no in-memory schedule state.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_synced_at {
            None => true,
            Some(last) => {
                now.signed_duration_since(last)
                    >= Duration::minutes(self.sync_interval_minutes as i64)
            }
        }
    }
}

// ── Run history ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }
}

impl FromStr for RunStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(RunStatus::Success),
            "failed" => Ok(RunStatus::Failed),
            other => Err(DomainError::InvalidRunStatus(other.to_string())),
        }
    }
}

/// One execution attempt against a source. Every scheduler pass that
/// finds a source due produces exactly one of these, success or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarSyncRun {
    pub id: Uuid,
    pub source_id: Uuid,
    pub status: RunStatus,
    pub message: Option<String>,
    pub events_processed: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// ── Local event records ───────────────────────────────────────

/// A local schedule item materialized from a feed, keyed by the
/// feed-provided UID so re-imports update instead of duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub source_id: Uuid,
    pub external_uid: String,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(
        interval: i32,
        now: DateTime<Utc>,
        synced_minutes_ago: Option<i64>,
    ) -> CalendarSyncSource {
        let mut s = CalendarSyncSource::new(Uuid::new_v4(), "https://example.com/feed.ics", interval)
            .unwrap();
        s.last_synced_at = synced_minutes_ago.map(|m| now - Duration::minutes(m));
        s
    }

    #[test]
    fn never_synced_source_is_always_due() {
        let now = Utc::now();
        assert!(source(60, now, None).is_due(now));
    }

    #[test]
    fn due_boundary_is_inclusive() {
        let now = Utc::now();
        assert!(!source(60, now, Some(59)).is_due(now));
        assert!(source(60, now, Some(60)).is_due(now));
        assert!(source(60, now, Some(90)).is_due(now));
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        assert!(CalendarSyncSource::new(Uuid::new_v4(), "u", 0).is_err());
        assert!(CalendarSyncSource::new(Uuid::new_v4(), "u", -5).is_err());
    }
}
