use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

// ── Raw input ─────────────────────────────────────────────────

/// One raw input attached to an import job (a forwarded email body,
/// an uploaded contract, a pasted announcement).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSource {
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub raw_text: String,
}

// ── Job status ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    NeedsReview,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::NeedsReview => "needs_review",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Statuses an explicit human retry may re-queue from.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::NeedsReview)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "needs_review" => Ok(JobStatus::NeedsReview),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(DomainError::InvalidJobStatus(other.to_string())),
        }
    }
}

// ── Extracted record ──────────────────────────────────────────

/// Structured candidate output for one show, assembled by the resolver
/// from accepted facts. All fields optional — presence is what the
/// confidence gate decides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedShow {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub venue_name: Option<String>,
    pub city: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub notes: Option<String>,
}

impl ExtractedShow {
    /// Fields that must be present (and above threshold) before a job
    /// may auto-complete.
    pub const REQUIRED_FIELDS: &'static [&'static str] = &["title", "date"];

    /// Apply a fact value to the named field. Returns false when the
    /// field is unknown or the value cannot be coerced.
    pub fn set_field(&mut self, field: &str, value: &serde_json::Value) -> bool {
        match field {
            "title" => Self::take_string(value).map(|v| self.title = Some(v)).is_some(),
            "date" => Self::take_date(value).map(|v| self.date = Some(v)).is_some(),
            "venue_name" => Self::take_string(value).map(|v| self.venue_name = Some(v)).is_some(),
            "city" => Self::take_string(value).map(|v| self.city = Some(v)).is_some(),
            "start_time" => Self::take_string(value).map(|v| self.start_time = Some(v)).is_some(),
            "end_time" => Self::take_string(value).map(|v| self.end_time = Some(v)).is_some(),
            "notes" => Self::take_string(value).map(|v| self.notes = Some(v)).is_some(),
            _ => false,
        }
    }

    pub fn field_is_set(&self, field: &str) -> bool {
        match field {
            "title" => self.title.is_some(),
            "date" => self.date.is_some(),
            "venue_name" => self.venue_name.is_some(),
            "city" => self.city.is_some(),
            "start_time" => self.start_time.is_some(),
            "end_time" => self.end_time.is_some(),
            "notes" => self.notes.is_some(),
            _ => false,
        }
    }

    fn take_string(value: &serde_json::Value) -> Option<String> {
        value
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn take_date(value: &serde_json::Value) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(value.as_str()?, "%Y-%m-%d").ok()
    }
}

// ── Candidate fact ────────────────────────────────────────────

/// A single extracted field value plus a confidence score. Adapter
/// output, not yet trusted — only the resolver writes `extracted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFact {
    pub field: String,
    pub value: serde_json::Value,
    pub confidence: f64,
}

impl CandidateFact {
    pub fn new(field: impl Into<String>, value: serde_json::Value, confidence: f64) -> Self {
        Self {
            field: field.into(),
            value,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

// ── Import job ────────────────────────────────────────────────

/// One ingestion attempt: raw sources in, structured candidate record
/// out, with a claim lease while a worker holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub status: JobStatus,
    pub raw_sources: Vec<RawSource>,
    pub extracted: Option<ExtractedShow>,
    /// Field path -> confidence in [0, 1], insertion-ordered.
    pub confidence_map: IndexMap<String, f64>,
    pub errors: Vec<String>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ImportJob {
    pub fn new(tenant_id: Uuid, raw_sources: Vec<RawSource>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            status: JobStatus::Pending,
            raw_sources,
            extracted: None,
            confidence_map: IndexMap::new(),
            errors: Vec::new(),
            claimed_by: None,
            claimed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Automatic-retry attempts consumed so far, derived from the
    /// recorded error history.
    pub fn attempts(&self) -> usize {
        self.errors.len()
    }

    /// Whether a `processing` claim has outlived its lease and may be
    /// re-claimed by another worker.
    pub fn claim_expired(&self, now: DateTime<Utc>, lease: chrono::Duration) -> bool {
        match (self.status, self.claimed_at) {
            (JobStatus::Processing, Some(at)) => now.signed_duration_since(at) > lease,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn status_roundtrip() {
        for s in ["pending", "processing", "needs_review", "completed", "failed"] {
            let parsed: JobStatus = s.parse().unwrap();
            assert_eq!(parsed.as_str(), s);
        }
        assert!("archived".parse::<JobStatus>().is_err());
    }

    #[test]
    fn set_field_coerces_dates() {
        let mut show = ExtractedShow::default();
        assert!(show.set_field("date", &json!("2026-07-04")));
        assert_eq!(show.date, Some(NaiveDate::from_ymd_opt(2026, 7, 4).unwrap()));
        assert!(!show.set_field("date", &json!("July 4th")));
        assert!(!show.set_field("headliner", &json!("x")));
    }

    #[test]
    fn set_field_rejects_blank_strings() {
        let mut show = ExtractedShow::default();
        assert!(!show.set_field("title", &json!("   ")));
        assert!(show.title.is_none());
    }

    #[test]
    fn claim_expiry_only_applies_to_processing() {
        let mut job = ImportJob::new(Uuid::new_v4(), vec![]);
        let now = Utc::now();
        assert!(!job.claim_expired(now, Duration::seconds(300)));

        job.status = JobStatus::Processing;
        job.claimed_by = Some("worker-1".into());
        job.claimed_at = Some(now - Duration::seconds(400));
        assert!(job.claim_expired(now, Duration::seconds(300)));
        assert!(!job.claim_expired(now, Duration::seconds(500)));
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(CandidateFact::new("title", json!("x"), 1.7).confidence, 1.0);
        assert_eq!(CandidateFact::new("title", json!("x"), -0.2).confidence, 0.0);
    }
}
