//! Confidence-gated merge of candidate facts into a job's working record.

use indexmap::IndexMap;

use marquee_core::{CandidateFact, ExtractedShow};

#[derive(Debug, Clone)]
pub struct ResolverPolicy {
    /// Minimum confidence for a fact to be accepted into `extracted`.
    pub accept_threshold: f64,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self { accept_threshold: 0.8 }
    }
}

/// Outcome of resolving one job's candidate facts.
#[derive(Debug)]
pub struct Resolution {
    pub extracted: ExtractedShow,
    /// Field path -> confidence for every field the adapter proposed,
    /// accepted or not. Below-threshold entries are the review surface's
    /// suggestions.
    pub confidence_map: IndexMap<String, f64>,
    pub needs_review: bool,
    /// Audit entries for discarded conflicts and unusable values; the
    /// caller appends these to the job's error history.
    pub audit: Vec<String>,
}

/// Merge candidate facts into a structured record.
///
/// A fact is accepted iff its confidence meets the policy threshold.
/// Any required field missing or below threshold forces review: partial
/// structured success never silently becomes a completed job.
/// Conflicting facts for one field keep the higher-confidence value and
/// record the loser, never silently overwriting.
pub fn resolve(facts: &[CandidateFact], policy: &ResolverPolicy) -> Resolution {
    let mut best: IndexMap<&str, &CandidateFact> = IndexMap::new();
    let mut audit = Vec::new();

    for fact in facts {
        match best.get(fact.field.as_str()) {
            Some(current) if fact.confidence > current.confidence => {
                audit.push(format!(
                    "discarded conflicting value for '{}': {} (confidence {:.2}) in favor of {} (confidence {:.2})",
                    fact.field, current.value, current.confidence, fact.value, fact.confidence
                ));
                best.insert(fact.field.as_str(), fact);
            }
            Some(current) => {
                audit.push(format!(
                    "discarded conflicting value for '{}': {} (confidence {:.2}) in favor of {} (confidence {:.2})",
                    fact.field, fact.value, fact.confidence, current.value, current.confidence
                ));
            }
            None => {
                best.insert(fact.field.as_str(), fact);
            }
        }
    }

    let mut extracted = ExtractedShow::default();
    let mut confidence_map = IndexMap::new();
    let mut needs_review = false;

    for (field, fact) in &best {
        confidence_map.insert(field.to_string(), fact.confidence);

        if fact.confidence < policy.accept_threshold {
            // Retained as a low-confidence suggestion only.
            needs_review = true;
            continue;
        }
        if !extracted.set_field(field, &fact.value) {
            audit.push(format!(
                "unusable value for '{}': {} (confidence {:.2})",
                field, fact.value, fact.confidence
            ));
            needs_review = true;
        }
    }

    for required in ExtractedShow::REQUIRED_FIELDS {
        if !extracted.field_is_set(required) {
            needs_review = true;
        }
    }

    Resolution { extracted, confidence_map, needs_review, audit }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fact(field: &str, value: serde_json::Value, confidence: f64) -> CandidateFact {
        CandidateFact::new(field, value, confidence)
    }

    #[test]
    fn confident_required_fields_auto_complete() {
        let facts = vec![
            fact("title", json!("Midnight Ramble"), 0.95),
            fact("date", json!("2026-07-04"), 0.9),
            fact("venue_name", json!("The Velvet Room"), 0.85),
        ];
        let res = resolve(&facts, &ResolverPolicy::default());
        assert!(!res.needs_review);
        assert_eq!(res.extracted.title.as_deref(), Some("Midnight Ramble"));
        assert_eq!(res.confidence_map["date"], 0.9);
        assert!(res.audit.is_empty());
    }

    #[test]
    fn missing_required_date_forces_review() {
        // extraction returned a confident title but no usable date
        let facts = vec![
            fact("title", json!("Show"), 0.9),
            fact("date", json!(null), 0.0),
        ];
        let res = resolve(&facts, &ResolverPolicy::default());
        assert!(res.needs_review);
        assert!(res.extracted.date.is_none());
        // the suggestion is still visible to the review surface
        assert_eq!(res.confidence_map["date"], 0.0);
    }

    #[test]
    fn below_threshold_required_field_forces_review() {
        let facts = vec![
            fact("title", json!("Show"), 0.9),
            fact("date", json!("2026-07-04"), 0.5),
        ];
        let res = resolve(&facts, &ResolverPolicy::default());
        assert!(res.needs_review);
        assert!(res.extracted.date.is_none());
    }

    #[test]
    fn low_confidence_optional_field_still_flags_review() {
        let facts = vec![
            fact("title", json!("Show"), 0.9),
            fact("date", json!("2026-07-04"), 0.9),
            fact("city", json!("Asbury Park"), 0.3),
        ];
        let res = resolve(&facts, &ResolverPolicy::default());
        assert!(res.needs_review);
        assert!(res.extracted.city.is_none());
        assert_eq!(res.confidence_map["city"], 0.3);
    }

    #[test]
    fn conflicts_prefer_higher_confidence_and_leave_a_trail() {
        let facts = vec![
            fact("title", json!("Show"), 0.9),
            fact("date", json!("2026-07-04"), 0.85),
            fact("date", json!("2026-07-11"), 0.95),
        ];
        let res = resolve(&facts, &ResolverPolicy::default());
        assert_eq!(
            res.extracted.date,
            chrono::NaiveDate::from_ymd_opt(2026, 7, 11)
        );
        assert_eq!(res.confidence_map["date"], 0.95);
        assert_eq!(res.audit.len(), 1);
        assert!(res.audit[0].contains("2026-07-04"));
    }

    #[test]
    fn conflict_order_does_not_matter() {
        let a = vec![
            fact("date", json!("2026-07-11"), 0.95),
            fact("date", json!("2026-07-04"), 0.85),
        ];
        let b = vec![
            fact("date", json!("2026-07-04"), 0.85),
            fact("date", json!("2026-07-11"), 0.95),
        ];
        let res_a = resolve(&a, &ResolverPolicy::default());
        let res_b = resolve(&b, &ResolverPolicy::default());
        assert_eq!(res_a.extracted.date, res_b.extracted.date);
        assert_eq!(res_a.audit.len(), 1);
        assert_eq!(res_b.audit.len(), 1);
    }

    #[test]
    fn unusable_accepted_value_is_audited() {
        let facts = vec![
            fact("title", json!("Show"), 0.9),
            fact("date", json!("next Friday"), 0.9),
        ];
        let res = resolve(&facts, &ResolverPolicy::default());
        assert!(res.needs_review);
        assert!(res.extracted.date.is_none());
        assert!(res.audit.iter().any(|e| e.contains("unusable value for 'date'")));
    }
}
