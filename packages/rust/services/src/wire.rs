//! Wire-format payloads from the extraction service, and their
//! normalization into domain types.
//!
//! The extraction backend is permissive about what it emits: accuracies
//! arrive as numbers or as strings with a `%` suffix, titles may be blank,
//! kinds may be inventions. Everything is normalized here, at the
//! transport boundary, so the core only ever sees well-formed records.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;

use coursetrack_shared::{ExtractedRecord, ExtractionOutcome, RecordKind, StudyPlan};

/// Accuracy used when the extraction service omits one.
const DEFAULT_ACCURACY: f64 = 100.0;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Raw `/extract_assignments` response body.
#[derive(Debug, Deserialize)]
pub(crate) struct RawExtractionResponse {
    #[serde(default)]
    pub records: Vec<RawRecord>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub cached_plans: BTreeMap<String, StudyPlan>,
}

/// One record as the extraction service emits it.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub accuracy: Option<RawAccuracy>,
    #[serde(default)]
    pub low_confidence: Option<bool>,
}

/// Accuracy value: a number, or a string like `"85"` or `"85%"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawAccuracy {
    Number(f64),
    Text(String),
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize a raw extraction response into a domain outcome.
///
/// `local_fingerprint` (the SHA-256 of the uploaded bytes) substitutes for
/// a fingerprint the server did not return.
pub(crate) fn normalize_response(
    raw: RawExtractionResponse,
    local_fingerprint: String,
) -> ExtractionOutcome {
    ExtractionOutcome {
        records: raw.records.into_iter().map(normalize_record).collect(),
        fingerprint: Some(raw.fingerprint.unwrap_or(local_fingerprint)),
        cached_plans: raw.cached_plans,
    }
}

fn normalize_record(raw: RawRecord) -> ExtractedRecord {
    let title = raw
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    ExtractedRecord {
        title,
        due_date: raw.due_date.as_deref().and_then(parse_due_date),
        kind: raw.kind.as_deref().map(parse_kind).unwrap_or_default(),
        accuracy: normalize_accuracy(raw.accuracy),
        low_confidence: raw.low_confidence,
    }
}

/// ISO dates only, never times. Unparseable dates degrade to `None` rather
/// than rejecting the record.
fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn parse_kind(raw: &str) -> RecordKind {
    match raw.trim().to_ascii_lowercase().as_str() {
        "assignment" => RecordKind::Assignment,
        "test" => RecordKind::Test,
        "quiz" => RecordKind::Quiz,
        "exam" => RecordKind::Exam,
        "project" => RecordKind::Project,
        "presentation" => RecordKind::Presentation,
        _ => RecordKind::Other,
    }
}

/// Missing or unparseable accuracies count as fully confident.
fn normalize_accuracy(raw: Option<RawAccuracy>) -> f64 {
    let value = match raw {
        None => return DEFAULT_ACCURACY,
        Some(RawAccuracy::Number(n)) => n,
        Some(RawAccuracy::Text(s)) => {
            let cleaned = s.trim().trim_end_matches('%').trim();
            if cleaned.is_empty() {
                return DEFAULT_ACCURACY;
            }
            match cleaned.parse::<f64>() {
                Ok(n) => n,
                Err(_) => return DEFAULT_ACCURACY,
            }
        }
    };

    (value.clamp(0.0, 100.0) * 100.0).round() / 100.0
}
