//! The assignment aggregator.
//!
//! Owns the growing, ordered collection of extracted records across a
//! multi-document batch: assigns stable identifiers at ingestion, applies
//! user overrides, and exposes the committed (included, override-resolved)
//! view that feeds export and study-plan generation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use coursetrack_shared::{
    CommittedRecord, CourseTrackError, ExtractedRecord, ExtractionOutcome, RecordId, RecordKind,
    Result,
};

// ---------------------------------------------------------------------------
// RecordPatch
// ---------------------------------------------------------------------------

/// User-editable fields of one record. Absent fields are left untouched.
///
/// Accuracy and fingerprint are never overridable; commit carries them
/// through unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecordKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included: Option<bool>,
}

// ---------------------------------------------------------------------------
// RecordEntry
// ---------------------------------------------------------------------------

/// One extracted record as held by the aggregator, with its stable id,
/// provenance, selection state, and any pending user overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Stable id, assigned at ingestion, never reused.
    pub id: RecordId,
    /// The record as extracted.
    pub record: ExtractedRecord,
    /// Display name of the originating document.
    pub source_document: String,
    /// Content fingerprint of the originating document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Selection state; only included records proceed past commit.
    pub included: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    title_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date_override: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind_override: Option<RecordKind>,
}

impl RecordEntry {
    /// Title after overrides.
    pub fn effective_title(&self) -> &str {
        self.title_override.as_deref().unwrap_or(&self.record.title)
    }

    /// Due date after overrides.
    pub fn effective_due_date(&self) -> Option<NaiveDate> {
        self.due_date_override.or(self.record.due_date)
    }

    /// Kind after overrides.
    pub fn effective_kind(&self) -> RecordKind {
        self.kind_override.unwrap_or(self.record.kind)
    }

    /// Low-confidence classification; overrides never change it.
    pub fn is_low_confidence(&self) -> bool {
        coursetrack_courses::classify(&self.record)
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Ordered, append-only collection of extracted records for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aggregator {
    entries: Vec<RecordEntry>,
    next_id: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one document's extraction result.
    ///
    /// Each record receives the next sequential [`RecordId`] (monotonic,
    /// never reused) and is tagged with the document name and the
    /// outcome's fingerprint. Records from a later document always sort
    /// after all records from earlier documents; there is no re-sort.
    ///
    /// Returns the ids assigned, in order.
    pub fn ingest(&mut self, document_name: &str, outcome: &ExtractionOutcome) -> Vec<RecordId> {
        let mut assigned = Vec::with_capacity(outcome.records.len());

        for record in &outcome.records {
            let id = RecordId(self.next_id);
            self.next_id += 1;

            self.entries.push(RecordEntry {
                id,
                record: record.clone(),
                source_document: document_name.to_string(),
                fingerprint: outcome.fingerprint.clone(),
                included: true,
                title_override: None,
                due_date_override: None,
                kind_override: None,
            });
            assigned.push(id);
        }

        debug!(
            document = document_name,
            records = assigned.len(),
            total = self.entries.len(),
            "records ingested"
        );

        assigned
    }

    /// Apply a user edit to the record with the given id.
    ///
    /// Only the fields present in the patch are touched. An unknown id is
    /// a validation error surfaced to the caller, never a silent no-op.
    pub fn apply_override(&mut self, id: RecordId, patch: &RecordPatch) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| CourseTrackError::validation(format!("unknown record id {id}")))?;

        if let Some(title) = &patch.title {
            entry.title_override = Some(title.clone());
        }
        if let Some(due_date) = patch.due_date {
            entry.due_date_override = Some(due_date);
        }
        if let Some(kind) = patch.kind {
            entry.kind_override = Some(kind);
        }
        if let Some(included) = patch.included {
            entry.included = included;
        }

        Ok(())
    }

    /// The ordered sequence of included records with overrides resolved.
    pub fn commit(&self) -> Vec<CommittedRecord> {
        self.entries
            .iter()
            .filter(|e| e.included)
            .map(|e| CommittedRecord {
                id: e.id,
                title: e.effective_title().to_string(),
                due_date: e.effective_due_date(),
                kind: e.effective_kind(),
                accuracy: e.record.accuracy,
                low_confidence: e.is_low_confidence(),
                source_document: e.source_document.clone(),
                fingerprint: e.fingerprint.clone(),
            })
            .collect()
    }

    /// All entries, in ingestion order.
    pub fn entries(&self) -> &[RecordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries classified as low confidence.
    pub fn low_confidence_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_low_confidence()).count()
    }

    /// Clear all records and restart the id counter at zero.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(title: &str, accuracy: f64) -> ExtractedRecord {
        ExtractedRecord {
            title: title.into(),
            due_date: NaiveDate::from_ymd_opt(2026, 9, 15),
            kind: RecordKind::Assignment,
            accuracy,
            low_confidence: None,
        }
    }

    fn make_outcome(titles: &[(&str, f64)], fingerprint: Option<&str>) -> ExtractionOutcome {
        ExtractionOutcome {
            records: titles.iter().map(|(t, a)| make_record(t, *a)).collect(),
            fingerprint: fingerprint.map(String::from),
            cached_plans: Default::default(),
        }
    }

    #[test]
    fn ids_are_sequential_across_documents() {
        let mut agg = Aggregator::new();
        let a = agg.ingest("a.pdf", &make_outcome(&[("hw1", 90.0), ("hw2", 85.0)], Some("fa")));
        let b = agg.ingest(
            "b.pdf",
            &make_outcome(&[("quiz", 95.0), ("exam", 88.0), ("proj", 91.0)], Some("fb")),
        );

        assert_eq!(a, vec![RecordId(0), RecordId(1)]);
        assert_eq!(b, vec![RecordId(2), RecordId(3), RecordId(4)]);
        assert_eq!(agg.len(), 5);
    }

    #[test]
    fn exclusion_preserves_remaining_ids() {
        let mut agg = Aggregator::new();
        agg.ingest("a.pdf", &make_outcome(&[("hw1", 90.0), ("hw2", 85.0)], None));
        agg.ingest(
            "b.pdf",
            &make_outcome(&[("quiz", 95.0), ("exam", 88.0), ("proj", 91.0)], None),
        );

        agg.apply_override(
            RecordId(1),
            &RecordPatch {
                included: Some(false),
                ..Default::default()
            },
        )
        .expect("known id");

        let committed = agg.commit();
        let ids: Vec<u64> = committed.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![0, 2, 3, 4]);
    }

    #[test]
    fn unknown_id_is_an_error() {
        let mut agg = Aggregator::new();
        agg.ingest("a.pdf", &make_outcome(&[("hw1", 90.0)], None));

        let err = agg
            .apply_override(RecordId(99), &RecordPatch::default())
            .expect_err("unknown id must be rejected");
        assert!(err.to_string().contains("unknown record id 99"));
    }

    #[test]
    fn commit_resolves_overrides_but_not_accuracy() {
        let mut agg = Aggregator::new();
        agg.ingest("CS101.pdf", &make_outcome(&[("hw1", 72.0)], Some("f1")));

        agg.apply_override(
            RecordId(0),
            &RecordPatch {
                title: Some("Homework 1 (revised)".into()),
                due_date: NaiveDate::from_ymd_opt(2026, 10, 1),
                kind: Some(RecordKind::Project),
                included: None,
            },
        )
        .expect("known id");

        let committed = agg.commit();
        assert_eq!(committed.len(), 1);
        let rec = &committed[0];
        assert_eq!(rec.title, "Homework 1 (revised)");
        assert_eq!(rec.due_date, NaiveDate::from_ymd_opt(2026, 10, 1));
        assert_eq!(rec.kind, RecordKind::Project);
        // Derived fields survive edits untouched.
        assert_eq!(rec.accuracy, 72.0);
        assert!(rec.low_confidence);
        assert_eq!(rec.fingerprint.as_deref(), Some("f1"));
    }

    #[test]
    fn low_confidence_follows_accuracy_and_explicit_flag() {
        let mut agg = Aggregator::new();
        let mut outcome = make_outcome(&[("hw1", 90.0), ("hw2", 60.0)], None);
        outcome.records.push(ExtractedRecord {
            title: "flagged".into(),
            due_date: None,
            kind: RecordKind::Other,
            accuracy: 99.0,
            low_confidence: Some(true),
        });
        agg.ingest("a.pdf", &outcome);

        let flags: Vec<bool> = agg.entries().iter().map(|e| e.is_low_confidence()).collect();
        assert_eq!(flags, vec![false, true, true]);
        assert_eq!(agg.low_confidence_count(), 2);
    }

    #[test]
    fn reset_restarts_id_counter() {
        let mut agg = Aggregator::new();
        agg.ingest("a.pdf", &make_outcome(&[("hw1", 90.0)], None));
        agg.reset();

        assert!(agg.is_empty());
        let ids = agg.ingest("b.pdf", &make_outcome(&[("quiz", 95.0)], None));
        assert_eq!(ids, vec![RecordId(0)]);
    }

    #[test]
    fn patch_json_shape_matches_the_edits_file_format() {
        // The CLI's --edits file carries exactly these fields.
        let patch: RecordPatch = serde_json::from_str(
            r#"{"title": "Essay draft", "due_date": "2026-11-05", "included": false}"#,
        )
        .expect("parse patch");

        assert_eq!(patch.title.as_deref(), Some("Essay draft"));
        assert_eq!(patch.due_date, NaiveDate::from_ymd_opt(2026, 11, 5));
        assert!(patch.kind.is_none());
        assert_eq!(patch.included, Some(false));

        let mut agg = Aggregator::new();
        agg.ingest("CS101.pdf", &make_outcome(&[("hw1", 90.0)], None));
        agg.apply_override(RecordId(0), &patch).expect("known id");

        let committed = agg.commit();
        assert!(committed.is_empty());
    }

    #[test]
    fn ingestion_order_is_append_only() {
        let mut agg = Aggregator::new();
        agg.ingest("b.pdf", &make_outcome(&[("late", 90.0)], None));
        agg.ingest("a.pdf", &make_outcome(&[("early", 90.0)], None));

        let titles: Vec<&str> = agg.entries().iter().map(|e| e.effective_title()).collect();
        // Upload order, not alphabetical.
        assert_eq!(titles, vec!["late", "early"]);
    }
}
