//! Core domain types for CourseTrack sessions.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for session identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new time-sortable session identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

/// Stable identifier for one extracted record within a session.
///
/// Assigned sequentially by the aggregator at ingestion, starting at 0.
/// Ids are never reused, even when the record is later excluded — they are
/// the correlation key for user edits and inclusion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RecordKind
// ---------------------------------------------------------------------------

/// Category of an extracted course event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    #[default]
    Assignment,
    Test,
    Quiz,
    Exam,
    Project,
    Presentation,
    /// Catch-all for kinds the extraction service invents.
    #[serde(other)]
    Other,
}

impl RecordKind {
    /// Lowercase wire/display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::Test => "test",
            Self::Quiz => "quiz",
            Self::Exam => "exam",
            Self::Project => "project",
            Self::Presentation => "presentation",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ExtractedRecord
// ---------------------------------------------------------------------------

/// One candidate assignment extracted from one document, as accepted from
/// the extraction service (already normalized by the client).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Event title.
    pub title: String,
    /// ISO due date, never a time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Event category.
    #[serde(default)]
    pub kind: RecordKind,
    /// Extraction confidence in [0, 100].
    pub accuracy: f64,
    /// Explicit low-confidence override from the extraction service.
    /// When set to `true` it wins over the numeric threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_confidence: Option<bool>,
}

// ---------------------------------------------------------------------------
// CommittedRecord
// ---------------------------------------------------------------------------

/// An included record after commit: user overrides resolved, derived
/// fields (accuracy, confidence, fingerprint) carried through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommittedRecord {
    /// Stable id assigned at ingestion.
    pub id: RecordId,
    /// Effective title (override if edited, else original).
    pub title: String,
    /// Effective due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Effective event category.
    pub kind: RecordKind,
    /// Extraction confidence, never overridable.
    pub accuracy: f64,
    /// Effective low-confidence classification.
    pub low_confidence: bool,
    /// Display name of the originating document.
    pub source_document: String,
    /// Content fingerprint of the originating document, never overridable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

// ---------------------------------------------------------------------------
// StudyPlan
// ---------------------------------------------------------------------------

/// Opaque study-plan payload from the generation service. The coordinator
/// never inspects its contents, only its presence in the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    /// Brief description of the study approach.
    pub overview: String,
    /// Weekly recommendations; index + 1 = week number.
    #[serde(default)]
    pub weekly_schedule: Vec<String>,
    /// Practical tips.
    #[serde(default)]
    pub study_tips: Vec<String>,
    /// Recommended resources and tools.
    #[serde(default)]
    pub resource_recommendations: String,
}

// ---------------------------------------------------------------------------
// MatchEntry
// ---------------------------------------------------------------------------

/// One opted-in handle published against a document fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEntry {
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Whether this entry is the viewer's own handle.
    #[serde(default)]
    pub is_self: bool,
}

/// Match results keyed by source document display name.
pub type DocumentMatches = BTreeMap<String, Vec<MatchEntry>>;

// ---------------------------------------------------------------------------
// Service contracts
// ---------------------------------------------------------------------------

/// One uploaded document, input to the extraction service.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Display name (may carry a `.pdf` extension).
    pub name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Result of extracting one document, as consumed by the aggregator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    /// Extracted candidate records, normalized.
    pub records: Vec<ExtractedRecord>,
    /// Content fingerprint shared by all records from this document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Study plans the server already holds for this document's courses.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cached_plans: BTreeMap<String, StudyPlan>,
}

/// Request body for one study-plan generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Committed records of one course group.
    pub records: Vec<CommittedRecord>,
    /// Representative fingerprint of the group — the generation cache key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Ask the server to regenerate even if its cache holds a plan.
    #[serde(default)]
    pub force_regenerate: bool,
}

/// Request body for publishing the user's handle against a fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPublish {
    pub fingerprint: String,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Request body for fetching the handles published against a fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchQuery {
    pub fingerprint: String,
    pub viewer_handle: String,
}

/// One calendar-ready record handed to the serialization service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Title, prefixed with the resolved course code where one exists.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub kind: RecordKind,
}

/// Full payload for the calendar serialization service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Target calendar title.
    pub calendar_name: String,
    pub records: Vec<ExportRecord>,
}
