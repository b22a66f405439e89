//! The CourseTrack coordinator.
//!
//! Sits between raw per-document extraction results and the final
//! export/study-plan steps:
//! - [`aggregator`] — stable identity and user overrides across a
//!   multi-document batch
//! - [`pipeline`] — sequential ingestion with fail-fast batch semantics
//! - [`plans`] — per-course study plan cache and generation coordinator
//! - [`matches`] — best-effort, per-document social matching
//! - [`export`] — calendar export preparation
//! - [`session`] — the single owned state object; reset replaces it whole
//!
//! The coordinator is transport-agnostic: each external service appears as
//! an async trait at its seam, implemented over HTTP in
//! `coursetrack-services`.

pub mod aggregator;
pub mod export;
pub mod matches;
pub mod pipeline;
pub mod plans;
pub mod session;

pub use aggregator::{Aggregator, RecordEntry, RecordPatch};
pub use export::{CalendarService, prepare_export};
pub use matches::{MatchService, normalize_handle, sync_matches};
pub use pipeline::{
    ExtractionService, IngestReport, ProgressReporter, SilentProgress, ingest_documents,
};
pub use plans::{
    ALL_COURSES, CourseGroup, CourseOverview, GenerationReport, PlanCache, PlanService,
    ensure_generated, group_by_course, overviews,
};
pub use session::{IngestedDocument, Session};
