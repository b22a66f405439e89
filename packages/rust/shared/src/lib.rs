//! Shared types, error model, and configuration for CourseTrack.
//!
//! This crate is the foundation depended on by all other CourseTrack crates.
//! It provides:
//! - [`CourseTrackError`] — the unified error type
//! - Domain types ([`ExtractedRecord`], [`CommittedRecord`], [`StudyPlan`],
//!   [`MatchEntry`], [`RecordId`], [`SessionId`])
//! - Service request/response contracts ([`ExtractionOutcome`],
//!   [`PlanRequest`], [`ExportRequest`], [`MatchPublish`], [`MatchQuery`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BackendConfig, DefaultsConfig, ProfileConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, require_handle,
};
pub use error::{CourseTrackError, Result};
pub use types::{
    CommittedRecord, DocumentMatches, DocumentUpload, ExportRecord, ExportRequest,
    ExtractedRecord, ExtractionOutcome, MatchEntry, MatchPublish, MatchQuery, PlanRequest,
    RecordId, RecordKind, SessionId, StudyPlan,
};
