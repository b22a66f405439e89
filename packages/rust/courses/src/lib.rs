//! Pure course-level classification functions for CourseTrack.
//!
//! Two small, deterministic, I/O-free functions used across the whole
//! pipeline: resolving a document display name to a canonical course code,
//! and deciding whether an extracted record is low confidence.

pub mod confidence;
pub mod resolver;

pub use confidence::{LOW_CONFIDENCE_THRESHOLD, classify, is_low_confidence};
pub use resolver::{GENERAL_COURSE, resolve, resolve_or_general};
