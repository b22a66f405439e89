//! Confidence classification for extracted records.

use coursetrack_shared::ExtractedRecord;

/// Accuracy scores strictly below this value are low confidence.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 80.0;

/// Whether an extraction result should be treated as low confidence.
///
/// The explicit flag, when set by the extraction service, wins over the
/// numeric threshold. Low-confidence records are retained, never dropped;
/// they surface as editable, visually distinguished entries.
pub fn is_low_confidence(accuracy: f64, explicit: Option<bool>) -> bool {
    explicit.unwrap_or(false) || accuracy < LOW_CONFIDENCE_THRESHOLD
}

/// Classify a whole record.
pub fn classify(record: &ExtractedRecord) -> bool {
    is_low_confidence(record.accuracy, record.low_confidence)
}
