//! Document ingestion pipeline: uploads → extraction → aggregation.
//!
//! Documents are processed strictly in upload order, one awaited
//! extraction call at a time. The first failure propagates immediately and
//! aborts the remaining documents (fail-fast), but already-ingested
//! documents are not rolled back — partial progress stays available so the
//! user can retry the failed document alone.

use std::time::Instant;

use tracing::{info, instrument};

use coursetrack_shared::{CourseTrackError, DocumentUpload, ExtractionOutcome, Result};

use crate::session::{IngestedDocument, Session};

// ---------------------------------------------------------------------------
// Service trait
// ---------------------------------------------------------------------------

/// The per-document extraction backend.
///
/// Futures are awaited on the calling task; no `Send` bound is required.
#[allow(async_fn_in_trait)]
pub trait ExtractionService {
    /// Extract candidate records from one document.
    async fn extract(&self, document: &DocumentUpload) -> Result<ExtractionOutcome>;
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for multi-step workflows.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Step-level progress within the current phase.
    fn step(&self, current: usize, total: usize, detail: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn step(&self, _current: usize, _total: usize, _detail: &str) {}
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Summary of a completed ingestion batch.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Documents extracted and aggregated.
    pub documents_processed: usize,
    /// Records appended to the aggregator.
    pub records_added: usize,
    /// Records classified low confidence across the whole session.
    pub low_confidence: usize,
    /// Study plans merged from the server's cache.
    pub precached_plans: usize,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Ingest a batch of uploaded documents into the session.
///
/// For each document, in upload order: await extraction, append the
/// records to the aggregator, and merge any pre-cached study plans into
/// the plan cache.
#[instrument(skip_all, fields(session = %session.id, documents = documents.len()))]
pub async fn ingest_documents<E: ExtractionService>(
    session: &mut Session,
    documents: &[DocumentUpload],
    service: &E,
    progress: &dyn ProgressReporter,
) -> Result<IngestReport> {
    let start = Instant::now();

    if documents.is_empty() {
        return Err(CourseTrackError::validation("no documents to ingest"));
    }

    progress.phase("Extracting assignments");
    let total = documents.len();
    let mut records_added = 0;
    let mut precached_plans = 0;

    for (i, document) in documents.iter().enumerate() {
        progress.step(i + 1, total, &format!("Processing {}", document.name));

        let outcome = service.extract(document).await?;

        let assigned = session.aggregator.ingest(&document.name, &outcome);
        records_added += assigned.len();
        precached_plans += session.plans.merge_precached(&outcome.cached_plans);
        session.documents.push(IngestedDocument {
            name: document.name.clone(),
            fingerprint: outcome.fingerprint.clone(),
        });

        info!(
            document = %document.name,
            records = assigned.len(),
            fingerprint = outcome.fingerprint.as_deref().unwrap_or("-"),
            "document ingested"
        );
    }

    let report = IngestReport {
        documents_processed: total,
        records_added,
        low_confidence: session.aggregator.low_confidence_count(),
        precached_plans,
        elapsed: start.elapsed(),
    };

    info!(
        documents = report.documents_processed,
        records = report.records_added,
        low_confidence = report.low_confidence,
        precached_plans = report.precached_plans,
        elapsed_ms = report.elapsed.as_millis(),
        "ingestion complete"
    );

    Ok(report)
}
