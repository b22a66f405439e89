//! Session state owned by the coordinator.
//!
//! All mutable state of one interactive session lives here, behind a
//! single owner: the aggregator's record list, the study plan cache, the
//! per-document match results, and the ingested-document registry.
//! Nothing is persisted beyond the session.

use tracing::info;

use coursetrack_shared::{DocumentMatches, SessionId};

use crate::aggregator::Aggregator;
use crate::plans::PlanCache;

/// One document processed during this session.
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    /// Display name as uploaded.
    pub name: String,
    /// Content fingerprint, when the extraction service provided one.
    pub fingerprint: Option<String>,
}

/// All state of one interactive session.
#[derive(Debug, Default)]
pub struct Session {
    /// Identifier for log correlation.
    pub id: SessionId,
    pub aggregator: Aggregator,
    pub plans: PlanCache,
    pub matches: DocumentMatches,
    /// Documents ingested so far, in upload order.
    pub documents: Vec<IngestedDocument>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with fresh zero-value state.
    ///
    /// The aggregator (including its id counter), the plan cache, the
    /// match results, and the document registry are cleared together;
    /// partial clears are not permitted. A new session id is assigned.
    pub fn reset(&mut self) {
        let fresh = Session::new();
        info!(old = %self.id, new = %fresh.id, "session reset");
        *self = fresh;
    }
}
