//! Best-effort social matching keyed by document content fingerprint.
//!
//! Two users uploading byte-identical documents see each other's opted-in
//! handles. Each document's publish+fetch pair is isolated: one document's
//! failure is logged and yields an empty match list for that document
//! without touching the others.

use tracing::{info, instrument, warn};

use coursetrack_shared::{DocumentMatches, MatchEntry, MatchPublish, MatchQuery, Result};

use crate::pipeline::ProgressReporter;
use crate::session::IngestedDocument;

// ---------------------------------------------------------------------------
// MatchService
// ---------------------------------------------------------------------------

/// The social match publish/fetch backend.
#[allow(async_fn_in_trait)]
pub trait MatchService {
    /// Publish the viewer's handle against a document fingerprint.
    async fn publish(&self, request: &MatchPublish) -> Result<()>;

    /// Fetch the handles published against a document fingerprint.
    async fn fetch(&self, request: &MatchQuery) -> Result<Vec<MatchEntry>>;
}

// ---------------------------------------------------------------------------
// Handle normalization
// ---------------------------------------------------------------------------

/// Normalize a social handle: trim and strip a single leading `@`.
pub fn normalize_handle(handle: &str) -> String {
    let trimmed = handle.trim();
    let stripped = trimmed.strip_prefix('@').unwrap_or(trimmed);
    stripped.trim().to_string()
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Publish the viewer's handle and collect matches for every ingested
/// document that carries a fingerprint.
///
/// Best-effort: this never fails as a whole. A document whose publish or
/// fetch errors contributes an empty match list; documents without a
/// fingerprint are skipped entirely.
#[instrument(skip_all, fields(documents = documents.len()))]
pub async fn sync_matches<S: MatchService>(
    documents: &[IngestedDocument],
    handle: &str,
    avatar_url: Option<&str>,
    service: &S,
    progress: &dyn ProgressReporter,
) -> DocumentMatches {
    let mut results = DocumentMatches::new();

    let viewer = normalize_handle(handle);
    if viewer.is_empty() {
        warn!("empty social handle, skipping match sync");
        return results;
    }

    let fingerprinted: Vec<(&str, &str)> = documents
        .iter()
        .filter_map(|d| d.fingerprint.as_deref().map(|f| (d.name.as_str(), f)))
        .collect();
    let total = fingerprinted.len();

    for (i, (name, fingerprint)) in fingerprinted.into_iter().enumerate() {
        progress.step(i + 1, total, &format!("Matching {name}"));

        match sync_one(service, fingerprint, &viewer, avatar_url).await {
            Ok(mut entries) => {
                for entry in &mut entries {
                    entry.is_self =
                        normalize_handle(&entry.handle).eq_ignore_ascii_case(&viewer);
                }
                results.insert(name.to_string(), entries);
            }
            Err(e) => {
                warn!(document = name, error = %e, "social match failed, continuing");
                results.insert(name.to_string(), Vec::new());
            }
        }
    }

    info!(
        matched_documents = results.values().filter(|m| !m.is_empty()).count(),
        total,
        "match sync complete"
    );

    results
}

/// One document's publish+fetch pair.
async fn sync_one<S: MatchService>(
    service: &S,
    fingerprint: &str,
    viewer: &str,
    avatar_url: Option<&str>,
) -> Result<Vec<MatchEntry>> {
    service
        .publish(&MatchPublish {
            fingerprint: fingerprint.to_string(),
            handle: viewer.to_string(),
            avatar_url: avatar_url.map(String::from),
        })
        .await?;

    service
        .fetch(&MatchQuery {
            fingerprint: fingerprint.to_string(),
            viewer_handle: viewer.to_string(),
        })
        .await
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;

    use coursetrack_shared::CourseTrackError;

    use super::*;
    use crate::pipeline::SilentProgress;

    fn doc(name: &str, fingerprint: Option<&str>) -> IngestedDocument {
        IngestedDocument {
            name: name.into(),
            fingerprint: fingerprint.map(String::from),
        }
    }

    /// Returns a fixed peer list per fingerprint; fails whole documents by
    /// fingerprint, at either the publish or the fetch step.
    #[derive(Default)]
    struct MockMatchService {
        published: RefCell<Vec<MatchPublish>>,
        fail_publish: HashSet<String>,
        fail_fetch: HashSet<String>,
    }

    impl MatchService for MockMatchService {
        async fn publish(&self, request: &MatchPublish) -> Result<()> {
            if self.fail_publish.contains(&request.fingerprint) {
                return Err(CourseTrackError::match_failure("doc", "publish refused"));
            }
            self.published.borrow_mut().push(request.clone());
            Ok(())
        }

        async fn fetch(&self, request: &MatchQuery) -> Result<Vec<MatchEntry>> {
            if self.fail_fetch.contains(&request.fingerprint) {
                return Err(CourseTrackError::match_failure("doc", "fetch refused"));
            }
            Ok(vec![
                MatchEntry {
                    handle: request.viewer_handle.clone(),
                    avatar_url: None,
                    is_self: false,
                },
                MatchEntry {
                    handle: "@Peer".into(),
                    avatar_url: Some("https://cdn.example.com/peer.png".into()),
                    is_self: false,
                },
            ])
        }
    }

    #[test]
    fn handle_normalization() {
        assert_eq!(normalize_handle(" @Ada "), "Ada");
        assert_eq!(normalize_handle("ada"), "ada");
        assert_eq!(normalize_handle("@@ada"), "@ada");
        assert_eq!(normalize_handle("  "), "");
    }

    #[tokio::test]
    async fn self_entry_is_flagged_case_insensitively() {
        let service = MockMatchService::default();
        let docs = vec![doc("CS101.pdf", Some("f1"))];

        let matches = sync_matches(&docs, "@ADA", None, &service, &SilentProgress).await;
        let entries = &matches["CS101.pdf"];
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_self);
        assert!(!entries[1].is_self);
    }

    #[tokio::test]
    async fn one_failing_document_does_not_block_the_others() {
        let mut service = MockMatchService::default();
        service.fail_publish.insert("fb".to_string());
        let docs = vec![
            doc("a.pdf", Some("fa")),
            doc("b.pdf", Some("fb")),
            doc("c.pdf", Some("fc")),
        ];

        let matches = sync_matches(&docs, "ada", None, &service, &SilentProgress).await;

        assert_eq!(matches.len(), 3);
        assert!(!matches["a.pdf"].is_empty());
        assert!(matches["b.pdf"].is_empty());
        assert!(!matches["c.pdf"].is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_is_isolated_too() {
        let mut service = MockMatchService::default();
        service.fail_fetch.insert("fa".to_string());
        let docs = vec![doc("a.pdf", Some("fa")), doc("b.pdf", Some("fb"))];

        let matches = sync_matches(&docs, "ada", None, &service, &SilentProgress).await;
        assert!(matches["a.pdf"].is_empty());
        assert!(!matches["b.pdf"].is_empty());
        // Publish succeeded for both documents; only a's fetch failed.
        assert_eq!(service.published.borrow().len(), 2);
    }

    #[tokio::test]
    async fn documents_without_fingerprint_are_skipped() {
        let service = MockMatchService::default();
        let docs = vec![doc("a.pdf", Some("fa")), doc("nofp.pdf", None)];

        let matches = sync_matches(&docs, "ada", None, &service, &SilentProgress).await;
        assert_eq!(matches.len(), 1);
        assert!(!matches.contains_key("nofp.pdf"));
    }

    #[tokio::test]
    async fn published_handle_is_normalized() {
        let service = MockMatchService::default();
        let docs = vec![doc("a.pdf", Some("fa"))];

        sync_matches(
            &docs,
            " @ada ",
            Some("https://cdn.example.com/me.png"),
            &service,
            &SilentProgress,
        )
        .await;

        let published = service.published.borrow();
        assert_eq!(published[0].handle, "ada");
        assert_eq!(
            published[0].avatar_url.as_deref(),
            Some("https://cdn.example.com/me.png")
        );
    }

    #[tokio::test]
    async fn empty_handle_skips_sync() {
        let service = MockMatchService::default();
        let docs = vec![doc("a.pdf", Some("fa"))];

        let matches = sync_matches(&docs, "@", None, &service, &SilentProgress).await;
        assert!(matches.is_empty());
        assert!(service.published.borrow().is_empty());
    }
}
