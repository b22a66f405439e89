//! Export preparation for calendar serialization.

use tracing::debug;

use coursetrack_courses::resolve;
use coursetrack_shared::{CommittedRecord, CourseTrackError, ExportRecord, ExportRequest, Result};

/// The calendar serialization backend. Returns an opaque downloadable
/// artifact; the coordinator never inspects its contents.
#[allow(async_fn_in_trait)]
pub trait CalendarService {
    async fn export(&self, request: &ExportRequest) -> Result<Vec<u8>>;
}

/// Turn the committed record list into calendar-ready export records.
///
/// A record whose source document resolves to a course code gets its title
/// prefixed with `"{code} - "`; otherwise the title is unchanged. Pure
/// transform, performed once immediately before handing records to the
/// serialization service. An empty record list is rejected before any
/// network call.
pub fn prepare_export(committed: &[CommittedRecord]) -> Result<Vec<ExportRecord>> {
    if committed.is_empty() {
        return Err(CourseTrackError::validation(
            "no records selected for export",
        ));
    }

    let records = committed
        .iter()
        .map(|r| ExportRecord {
            title: match resolve(&r.source_document) {
                Some(code) => format!("{code} - {}", r.title),
                None => r.title.clone(),
            },
            due_date: r.due_date,
            kind: r.kind,
        })
        .collect::<Vec<_>>();

    debug!(records = records.len(), "export payload prepared");
    Ok(records)
}
