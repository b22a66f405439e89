//! Study plan cache and generation coordinator.
//!
//! Groups committed records by course, issues at most one generation
//! request per course per session, skips courses already cached, and
//! merges server-side pre-cached plans. Generation calls are rate-limited
//! server operations; courses are awaited one at a time, in
//! first-appearance order, with "i of N" progress.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, instrument};

use coursetrack_courses::resolve_or_general;
use coursetrack_shared::{CommittedRecord, CourseTrackError, PlanRequest, Result, StudyPlan};

use crate::pipeline::ProgressReporter;

/// Synthetic pseudo-course whose record view unions every group.
pub const ALL_COURSES: &str = "All Courses";

// ---------------------------------------------------------------------------
// PlanService
// ---------------------------------------------------------------------------

/// The study-plan generation backend.
#[allow(async_fn_in_trait)]
pub trait PlanService {
    /// Generate one study plan for a course group.
    async fn generate(&self, course_code: &str, request: &PlanRequest) -> Result<StudyPlan>;
}

// ---------------------------------------------------------------------------
// PlanCache
// ---------------------------------------------------------------------------

/// Session-lifetime mapping from course code to study plan.
///
/// Entries are never evicted except by a whole-cache reset; the first
/// write per course wins for the session.
#[derive(Debug, Clone, Default)]
pub struct PlanCache {
    plans: BTreeMap<String, StudyPlan>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union externally supplied course→plan pairs into the cache without
    /// overwriting existing entries. Returns the number of new entries.
    pub fn merge_precached(&mut self, plans: &BTreeMap<String, StudyPlan>) -> usize {
        let mut added = 0;
        for (code, plan) in plans {
            if !self.plans.contains_key(code) {
                self.plans.insert(code.clone(), plan.clone());
                added += 1;
            }
        }
        if added > 0 {
            debug!(added, "merged pre-cached study plans");
        }
        added
    }

    pub fn insert(&mut self, code: String, plan: StudyPlan) {
        self.plans.insert(code, plan);
    }

    pub fn get(&self, code: &str) -> Option<&StudyPlan> {
        self.plans.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.plans.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Cached course codes, sorted.
    pub fn courses(&self) -> impl Iterator<Item = &str> {
        self.plans.keys().map(String::as_str)
    }

    /// Drop every cached plan. Partial clears are not permitted.
    pub fn reset(&mut self) {
        self.plans.clear();
    }
}

// ---------------------------------------------------------------------------
// Course grouping
// ---------------------------------------------------------------------------

/// One course's committed records, in first-appearance order.
#[derive(Debug, Clone)]
pub struct CourseGroup {
    /// Canonical course code, or `"General"` when resolution failed.
    pub code: String,
    /// Fingerprint of the first record that created the group — the
    /// cache/generation key sent to the study-plan service.
    pub fingerprint: Option<String>,
    pub records: Vec<CommittedRecord>,
}

/// Group committed records by resolved course code, preserving the order
/// in which each course first appears.
pub fn group_by_course(committed: &[CommittedRecord]) -> Vec<CourseGroup> {
    let mut groups: Vec<CourseGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in committed {
        let code = resolve_or_general(&record.source_document);
        match index.get(&code) {
            Some(&i) => groups[i].records.push(record.clone()),
            None => {
                index.insert(code.clone(), groups.len());
                groups.push(CourseGroup {
                    code,
                    fingerprint: record.fingerprint.clone(),
                    records: vec![record.clone()],
                });
            }
        }
    }

    groups
}

// ---------------------------------------------------------------------------
// Generation coordinator
// ---------------------------------------------------------------------------

/// Outcome of one [`ensure_generated`] pass.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Courses a generation call was issued for, in order.
    pub generated: Vec<String>,
    /// Courses skipped because the cache already held a plan.
    pub skipped: Vec<String>,
}

/// Ensure every course appearing among `committed` has a cached study plan.
///
/// Courses already in the cache are skipped entirely — no network call is
/// made for them, so a second pass over the same records issues zero
/// calls. Remaining courses are generated sequentially, in first-appearance
/// order; a failure aborts the remaining courses while everything generated
/// so far stays cached.
#[instrument(skip_all, fields(records = committed.len()))]
pub async fn ensure_generated<S: PlanService>(
    cache: &mut PlanCache,
    committed: &[CommittedRecord],
    service: &S,
    progress: &dyn ProgressReporter,
    force_regenerate: bool,
) -> Result<GenerationReport> {
    if committed.is_empty() {
        return Err(CourseTrackError::validation(
            "no committed records to generate study plans for",
        ));
    }

    let groups = group_by_course(committed);
    let total = groups.len();
    let mut report = GenerationReport::default();

    for (i, group) in groups.iter().enumerate() {
        if cache.contains(&group.code) {
            debug!(course = %group.code, "study plan cached, skipping generation");
            report.skipped.push(group.code.clone());
            continue;
        }

        progress.step(i + 1, total, &format!("Generating study plan: {}", group.code));

        let request = PlanRequest {
            records: group.records.clone(),
            fingerprint: group.fingerprint.clone(),
            force_regenerate,
        };

        let plan = service.generate(&group.code, &request).await?;
        cache.insert(group.code.clone(), plan);
        report.generated.push(group.code.clone());
    }

    info!(
        generated = report.generated.len(),
        skipped = report.skipped.len(),
        "study plan pass complete"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Course overviews
// ---------------------------------------------------------------------------

/// One course's view for presentation: its plan (if cached) and records.
#[derive(Debug, Clone)]
pub struct CourseOverview {
    pub code: String,
    /// `None` for courses not yet generated and for [`ALL_COURSES`].
    pub plan: Option<StudyPlan>,
    pub records: Vec<CommittedRecord>,
}

/// Per-course overviews, preceded by the synthetic [`ALL_COURSES`] view.
///
/// The synthetic view unions every group's records sorted by due date
/// ascending with dateless records last; it carries no plan text, only
/// the aggregated record table.
pub fn overviews(cache: &PlanCache, committed: &[CommittedRecord]) -> Vec<CourseOverview> {
    let mut all = committed.to_vec();
    all.sort_by_key(|r| (r.due_date.is_none(), r.due_date));

    let mut views = vec![CourseOverview {
        code: ALL_COURSES.to_string(),
        plan: None,
        records: all,
    }];

    for group in group_by_course(committed) {
        views.push(CourseOverview {
            plan: cache.get(&group.code).cloned(),
            code: group.code,
            records: group.records,
        });
    }

    views
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::NaiveDate;
    use coursetrack_shared::RecordKind;

    use super::*;
    use crate::pipeline::SilentProgress;

    fn make_committed(
        id: u64,
        title: &str,
        source: &str,
        fingerprint: Option<&str>,
        due: Option<(i32, u32, u32)>,
    ) -> CommittedRecord {
        CommittedRecord {
            id: coursetrack_shared::RecordId(id),
            title: title.into(),
            due_date: due.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            kind: RecordKind::Assignment,
            accuracy: 90.0,
            low_confidence: false,
            source_document: source.into(),
            fingerprint: fingerprint.map(String::from),
        }
    }

    fn make_plan(overview: &str) -> StudyPlan {
        StudyPlan {
            overview: overview.into(),
            ..Default::default()
        }
    }

    /// Records generation calls; fails for courses named in `fail_on`.
    #[derive(Default)]
    struct MockPlanService {
        calls: RefCell<Vec<(String, PlanRequest)>>,
        fail_on: Option<String>,
    }

    impl PlanService for MockPlanService {
        async fn generate(&self, course_code: &str, request: &PlanRequest) -> Result<StudyPlan> {
            if self.fail_on.as_deref() == Some(course_code) {
                return Err(CourseTrackError::generation(course_code, "rate limited"));
            }
            self.calls
                .borrow_mut()
                .push((course_code.to_string(), request.clone()));
            Ok(make_plan(&format!("plan for {course_code}")))
        }
    }

    #[test]
    fn precached_merge_never_overwrites() {
        let mut cache = PlanCache::new();
        cache.insert("CS 101".into(), make_plan("local"));

        let mut incoming = BTreeMap::new();
        incoming.insert("CS 101".to_string(), make_plan("server"));
        incoming.insert("MATH 201".to_string(), make_plan("server"));

        let added = cache.merge_precached(&incoming);
        assert_eq!(added, 1);
        assert_eq!(cache.get("CS 101").unwrap().overview, "local");
        assert_eq!(cache.get("MATH 201").unwrap().overview, "server");
    }

    #[test]
    fn grouping_preserves_first_appearance_order() {
        let committed = vec![
            make_committed(0, "hw1", "MATH201_outline.pdf", Some("fm"), None),
            make_committed(1, "hw1", "CS101-syllabus.pdf", Some("fc"), None),
            make_committed(2, "hw2", "MATH201_outline.pdf", Some("fm"), None),
            make_committed(3, "essay", "averyverylongfilename.pdf", None, None),
        ];

        let groups = group_by_course(&committed);
        let codes: Vec<&str> = groups.iter().map(|g| g.code.as_str()).collect();
        assert_eq!(codes, vec!["MATH 201", "CS 101", "General"]);
        assert_eq!(groups[0].records.len(), 2);
        assert_eq!(groups[0].fingerprint.as_deref(), Some("fm"));
    }

    #[test]
    fn representative_fingerprint_is_from_first_record() {
        let committed = vec![
            make_committed(0, "a", "CS101-a.pdf", Some("first"), None),
            make_committed(1, "b", "CS101-b.pdf", Some("second"), None),
        ];

        let groups = group_by_course(&committed);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].fingerprint.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn one_generation_call_per_course() {
        let mut cache = PlanCache::new();
        let service = MockPlanService::default();
        let committed = vec![
            make_committed(0, "hw1", "CS101-syllabus.pdf", Some("fc"), None),
            make_committed(1, "midterm", "CS101-syllabus.pdf", Some("fc"), None),
            make_committed(2, "hw1", "MATH201_outline.pdf", Some("fm"), None),
        ];

        let report = ensure_generated(&mut cache, &committed, &service, &SilentProgress, false)
            .await
            .expect("generation succeeds");

        assert_eq!(report.generated, vec!["CS 101", "MATH 201"]);
        assert!(report.skipped.is_empty());

        let calls = service.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "CS 101");
        assert_eq!(calls[0].1.records.len(), 2);
        assert_eq!(calls[0].1.fingerprint.as_deref(), Some("fc"));
        assert!(!calls[0].1.force_regenerate);
    }

    #[tokio::test]
    async fn second_pass_issues_zero_calls() {
        let mut cache = PlanCache::new();
        let service = MockPlanService::default();
        let committed = vec![
            make_committed(0, "hw1", "CS101.pdf", Some("fc"), None),
            make_committed(1, "hw1", "MATH201.pdf", Some("fm"), None),
        ];

        ensure_generated(&mut cache, &committed, &service, &SilentProgress, false)
            .await
            .expect("first pass");
        assert_eq!(service.calls.borrow().len(), 2);

        let report = ensure_generated(&mut cache, &committed, &service, &SilentProgress, false)
            .await
            .expect("second pass");
        assert_eq!(service.calls.borrow().len(), 2);
        assert!(report.generated.is_empty());
        assert_eq!(report.skipped, vec!["CS 101", "MATH 201"]);
    }

    #[tokio::test]
    async fn precached_courses_are_skipped() {
        let mut cache = PlanCache::new();
        cache.insert("CS 101".into(), make_plan("precached"));
        let service = MockPlanService::default();
        let committed = vec![
            make_committed(0, "hw1", "CS101.pdf", Some("fc"), None),
            make_committed(1, "hw1", "MATH201.pdf", Some("fm"), None),
        ];

        let report = ensure_generated(&mut cache, &committed, &service, &SilentProgress, false)
            .await
            .expect("pass");

        assert_eq!(report.skipped, vec!["CS 101"]);
        assert_eq!(report.generated, vec!["MATH 201"]);
        assert_eq!(cache.get("CS 101").unwrap().overview, "precached");
    }

    #[tokio::test]
    async fn failure_aborts_remaining_but_keeps_generated() {
        let mut cache = PlanCache::new();
        let service = MockPlanService {
            fail_on: Some("MATH 201".into()),
            ..Default::default()
        };
        let committed = vec![
            make_committed(0, "hw1", "CS101.pdf", Some("fc"), None),
            make_committed(1, "hw1", "MATH201.pdf", Some("fm"), None),
            make_committed(2, "hw1", "PHYS301.pdf", Some("fp"), None),
        ];

        let err = ensure_generated(&mut cache, &committed, &service, &SilentProgress, false)
            .await
            .expect_err("MATH 201 fails");
        assert!(err.to_string().contains("MATH 201"));

        // CS 101 survived; PHYS 301 was never attempted.
        assert!(cache.contains("CS 101"));
        assert!(!cache.contains("PHYS 301"));
        assert_eq!(service.calls.borrow().len(), 1);
    }

    #[tokio::test]
    async fn empty_committed_is_rejected_before_any_call() {
        let mut cache = PlanCache::new();
        let service = MockPlanService::default();

        let err = ensure_generated(&mut cache, &[], &service, &SilentProgress, false)
            .await
            .expect_err("empty commit rejected");
        assert!(matches!(err, CourseTrackError::Validation { .. }));
        assert!(service.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn force_regenerate_is_forwarded() {
        let mut cache = PlanCache::new();
        let service = MockPlanService::default();
        let committed = vec![make_committed(0, "hw1", "CS101.pdf", Some("fc"), None)];

        ensure_generated(&mut cache, &committed, &service, &SilentProgress, true)
            .await
            .expect("pass");
        assert!(service.calls.borrow()[0].1.force_regenerate);
    }

    #[test]
    fn overviews_lead_with_all_courses_sorted_by_due_date() {
        let mut cache = PlanCache::new();
        cache.insert("CS 101".into(), make_plan("cs"));

        let committed = vec![
            make_committed(0, "late", "CS101.pdf", Some("fc"), Some((2026, 12, 1))),
            make_committed(1, "dateless", "CS101.pdf", Some("fc"), None),
            make_committed(2, "early", "MATH201.pdf", Some("fm"), Some((2026, 9, 1))),
        ];

        let views = overviews(&cache, &committed);
        assert_eq!(views[0].code, ALL_COURSES);
        assert!(views[0].plan.is_none());
        let titles: Vec<&str> = views[0].records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["early", "late", "dateless"]);

        assert_eq!(views[1].code, "CS 101");
        assert_eq!(views[1].plan.as_ref().unwrap().overview, "cs");
        assert_eq!(views[2].code, "MATH 201");
        assert!(views[2].plan.is_none());
    }
}
