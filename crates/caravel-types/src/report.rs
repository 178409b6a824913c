//! Import report model.
//!
//! The [`ImportReport`] is the progress/statistics record for one
//! migration job. Its counters are advanced by downstream background
//! workers as batches move through transform and load; the engine only
//! reads it, apart from initializing `total_batch_count` and stamping
//! `end_time` at finalization. Counters are monotonically non-decreasing,
//! which [`ReportUpdate::apply`] enforces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress and statistics for one import job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Number of items per downstream batch.
    pub batch_size: u64,
    pub total_batch_count: u64,
    pub imported_batch_count: u64,
    pub transformed_batch_count: u64,
    pub completed_batch_count: u64,
    pub errored_batch_count: u64,
    pub total_issue_count: u64,
    pub imported_issue_count: u64,
    pub errored_issue_count: u64,
    pub total_page_count: u64,
    pub imported_page_count: u64,
    pub errored_page_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Set only once every step has drained its pagination loop. A report
    /// without `end_time` signals an incomplete run needing attention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl ImportReport {
    /// Whether downstream workers have caught up with everything the
    /// engine handed them. This is the wait-step poll predicate.
    #[must_use]
    pub fn batches_caught_up(&self) -> bool {
        self.imported_batch_count >= self.total_batch_count
    }
}

/// Partial, monotonic update to an [`ImportReport`].
///
/// Counter fields are taken as new absolute values and applied with a
/// floor at the current value, so a stale writer can never move a counter
/// backwards. `imported_batch_count` is additionally capped at
/// `total_batch_count` after the update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_batch_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_batch_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformed_batch_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_batch_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errored_batch_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_issue_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_issue_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errored_issue_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_page_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_page_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errored_page_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
}

impl ReportUpdate {
    /// Update that initializes the batch plan on an issues step's first
    /// page. Stamps `start_time` as the beginning of the push phase;
    /// [`apply`](Self::apply) keeps an earlier stamp if one exists.
    #[must_use]
    pub fn batch_plan(batch_size: u64, total_batch_count: u64, total_issue_count: u64) -> Self {
        Self {
            batch_size: Some(batch_size),
            total_batch_count: Some(total_batch_count),
            total_issue_count: Some(total_issue_count),
            start_time: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Apply this update to a report, preserving counter monotonicity.
    pub fn apply(&self, report: &mut ImportReport) {
        fn raise(field: &mut u64, value: Option<u64>) {
            if let Some(v) = value {
                *field = (*field).max(v);
            }
        }

        raise(&mut report.batch_size, self.batch_size);
        raise(&mut report.total_batch_count, self.total_batch_count);
        raise(&mut report.imported_batch_count, self.imported_batch_count);
        raise(&mut report.transformed_batch_count, self.transformed_batch_count);
        raise(&mut report.completed_batch_count, self.completed_batch_count);
        raise(&mut report.errored_batch_count, self.errored_batch_count);
        raise(&mut report.total_issue_count, self.total_issue_count);
        raise(&mut report.imported_issue_count, self.imported_issue_count);
        raise(&mut report.errored_issue_count, self.errored_issue_count);
        raise(&mut report.total_page_count, self.total_page_count);
        raise(&mut report.imported_page_count, self.imported_page_count);
        raise(&mut report.errored_page_count, self.errored_page_count);

        if report.start_time.is_none() {
            report.start_time = self.start_time;
        }

        report.imported_batch_count = report.imported_batch_count.min(report.total_batch_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_report_is_caught_up() {
        // 0 >= 0: a report with no planned batches does not block a wait step.
        assert!(ImportReport::default().batches_caught_up());
    }

    #[test]
    fn poll_predicate() {
        let mut report = ImportReport {
            total_batch_count: 10,
            imported_batch_count: 7,
            ..ImportReport::default()
        };
        assert!(!report.batches_caught_up());
        report.imported_batch_count = 10;
        assert!(report.batches_caught_up());
    }

    #[test]
    fn update_never_regresses_counters() {
        let mut report = ImportReport {
            total_batch_count: 10,
            imported_batch_count: 7,
            ..ImportReport::default()
        };
        let stale = ReportUpdate {
            imported_batch_count: Some(3),
            ..ReportUpdate::default()
        };
        stale.apply(&mut report);
        assert_eq!(report.imported_batch_count, 7);
    }

    #[test]
    fn imported_batches_capped_at_total() {
        let mut report = ImportReport {
            total_batch_count: 5,
            ..ImportReport::default()
        };
        let update = ReportUpdate {
            imported_batch_count: Some(9),
            ..ReportUpdate::default()
        };
        update.apply(&mut report);
        assert_eq!(report.imported_batch_count, 5);
    }

    #[test]
    fn batch_plan_update() {
        let mut report = ImportReport::default();
        ReportUpdate::batch_plan(50, 4, 180).apply(&mut report);
        assert_eq!(report.batch_size, 50);
        assert_eq!(report.total_batch_count, 4);
        assert_eq!(report.total_issue_count, 180);
        assert!(!report.batches_caught_up());
    }

    #[test]
    fn start_time_set_once() {
        let mut report = ImportReport::default();
        let first = Utc::now();
        ReportUpdate { start_time: Some(first), ..ReportUpdate::default() }.apply(&mut report);
        assert_eq!(report.start_time, Some(first));

        let later = first + chrono::Duration::seconds(60);
        ReportUpdate { start_time: Some(later), ..ReportUpdate::default() }.apply(&mut report);
        assert_eq!(report.start_time, Some(first));
    }

    #[test]
    fn report_serde_roundtrip() {
        let report = ImportReport {
            batch_size: 50,
            total_batch_count: 3,
            imported_batch_count: 1,
            total_issue_count: 120,
            start_time: Some(Utc::now()),
            ..ImportReport::default()
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: ImportReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, back);
        // end_time absent from the wire until finalization
        assert!(!json.contains("end_time"));
    }
}
