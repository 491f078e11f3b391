use indoc::formatdoc;
use serde::Serialize;
use time::Duration;

use crate::{
    models::{types::LocalDateTime, Season},
    reconciler::ReconciliationResult,
    utils::formatting::format_local,
};

/// Human-facing progress numbers for one player in one division.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProgressReport {
    pub required_total: usize,
    pub scheduled_count: usize,
    pub completed_count: usize,
    pub remaining_to_schedule: usize,
    /// Whole days left until the end of Phase 1, rounded up. Zero once it has passed.
    pub days_until_deadline: u32,
    pub deadline_passed: bool,
    #[serde(skip)]
    pub deadline: LocalDateTime,
}

const NANOSECONDS_PER_DAY: i128 = Duration::DAY.whole_nanoseconds();

pub fn report(
    reconciliation: &ReconciliationResult,
    season: &Season,
    now: LocalDateTime,
) -> ProgressReport {
    let left = (season.phase1_end - now).whole_nanoseconds();

    let days_until_deadline = if left <= 0 {
        0
    } else {
        ((left + NANOSECONDS_PER_DAY - 1) / NANOSECONDS_PER_DAY) as u32
    };

    ProgressReport {
        required_total: reconciliation.required_total,
        scheduled_count: reconciliation.scheduled_count,
        completed_count: reconciliation.completed_count,
        remaining_to_schedule: reconciliation.remaining_to_schedule,
        days_until_deadline,
        deadline_passed: now >= season.phase1_end,
        deadline: season.phase1_end,
    }
}

impl ProgressReport {
    pub fn summary(&self) -> String {
        let deadline_line = if self.deadline_passed {
            format!("The Phase 1 deadline ({}) has passed.", format_local(self.deadline))
        } else {
            format!(
                "{} day(s) left until the Phase 1 deadline ({}).",
                self.days_until_deadline,
                format_local(self.deadline)
            )
        };

        formatdoc! {
            r#"
                Scheduled {scheduled} of {required} required matches, {completed} completed.
                {remaining} still to schedule.
                {deadline_line}
            "#,
            scheduled = self.scheduled_count,
            required = self.required_total,
            completed = self.completed_count,
            remaining = self.remaining_to_schedule,
            deadline_line = deadline_line,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::report;
    use crate::{
        models::{types::Division, Season},
        reconciler::ReconciliationResult,
    };

    fn season() -> Season {
        Season {
            division: Division::new("D"),
            phase1_start: datetime!(2024-01-01 00:00).into(),
            phase1_end: datetime!(2024-03-01 00:00).into(),
            phase2_start: datetime!(2024-03-01 00:00).into(),
            phase2_end: datetime!(2024-04-15 00:00).into(),
        }
    }

    fn result() -> ReconciliationResult {
        ReconciliationResult {
            outstanding_opponents: Vec::new(),
            scheduled_count: 1,
            completed_count: 2,
            required_total: 5,
            remaining_to_schedule: 2,
        }
    }

    #[test]
    fn copies_counters() {
        let progress = report(&result(), &season(), datetime!(2024-02-01 00:00).into());

        assert_eq!(progress.required_total, 5);
        assert_eq!(progress.scheduled_count, 1);
        assert_eq!(progress.completed_count, 2);
        assert_eq!(progress.remaining_to_schedule, 2);
    }

    #[test]
    fn two_days_before_deadline() {
        let progress = report(&result(), &season(), datetime!(2024-02-28 00:00).into());

        assert_eq!(progress.days_until_deadline, 2);
        assert!(!progress.deadline_passed);
    }

    #[test]
    fn partial_days_round_up() {
        let progress = report(&result(), &season(), datetime!(2024-02-28 18:00).into());
        assert_eq!(progress.days_until_deadline, 2);

        let progress = report(&result(), &season(), datetime!(2024-02-29 23:59:59).into());
        assert_eq!(progress.days_until_deadline, 1);
    }

    #[test]
    fn clamped_after_deadline() {
        let progress = report(&result(), &season(), datetime!(2024-03-01 00:00).into());
        assert_eq!(progress.days_until_deadline, 0);
        assert!(progress.deadline_passed);

        let progress = report(&result(), &season(), datetime!(2024-03-20 00:00).into());
        assert_eq!(progress.days_until_deadline, 0);
        assert!(progress.deadline_passed);
    }

    #[test]
    fn summary_mentions_deadline() {
        let summary = report(&result(), &season(), datetime!(2024-02-28 00:00).into()).summary();

        assert!(summary.contains("Scheduled 1 of 5 required matches, 2 completed."));
        assert!(summary.contains("2 day(s) left until the Phase 1 deadline (3/1/2024 12:00 AM)."));
    }
}
