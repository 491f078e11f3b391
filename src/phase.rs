//! Derives a division's competitive phase from its season calendar and admin settings.

use time::Duration;

use crate::models::{types::LocalDateTime, Phase, PhaseSettings, Season};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseState {
    pub phase: Phase,
    /// 1-based week within the reported phase. `None` in the offseason.
    pub week_number: Option<u32>,
}

/// Resolves the active phase at `now`.
///
/// An admin override wins unconditionally. Otherwise Phase 1 runs until `phase1_end`, and
/// Phase 2 runs until `phase2_end` but only once it has been explicitly activated: dates
/// alone never unlock challenges. A division with no published season is in the offseason.
pub fn resolve_phase(
    season: Option<&Season>,
    settings: &PhaseSettings,
    now: LocalDateTime,
) -> PhaseState {
    let phase = match (settings.phase_override, season) {
        (Some(phase), _) => phase,
        (None, None) => Phase::Offseason,
        (None, Some(season)) => phase_by_calendar(season, settings.phase2_activated, now),
    };

    let week_number = season.and_then(|season| {
        let phase_start = match phase {
            Phase::Scheduled => season.phase1_start,
            Phase::Challenge => season.phase2_start,
            Phase::Offseason => return None,
        };
        Some(week_number(phase_start, now))
    });

    PhaseState { phase, week_number }
}

fn phase_by_calendar(season: &Season, phase2_activated: bool, now: LocalDateTime) -> Phase {
    if now < season.phase1_end {
        Phase::Scheduled
    } else if now < season.phase2_end {
        if phase2_activated {
            Phase::Challenge
        } else {
            // Phase 2 dates have arrived but the admins haven't unlocked it yet.
            Phase::Scheduled
        }
    } else {
        Phase::Offseason
    }
}

fn week_number(phase_start: LocalDateTime, now: LocalDateTime) -> u32 {
    let elapsed = now - phase_start;

    if elapsed.is_negative() {
        1
    } else {
        (elapsed.whole_days() / Duration::WEEK.whole_days()) as u32 + 1
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::{resolve_phase, PhaseState};
    use crate::models::{types::Division, Phase, PhaseSettings, Season};

    fn season() -> Season {
        Season {
            division: Division::new("Thursday 8-Ball"),
            phase1_start: datetime!(2024-01-01 00:00).into(),
            phase1_end: datetime!(2024-03-01 00:00).into(),
            phase2_start: datetime!(2024-03-01 00:00).into(),
            phase2_end: datetime!(2024-04-15 00:00).into(),
        }
    }

    fn settings(phase_override: Option<Phase>, phase2_activated: bool) -> PhaseSettings {
        PhaseSettings {
            phase_override,
            phase2_activated,
            ..PhaseSettings::unconfigured(Division::new("Thursday 8-Ball"))
        }
    }

    #[test]
    fn two_days_before_phase1_end_is_scheduled() {
        let state = resolve_phase(
            Some(&season()),
            &settings(None, false),
            datetime!(2024-02-28 00:00).into(),
        );
        assert_eq!(state.phase, Phase::Scheduled);
    }

    #[test]
    fn week_numbers_count_from_phase_start() {
        let at = |now| {
            resolve_phase(Some(&season()), &settings(None, true), now)
                .week_number
                .unwrap()
        };
        assert_eq!(at(datetime!(2024-01-01 00:00).into()), 1);
        assert_eq!(at(datetime!(2024-01-07 23:59).into()), 1);
        assert_eq!(at(datetime!(2024-01-08 00:00).into()), 2);
        assert_eq!(at(datetime!(2024-03-09 12:00).into()), 2);
    }

    #[test]
    fn before_season_start_is_week_one_of_phase1() {
        let state = resolve_phase(
            Some(&season()),
            &settings(None, false),
            datetime!(2023-12-20 00:00).into(),
        );
        assert_eq!(
            state,
            PhaseState {
                phase: Phase::Scheduled,
                week_number: Some(1)
            }
        );
    }

    #[test]
    fn phase2_requires_activation() {
        let now = datetime!(2024-03-05 00:00).into();

        assert_eq!(
            resolve_phase(Some(&season()), &settings(None, true), now).phase,
            Phase::Challenge
        );
        assert_eq!(
            resolve_phase(Some(&season()), &settings(None, false), now).phase,
            Phase::Scheduled
        );
    }

    #[test]
    fn phase1_end_is_exclusive() {
        let state = resolve_phase(
            Some(&season()),
            &settings(None, true),
            datetime!(2024-03-01 00:00).into(),
        );
        assert_eq!(state.phase, Phase::Challenge);
    }

    #[test]
    fn after_phase2_is_offseason() {
        let state = resolve_phase(
            Some(&season()),
            &settings(None, true),
            datetime!(2024-04-15 00:00).into(),
        );
        assert_eq!(
            state,
            PhaseState {
                phase: Phase::Offseason,
                week_number: None
            }
        );
    }

    #[test]
    fn override_wins() {
        let now = datetime!(2024-01-10 00:00).into();

        let state = resolve_phase(Some(&season()), &settings(Some(Phase::Challenge), false), now);
        assert_eq!(state.phase, Phase::Challenge);

        let state = resolve_phase(None, &settings(Some(Phase::Scheduled), false), now);
        assert_eq!(
            state,
            PhaseState {
                phase: Phase::Scheduled,
                week_number: None
            }
        );
    }

    #[test]
    fn no_season_is_offseason() {
        let state = resolve_phase(None, &settings(None, true), datetime!(2024-01-10 00:00).into());
        assert_eq!(state.phase, Phase::Offseason);
    }
}
