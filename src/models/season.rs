use strum::{Display, EnumString, IntoStaticStr};

use super::types::{Division, LocalDateTime};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Season {
    pub division: Division,
    pub phase1_start: LocalDateTime,
    pub phase1_end: LocalDateTime,
    pub phase2_start: LocalDateTime,
    pub phase2_end: LocalDateTime,
}

/// The competitive phase a division is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Phase {
    /// Phase 1: play the fixed roster of required opponents.
    Scheduled,
    /// Phase 2: ranked challenge matches.
    Challenge,
    Offseason,
}

/// Per-division admin configuration for phase resolution.
///
/// `version` is bumped on every change so callers can tell which configuration a resolved
/// phase was computed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseSettings {
    pub division: Division,
    pub phase_override: Option<Phase>,
    pub phase2_activated: bool,
    pub version: u32,
}

impl PhaseSettings {
    /// Settings for a division nobody configured yet: no override, Phase 2 locked.
    pub fn unconfigured(division: Division) -> PhaseSettings {
        PhaseSettings {
            division,
            phase_override: None,
            phase2_activated: false,
            version: 0,
        }
    }
}
