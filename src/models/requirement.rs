use super::{
    season::Phase,
    types::{Division, PlayerName},
};

/// Phase numbers as they appear on published rosters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequirementPhase(pub u8);

impl RequirementPhase {
    pub const ONE: RequirementPhase = RequirementPhase(1);
    pub const TWO: RequirementPhase = RequirementPhase(2);

    /// The roster phase that applies while the division is in `phase`.
    pub fn for_phase(phase: Phase) -> Option<RequirementPhase> {
        match phase {
            Phase::Scheduled => Some(RequirementPhase::ONE),
            Phase::Challenge => Some(RequirementPhase::TWO),
            Phase::Offseason => None,
        }
    }
}

/// One mandatory pairing published for a season.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequirementEntry {
    pub division: Division,
    /// Rosters published before phases existed carry no phase; those are Phase 1.
    pub phase: Option<RequirementPhase>,
    pub player_a: PlayerName,
    pub player_b: PlayerName,
}

impl RequirementEntry {
    pub fn effective_phase(&self) -> RequirementPhase {
        self.phase.unwrap_or(RequirementPhase::ONE)
    }

    pub fn involves(&self, player: &PlayerName) -> bool {
        self.player_a == *player || self.player_b == *player
    }

    /// The other side of the pairing, if `player` is one of the two sides.
    pub fn opponent_of(&self, player: &PlayerName) -> Option<&PlayerName> {
        if self.player_a == *player {
            Some(&self.player_b)
        } else if self.player_b == *player {
            Some(&self.player_a)
        } else {
            None
        }
    }
}
