use tracing::debug;

use crate::{
    models::{
        types::{Division, PlayerName},
        Phase, PlayerDirectory, RequirementEntry, RequirementPhase,
    },
    repository::RosterSource,
};

/// A player's required pairings for one phase, plus the directory of everyone on the roster.
#[derive(Debug, Default)]
pub struct RequirementSet {
    pub entries: Vec<RequirementEntry>,
    pub directory: PlayerDirectory,
}

/// Narrows a division roster down to `player`'s pairings for `phase`, keeping publication
/// order. Duplicated pairings are kept: they are separate required matches.
pub fn requirements_for_player(
    roster: &[RequirementEntry],
    division: &Division,
    phase: RequirementPhase,
    player: &PlayerName,
) -> Vec<RequirementEntry> {
    roster
        .iter()
        .filter(|entry| entry.division == *division)
        .filter(|entry| entry.effective_phase() == phase)
        .filter(|entry| entry.involves(player))
        .filter(|entry| {
            // A pairing of a player with themself can never be scheduled.
            let valid = entry.player_a != entry.player_b;
            if !valid {
                debug!("Ignoring self-pairing in roster for {division}: {}", entry.player_a);
            }
            valid
        })
        .cloned()
        .collect()
}

/// Loads the requirement set for `player` in the given phase. The offseason has none.
pub async fn load_requirement_set(
    roster_source: &dyn RosterSource,
    division: &Division,
    phase: Phase,
    player: &PlayerName,
) -> Result<RequirementSet, anyhow::Error> {
    let Some(phase) = RequirementPhase::for_phase(phase) else {
        return Ok(RequirementSet::default());
    };

    let roster = roster_source.requirements(division, phase).await?;

    Ok(RequirementSet {
        entries: requirements_for_player(&roster, division, phase, player),
        directory: PlayerDirectory::from_roster(&roster),
    })
}
