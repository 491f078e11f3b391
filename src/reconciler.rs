//! Matches a player's required pairings against confirmed proposals and completed matches.
//!
//! Every requirement is satisfied by at most one record and every record satisfies at most
//! one requirement. Records that can't be matched are ignored; the reconciler never fails.

use tracing::debug;

use crate::models::{
    types::{Division, PlayerName},
    CompletedMatch, Proposal, ProposalStatus, RequirementEntry,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutstandingOpponent {
    pub opponent_name: PlayerName,
    pub requirement: RequirementEntry,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub outstanding_opponents: Vec<OutstandingOpponent>,
    pub scheduled_count: usize,
    pub completed_count: usize,
    pub required_total: usize,
    pub remaining_to_schedule: usize,
}

/// Computes what `player` still has to schedule in `division`.
///
/// `requirements` should already be narrowed to the player and the active phase; entries
/// that don't involve the player are skipped and don't count toward the total. Completed
/// matches take precedence over confirmed proposals. Within each source the first unused
/// record in list order wins.
pub fn reconcile(
    player: &PlayerName,
    division: &Division,
    requirements: &[RequirementEntry],
    confirmed: &[Proposal],
    completed: &[CompletedMatch],
) -> ReconciliationResult {
    let confirmed: Vec<&Proposal> = confirmed
        .iter()
        .filter(|proposal| usable_proposal(proposal, division))
        .collect();
    let completed: Vec<&CompletedMatch> = completed
        .iter()
        .filter(|completed| usable_completed(completed, division))
        .collect();

    let mut confirmed_used = vec![false; confirmed.len()];
    let mut completed_used = vec![false; completed.len()];

    let mut outstanding_opponents = Vec::new();
    let mut scheduled_count = 0;
    let mut completed_count = 0;
    let mut required_total = 0;

    for requirement in requirements {
        let Some(opponent) = requirement.opponent_of(player) else {
            debug!(
                "Requirement {} vs {} doesn't involve {player}, skipping",
                requirement.player_a, requirement.player_b
            );
            continue;
        };
        if requirement.division != *division || opponent == player {
            continue;
        }

        required_total += 1;

        if claim_first(&completed, &mut completed_used, |m| m.is_between(player, opponent)) {
            completed_count += 1;
        } else if claim_first(&confirmed, &mut confirmed_used, |p| p.is_between(player, opponent)) {
            scheduled_count += 1;
        } else {
            outstanding_opponents.push(OutstandingOpponent {
                opponent_name: opponent.clone(),
                requirement: requirement.clone(),
            });
        }
    }

    ReconciliationResult {
        outstanding_opponents,
        scheduled_count,
        completed_count,
        required_total,
        remaining_to_schedule: required_total.saturating_sub(scheduled_count + completed_count),
    }
}

/// Marks the first unused record matching `predicate` as used.
fn claim_first<T>(records: &[&T], used: &mut [bool], predicate: impl Fn(&T) -> bool) -> bool {
    let found = records
        .iter()
        .zip(used.iter())
        .position(|(record, used)| !*used && predicate(*record));

    match found {
        Some(index) => {
            used[index] = true;
            true
        }
        None => false,
    }
}

fn usable_proposal(proposal: &Proposal, division: &Division) -> bool {
    if proposal.status != ProposalStatus::Confirmed {
        debug!("Proposal {} is {}, not confirmed", proposal.id, proposal.status);
        return false;
    }
    if proposal.divisions.is_empty() {
        debug!("Proposal {} has no readable divisions", proposal.id);
        return false;
    }
    if proposal.sender_name.is_blank() || proposal.receiver_name.is_blank() {
        debug!("Proposal {} is missing a player name", proposal.id);
        return false;
    }

    proposal.is_in_division(division)
}

fn usable_completed(completed: &CompletedMatch, division: &Division) -> bool {
    if completed.sender_name.is_blank() || completed.receiver_name.is_blank() {
        debug!("Completed match {:?} is missing a player name", completed.id);
        return false;
    }

    completed.is_in_division(division)
}
