use std::collections::BTreeSet;

use super::{
    proposal::ProposalId,
    types::{Division, PlayerName},
};
use crate::parsing::CalendarDate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompletedMatchId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedMatch {
    pub id: CompletedMatchId,
    /// The confirmed proposal this result was recorded from, if any.
    pub proposal_id: Option<ProposalId>,
    pub divisions: BTreeSet<Division>,
    pub sender_name: PlayerName,
    pub receiver_name: PlayerName,
    pub completed_date: CalendarDate,
    pub winner: PlayerName,
}

impl CompletedMatch {
    pub fn is_between(&self, a: &PlayerName, b: &PlayerName) -> bool {
        (self.sender_name == *a && self.receiver_name == *b)
            || (self.sender_name == *b && self.receiver_name == *a)
    }

    pub fn is_in_division(&self, division: &Division) -> bool {
        self.divisions.contains(division)
    }
}

#[derive(Clone, Debug)]
pub struct NewCompletedMatch {
    pub proposal_id: Option<ProposalId>,
    pub divisions: BTreeSet<Division>,
    pub sender_name: PlayerName,
    pub receiver_name: PlayerName,
    pub completed_date: CalendarDate,
    pub winner: PlayerName,
}
