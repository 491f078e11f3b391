use std::collections::BTreeSet;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::{
    season::Phase,
    types::{Division, LocalDateTime, PlayerName},
};
use crate::parsing::{self, CalendarDate, ClockTime};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProposalId(pub u64);

impl std::fmt::Display for ProposalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Countered,
    Confirmed,
    Cancelled,
}

impl ProposalStatus {
    /// Whether a proposal in this status may move to `next`.
    ///
    /// Only `Pending` has outgoing edges. A countered proposal stays countered; the
    /// counter-offer is a separate proposal.
    pub fn can_transition_to(self, next: ProposalStatus) -> bool {
        use ProposalStatus::*;

        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Countered) | (Pending, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        self != ProposalStatus::Pending
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    pub id: ProposalId,
    pub sender_name: PlayerName,
    pub sender_email: String,
    pub receiver_name: PlayerName,
    pub receiver_email: String,
    /// Empty when the stored divisions couldn't be read; such a proposal matches nothing.
    pub divisions: BTreeSet<Division>,
    pub phase: Phase,
    pub date: CalendarDate,
    pub time: ClockTime,
    pub location: String,
    pub game_type: String,
    pub race_length: Option<u16>,
    pub note: String,
    pub status: ProposalStatus,
    pub counter_of: Option<ProposalId>,
    pub version: u32,
    pub created_at: LocalDateTime,
}

impl Proposal {
    /// Whether this proposal is between exactly these two players, in either direction.
    pub fn is_between(&self, a: &PlayerName, b: &PlayerName) -> bool {
        (self.sender_name == *a && self.receiver_name == *b)
            || (self.sender_name == *b && self.receiver_name == *a)
    }

    pub fn is_in_division(&self, division: &Division) -> bool {
        self.divisions.contains(division)
    }

    pub fn involves(&self, player: &PlayerName) -> bool {
        self.sender_name == *player || self.receiver_name == *player
    }

    /// When the match is planned to start, if both the date and time could be read.
    pub fn scheduled_at(&self) -> Option<LocalDateTime> {
        parsing::combine(&self.date, Some(&self.time))
    }
}

/// Proposal data as submitted by a player, before validation.
///
/// Fields a partially filled form may leave out are `Option`s or possibly blank strings;
/// the ledger checks them before anything is stored.
#[derive(Clone, Debug, Default)]
pub struct NewProposal {
    pub sender_name: String,
    pub sender_email: String,
    pub receiver_name: String,
    pub receiver_email: String,
    pub divisions: Vec<String>,
    pub phase: Option<Phase>,
    pub date: String,
    pub time: String,
    pub location: String,
    pub game_type: String,
    pub race_length: Option<u16>,
    pub note: String,
}

/// A validated proposal ready to be stored. Always starts out pending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalDraft {
    pub sender_name: PlayerName,
    pub sender_email: String,
    pub receiver_name: PlayerName,
    pub receiver_email: String,
    pub divisions: BTreeSet<Division>,
    pub phase: Phase,
    pub date: CalendarDate,
    pub time: ClockTime,
    pub location: String,
    pub game_type: String,
    pub race_length: Option<u16>,
    pub note: String,
    pub created_at: LocalDateTime,
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::ProposalStatus;

    #[test]
    fn only_pending_has_outgoing_edges() {
        use ProposalStatus::*;

        for from in ProposalStatus::iter() {
            for to in ProposalStatus::iter() {
                let expected = from == Pending && to != Pending;
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from} -> {to} should be {}",
                    if expected { "legal" } else { "illegal" }
                );
            }
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(!ProposalStatus::Pending.is_terminal());
        assert!(ProposalStatus::Confirmed.is_terminal());
        assert!(ProposalStatus::Cancelled.is_terminal());
        assert!(ProposalStatus::Countered.is_terminal());
    }
}
