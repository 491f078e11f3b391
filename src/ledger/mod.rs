//! The proposal negotiation state machine.
//!
//! Proposals only ever leave `pending`. Countering doesn't edit an offer: the original is
//! closed as `countered` and the counter-offer is stored as a new proposal pointing back at
//! it, so the whole negotiation stays on record.

mod error;
mod validation;

use std::{collections::HashSet, sync::Arc};

use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::{info, warn};

pub use error::LedgerError;
use error::invalid;

use crate::{
    models::{
        types::{Division, LocalDateTime, PlayerName},
        CompletedMatch, CompletedMatchId, NewCompletedMatch, NewProposal, Proposal, ProposalId,
        ProposalStatus,
    },
    parsing::CalendarDate,
    repository::{CompletedMatchStore, ProposalStore},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    Proposed(ProposalId),
    Responded {
        id: ProposalId,
        status: ProposalStatus,
    },
    Countered {
        original: ProposalId,
        counter_offer: ProposalId,
    },
    Completed(CompletedMatchId),
    WinnerCorrected(CompletedMatchId),
}

pub struct ProposalLedger {
    proposals: Arc<dyn ProposalStore>,
    completed: Arc<dyn CompletedMatchStore>,
    events: Sender<LedgerEvent>,
}

impl ProposalLedger {
    pub fn new(
        proposals: Arc<dyn ProposalStore>,
        completed: Arc<dyn CompletedMatchStore>,
    ) -> ProposalLedger {
        ProposalLedger {
            proposals,
            completed,
            events: broadcast::channel(128).0,
        }
    }

    pub fn subscribe(&self) -> Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: LedgerEvent) {
        let _ = self.events.send(event); // Don't care if it actually gets received
    }

    #[tracing::instrument(skip(self, new), fields(sender = %new.sender_name, receiver = %new.receiver_name))]
    pub async fn propose(&self, new: NewProposal) -> Result<Proposal, LedgerError> {
        let draft = validation::validate(&new, LocalDateTime::now())?;

        let proposal = self.proposals.create(&draft).await?;
        info!("Proposal {} created", proposal.id);

        self.publish(LedgerEvent::Proposed(proposal.id));

        Ok(proposal)
    }

    /// Accepts or declines a pending proposal.
    ///
    /// Countering needs a new offer and goes through [`ProposalLedger::counter`] instead.
    #[tracing::instrument(skip(self, note))]
    pub async fn respond(
        &self,
        id: ProposalId,
        status: ProposalStatus,
        note: &str,
    ) -> Result<Proposal, LedgerError> {
        let proposal = self.pending(id).await?;

        if status == ProposalStatus::Countered || !proposal.status.can_transition_to(status) {
            return Err(LedgerError::InvalidTransition {
                from: proposal.status,
                to: status,
            });
        }

        let updated = self
            .proposals
            .update_status(id, proposal.version, status, note)
            .await?
            .ok_or(LedgerError::InvalidTransition {
                from: proposal.status,
                to: status,
            })?;
        info!("Proposal {id} is now {status}");

        self.publish(LedgerEvent::Responded { id, status });

        Ok(updated)
    }

    /// Closes a pending proposal as countered and opens `new` as the counter-offer.
    ///
    /// The counter-offer comes from the original receiver and goes back to the original sender.
    #[tracing::instrument(skip(self, new))]
    pub async fn counter(&self, id: ProposalId, new: NewProposal) -> Result<Proposal, LedgerError> {
        let proposal = self.pending(id).await?;
        let draft = validation::validate(&new, LocalDateTime::now())?;

        if draft.sender_name != proposal.receiver_name {
            return Err(invalid("sender_name"));
        }
        if draft.receiver_name != proposal.sender_name {
            return Err(invalid("receiver_name"));
        }

        let (_, counter_offer) = self
            .proposals
            .counter(id, proposal.version, &draft)
            .await?
            .ok_or(LedgerError::InvalidTransition {
                from: proposal.status,
                to: ProposalStatus::Countered,
            })?;
        info!("Proposal {id} countered with {}", counter_offer.id);

        self.publish(LedgerEvent::Countered {
            original: id,
            counter_offer: counter_offer.id,
        });

        Ok(counter_offer)
    }

    async fn pending(&self, id: ProposalId) -> Result<Proposal, LedgerError> {
        match self.proposals.get(id).await? {
            Some(proposal) if !proposal.status.is_terminal() => Ok(proposal),
            _ => Err(LedgerError::NotFound(id)),
        }
    }

    /// The negotiation that led to `id`, from the opening offer to `id` itself.
    pub async fn negotiation_chain(&self, id: ProposalId) -> Result<Vec<Proposal>, LedgerError> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(id);

        while let Some(current) = next {
            if !seen.insert(current) {
                warn!("Proposal {current} appears twice in a counter chain");
                break;
            }

            let Some(proposal) = self.proposals.get(current).await? else {
                if current == id {
                    return Err(LedgerError::NotFound(id));
                }
                warn!("Counter chain of {id} references missing proposal {current}");
                break;
            };

            next = proposal.counter_of;
            chain.push(proposal);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Confirmed proposals involving `player` in `division`, oldest first.
    pub async fn confirmed_for(
        &self,
        player: &PlayerName,
        division: &Division,
    ) -> Result<Vec<Proposal>, LedgerError> {
        let mut proposals = self.proposals.list_by_sender(player, division).await?;
        proposals.extend(self.proposals.list_by_receiver(player, division).await?);

        proposals.retain(|proposal| proposal.status == ProposalStatus::Confirmed);
        proposals.sort_by_key(|proposal| proposal.id);
        proposals.dedup_by_key(|proposal| proposal.id);

        Ok(proposals)
    }

    /// Proposals waiting for `player` to answer in `division`.
    pub async fn pending_for(
        &self,
        player: &PlayerName,
        division: &Division,
    ) -> Result<Vec<Proposal>, LedgerError> {
        let mut proposals = self.proposals.list_by_receiver(player, division).await?;
        proposals.retain(|proposal| proposal.status == ProposalStatus::Pending);
        Ok(proposals)
    }

    /// Records the result of a confirmed proposal.
    #[tracing::instrument(skip(self))]
    pub async fn mark_completed(
        &self,
        proposal_id: ProposalId,
        winner: &PlayerName,
        completed_date: CalendarDate,
    ) -> Result<CompletedMatch, LedgerError> {
        let proposal = self
            .proposals
            .get(proposal_id)
            .await?
            .ok_or(LedgerError::NotFound(proposal_id))?;

        if proposal.status != ProposalStatus::Confirmed {
            return Err(LedgerError::NotConfirmed {
                id: proposal_id,
                status: proposal.status,
            });
        }
        if !proposal.involves(winner) {
            return Err(invalid("winner"));
        }
        if self.completed.find_by_proposal(proposal_id).await?.is_some() {
            return Err(LedgerError::AlreadyCompleted(proposal_id));
        }

        let completed = self
            .completed
            .mark_completed(&NewCompletedMatch {
                proposal_id: Some(proposal_id),
                divisions: proposal.divisions.clone(),
                sender_name: proposal.sender_name.clone(),
                receiver_name: proposal.receiver_name.clone(),
                completed_date,
                winner: winner.clone(),
            })
            .await?;
        info!("Proposal {proposal_id} completed, winner {winner}");

        self.publish(LedgerEvent::Completed(completed.id));

        Ok(completed)
    }

    /// Admin correction of a recorded winner.
    #[tracing::instrument(skip(self))]
    pub async fn correct_winner(
        &self,
        id: CompletedMatchId,
        winner: &PlayerName,
    ) -> Result<CompletedMatch, LedgerError> {
        let completed = self
            .completed
            .get(id)
            .await?
            .ok_or(LedgerError::MatchNotFound(id))?;

        if *winner != completed.sender_name && *winner != completed.receiver_name {
            return Err(invalid("winner"));
        }

        let corrected = self
            .completed
            .correct_winner(id, winner)
            .await?
            .ok_or(LedgerError::MatchNotFound(id))?;
        info!("Winner of {id:?} corrected to {winner}");

        self.publish(LedgerEvent::WinnerCorrected(id));

        Ok(corrected)
    }
}
