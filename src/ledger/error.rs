use crate::models::{CompletedMatchId, ProposalId, ProposalStatus};

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("Missing or invalid proposal field: {field}")]
    Validation { field: &'static str },
    #[error("Proposal {0} does not exist or is no longer pending")]
    NotFound(ProposalId),
    #[error("Cannot move a proposal from {from} to {to}")]
    InvalidTransition {
        from: ProposalStatus,
        to: ProposalStatus,
    },
    #[error("Proposal {id} is {status}, only confirmed proposals can be completed")]
    NotConfirmed {
        id: ProposalId,
        status: ProposalStatus,
    },
    #[error("Proposal {0} has already been marked completed")]
    AlreadyCompleted(ProposalId),
    #[error("Completed match {0:?} does not exist")]
    MatchNotFound(CompletedMatchId),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub(super) fn invalid(field: &'static str) -> LedgerError {
    LedgerError::Validation { field }
}
