mod completed_match;
mod player;
mod proposal;
mod requirement;
mod season;

pub mod types;

pub use completed_match::{CompletedMatch, CompletedMatchId, NewCompletedMatch};
pub use player::{PlayerDirectory, PlayerId};
pub use proposal::{NewProposal, Proposal, ProposalDraft, ProposalId, ProposalStatus};
pub use requirement::{RequirementEntry, RequirementPhase};
pub use season::{Phase, PhaseSettings, Season};
