//! Storage collaborators and their SQLite implementations.

mod completed_match_repository;
mod conversion;
mod proposal_repository;
mod roster_repository;
mod season_repository;

use async_trait::async_trait;

pub use completed_match_repository::CompletedMatchRepository;
pub use proposal_repository::ProposalRepository;
pub use roster_repository::RosterRepository;
pub use season_repository::SeasonRepository;

use crate::models::{
    types::{Division, PlayerName},
    CompletedMatch, CompletedMatchId, NewCompletedMatch, PhaseSettings, Proposal, ProposalDraft,
    ProposalId, ProposalStatus, RequirementEntry, RequirementPhase, Season,
};

/// Published opponent rosters.
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// The division's requirements for `phase`, in publication order. Entries without a phase
    /// belong to Phase 1.
    async fn requirements(
        &self,
        division: &Division,
        phase: RequirementPhase,
    ) -> Result<Vec<RequirementEntry>, anyhow::Error>;
}

#[async_trait]
pub trait ProposalStore: Send + Sync {
    async fn create(&self, draft: &ProposalDraft) -> Result<Proposal, anyhow::Error>;

    async fn get(&self, id: ProposalId) -> Result<Option<Proposal>, anyhow::Error>;

    /// Proposals received by `name` that include `division`, oldest first.
    async fn list_by_receiver(
        &self,
        name: &PlayerName,
        division: &Division,
    ) -> Result<Vec<Proposal>, anyhow::Error>;

    /// Proposals sent by `name` that include `division`, oldest first.
    async fn list_by_sender(
        &self,
        name: &PlayerName,
        division: &Division,
    ) -> Result<Vec<Proposal>, anyhow::Error>;

    /// Moves a pending proposal to `status` if it is still at `expected_version`.
    ///
    /// Returns `None` if the proposal was changed concurrently or is no longer pending.
    async fn update_status(
        &self,
        id: ProposalId,
        expected_version: u32,
        status: ProposalStatus,
        note: &str,
    ) -> Result<Option<Proposal>, anyhow::Error>;

    /// Atomically marks a pending proposal countered and stores `draft` as its counter-offer.
    ///
    /// Returns the updated original and the new proposal, or `None` under the same
    /// conditions as [`ProposalStore::update_status`].
    async fn counter(
        &self,
        id: ProposalId,
        expected_version: u32,
        draft: &ProposalDraft,
    ) -> Result<Option<(Proposal, Proposal)>, anyhow::Error>;
}

#[async_trait]
pub trait CompletedMatchStore: Send + Sync {
    async fn list_by_division(
        &self,
        division: &Division,
    ) -> Result<Vec<CompletedMatch>, anyhow::Error>;

    async fn get(&self, id: CompletedMatchId) -> Result<Option<CompletedMatch>, anyhow::Error>;

    async fn find_by_proposal(
        &self,
        proposal_id: ProposalId,
    ) -> Result<Option<CompletedMatch>, anyhow::Error>;

    async fn mark_completed(
        &self,
        new_match: &NewCompletedMatch,
    ) -> Result<CompletedMatch, anyhow::Error>;

    async fn correct_winner(
        &self,
        id: CompletedMatchId,
        winner: &PlayerName,
    ) -> Result<Option<CompletedMatch>, anyhow::Error>;
}

#[async_trait]
pub trait SeasonStore: Send + Sync {
    async fn get_current_season(&self, division: &Division)
        -> Result<Option<Season>, anyhow::Error>;

    /// Never fails for an unknown division: it simply has default settings.
    async fn get_phase_settings(&self, division: &Division)
        -> Result<PhaseSettings, anyhow::Error>;
}

#[cfg(test)]
pub(crate) mod testing {
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

    /// An in-memory database with migrations applied. A single connection, since every
    /// connection to `sqlite::memory:` is its own database.
    pub async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }
}
