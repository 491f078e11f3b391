use std::collections::BTreeSet;

use async_trait::async_trait;
use indoc::indoc;
use sqlx::{query_as, FromRow, Pool, Sqlite};
use tracing::warn;

use super::{
    conversion::{DBConvertible, DBFromConversionError, DBToConversionError},
    CompletedMatchStore,
};
use crate::{
    models::{
        types::{Division, PlayerName},
        CompletedMatch, CompletedMatchId, NewCompletedMatch, ProposalId,
    },
    parsing::normalize_date,
};

pub struct CompletedMatchRepository {
    pool: Pool<Sqlite>,
}

impl CompletedMatchRepository {
    pub fn new(pool: Pool<Sqlite>) -> CompletedMatchRepository {
        CompletedMatchRepository { pool }
    }
}

#[async_trait]
impl CompletedMatchStore for CompletedMatchRepository {
    async fn list_by_division(
        &self,
        division: &Division,
    ) -> Result<Vec<CompletedMatch>, anyhow::Error> {
        let rows = query_as::<_, SqlCompletedMatch>(indoc! {r#"
            SELECT id, proposal_id, divisions, sender_name, receiver_name, completed_date, winner
            FROM completed_matches
            ORDER BY id
        "#})
        .fetch_all(&self.pool)
        .await?;

        let mut matches = Vec::new();
        for row in &rows {
            match CompletedMatch::from_db(row) {
                Ok(completed) if completed.is_in_division(division) => matches.push(completed),
                Ok(_) => {}
                Err(err) => warn!("Skipping unreadable completed match {}: {err}", row.id),
            }
        }

        Ok(matches)
    }

    async fn get(&self, id: CompletedMatchId) -> Result<Option<CompletedMatch>, anyhow::Error> {
        let row = query_as::<_, SqlCompletedMatch>(indoc! {r#"
            SELECT id, proposal_id, divisions, sender_name, receiver_name, completed_date, winner
            FROM completed_matches
            WHERE id = $1
        "#})
        .bind(id.to_db()?)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(CompletedMatch::from_db(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_proposal(
        &self,
        proposal_id: ProposalId,
    ) -> Result<Option<CompletedMatch>, anyhow::Error> {
        let row = query_as::<_, SqlCompletedMatch>(indoc! {r#"
            SELECT id, proposal_id, divisions, sender_name, receiver_name, completed_date, winner
            FROM completed_matches
            WHERE proposal_id = $1
        "#})
        .bind(proposal_id.to_db()?)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(CompletedMatch::from_db(&row)?)),
            None => Ok(None),
        }
    }

    async fn mark_completed(
        &self,
        new_match: &NewCompletedMatch,
    ) -> Result<CompletedMatch, anyhow::Error> {
        let mut transaction = self.pool.begin().await?;

        let row = query_as::<_, SqlCompletedMatch>(indoc! {r#"
            INSERT INTO completed_matches (
                proposal_id,
                divisions,
                sender_name,
                receiver_name,
                completed_date,
                winner)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, proposal_id, divisions, sender_name, receiver_name, completed_date, winner
        "#})
        .bind(new_match.proposal_id.map(|id| id.to_db()).transpose()?)
        .bind(new_match.divisions.to_db()?)
        .bind(new_match.sender_name.as_ref())
        .bind(new_match.receiver_name.as_ref())
        .bind(new_match.completed_date.to_canonical())
        .bind(new_match.winner.as_ref())
        .fetch_one(&mut *transaction)
        .await?;

        transaction.commit().await?;

        Ok(CompletedMatch::from_db(&row)?)
    }

    async fn correct_winner(
        &self,
        id: CompletedMatchId,
        winner: &PlayerName,
    ) -> Result<Option<CompletedMatch>, anyhow::Error> {
        let row = query_as::<_, SqlCompletedMatch>(indoc! {r#"
            UPDATE completed_matches
            SET winner = $1
            WHERE id = $2
            RETURNING id, proposal_id, divisions, sender_name, receiver_name, completed_date, winner
        "#})
        .bind(winner.as_ref())
        .bind(id.to_db()?)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(CompletedMatch::from_db(&row)?)),
            None => Ok(None),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct SqlCompletedMatch {
    id: i64,
    proposal_id: Option<i64>,
    divisions: String,
    sender_name: String,
    receiver_name: String,
    completed_date: String,
    winner: String,
}

impl DBConvertible for CompletedMatch {
    type DBType = SqlCompletedMatch;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(SqlCompletedMatch {
            id: self.id.to_db()?,
            proposal_id: self.proposal_id.map(|id| id.to_db()).transpose()?,
            divisions: self.divisions.to_db()?,
            sender_name: self.sender_name.to_string(),
            receiver_name: self.receiver_name.to_string(),
            completed_date: self.completed_date.to_canonical(),
            winner: self.winner.to_string(),
        })
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        let id = CompletedMatchId::from_db(&value.id)?;

        let divisions = BTreeSet::<Division>::from_db(&value.divisions).unwrap_or_else(|err| {
            warn!("Completed match {} has unreadable divisions: {err}", value.id);
            BTreeSet::new()
        });

        Ok(CompletedMatch {
            id,
            proposal_id: value.proposal_id.as_ref().map(ProposalId::from_db).transpose()?,
            divisions,
            sender_name: PlayerName::new(&value.sender_name),
            receiver_name: PlayerName::new(&value.receiver_name),
            completed_date: normalize_date(&value.completed_date),
            winner: PlayerName::new(&value.winner),
        })
    }
}
