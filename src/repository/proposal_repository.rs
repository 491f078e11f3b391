use std::collections::BTreeSet;

use async_trait::async_trait;
use indoc::{formatdoc, indoc};
use sqlx::{query_as, FromRow, Pool, Sqlite, SqliteConnection};
use tracing::warn;

use super::{
    conversion::{DBConvertible, DBFromConversionError, DBToConversionError},
    ProposalStore,
};
use crate::{
    models::{
        types::{Division, LocalDateTime, PlayerName},
        Phase, Proposal, ProposalDraft, ProposalId, ProposalStatus,
    },
    parsing::{normalize_date, normalize_time},
};

pub struct ProposalRepository {
    pool: Pool<Sqlite>,
}

const PROPOSAL_COLUMNS: &str = indoc! {r#"
    id,
    sender_name,
    sender_email,
    receiver_name,
    receiver_email,
    divisions,
    phase,
    date,
    time,
    location,
    game_type,
    race_length,
    note,
    status,
    counter_of,
    version,
    created_at
"#};

impl ProposalRepository {
    pub fn new(pool: Pool<Sqlite>) -> ProposalRepository {
        ProposalRepository { pool }
    }

    async fn insert(
        connection: &mut SqliteConnection,
        draft: &ProposalDraft,
        counter_of: Option<ProposalId>,
    ) -> Result<Proposal, anyhow::Error> {
        let status = ProposalStatus::Pending.to_db()?;
        let divisions = draft.divisions.to_db()?;
        let phase = draft.phase.to_db()?;
        let created_at = draft.created_at.to_db()?;
        let counter_of = counter_of.map(|id| id.to_db()).transpose()?;

        let sql = formatdoc! {
            r#"
                INSERT INTO proposals (
                    sender_name,
                    sender_key,
                    sender_email,
                    receiver_name,
                    receiver_key,
                    receiver_email,
                    divisions,
                    phase,
                    date,
                    time,
                    location,
                    game_type,
                    race_length,
                    note,
                    status,
                    counter_of,
                    version,
                    created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 0, $17)
                RETURNING {columns}
            "#,
            columns = PROPOSAL_COLUMNS,
        };

        let row = query_as::<_, SqlProposal>(&sql)
            .bind(draft.sender_name.as_ref())
            .bind(draft.sender_name.key())
            .bind(&draft.sender_email)
            .bind(draft.receiver_name.as_ref())
            .bind(draft.receiver_name.key())
            .bind(&draft.receiver_email)
            .bind(divisions)
            .bind(phase)
            .bind(draft.date.to_canonical())
            .bind(draft.time.to_canonical())
            .bind(&draft.location)
            .bind(&draft.game_type)
            .bind(draft.race_length.map(i64::from))
            .bind(&draft.note)
            .bind(status)
            .bind(counter_of)
            .bind(created_at)
            .fetch_one(&mut *connection)
            .await?;

        Ok(Proposal::from_db(&row)?)
    }

    async fn transition(
        connection: &mut SqliteConnection,
        id: ProposalId,
        expected_version: u32,
        status: ProposalStatus,
        note: Option<&str>,
    ) -> Result<Option<Proposal>, anyhow::Error> {
        let sql = formatdoc! {
            r#"
                UPDATE proposals
                SET status = $1, note = COALESCE($2, note), version = version + 1
                WHERE id = $3 AND version = $4 AND status = $5
                RETURNING {columns}
            "#,
            columns = PROPOSAL_COLUMNS,
        };

        let row = query_as::<_, SqlProposal>(&sql)
            .bind(status.to_db()?)
            .bind(note)
            .bind(id.to_db()?)
            .bind(expected_version as i64)
            .bind(ProposalStatus::Pending.to_db()?)
            .fetch_optional(&mut *connection)
            .await?;

        row.map(|row| Proposal::from_db(&row))
            .transpose()
            .map_err(Into::into)
    }

    async fn list_by(
        &self,
        key_column: &str,
        name: &PlayerName,
        division: &Division,
    ) -> Result<Vec<Proposal>, anyhow::Error> {
        let sql = format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE {key_column} = $1 ORDER BY id"
        );

        let rows = query_as::<_, SqlProposal>(&sql)
            .bind(name.key())
            .fetch_all(&self.pool)
            .await?;

        let mut proposals = Vec::with_capacity(rows.len());
        for row in &rows {
            let proposal = Proposal::from_db(row)?;
            if proposal.is_in_division(division) {
                proposals.push(proposal);
            }
        }

        Ok(proposals)
    }
}

#[async_trait]
impl ProposalStore for ProposalRepository {
    async fn create(&self, draft: &ProposalDraft) -> Result<Proposal, anyhow::Error> {
        let mut transaction = self.pool.begin().await?;

        let proposal = Self::insert(&mut transaction, draft, None).await?;

        transaction.commit().await?;

        Ok(proposal)
    }

    async fn get(&self, id: ProposalId) -> Result<Option<Proposal>, anyhow::Error> {
        let sql = format!("SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = $1");

        let row = query_as::<_, SqlProposal>(&sql)
            .bind(id.to_db()?)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Proposal::from_db(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_by_receiver(
        &self,
        name: &PlayerName,
        division: &Division,
    ) -> Result<Vec<Proposal>, anyhow::Error> {
        self.list_by("receiver_key", name, division).await
    }

    async fn list_by_sender(
        &self,
        name: &PlayerName,
        division: &Division,
    ) -> Result<Vec<Proposal>, anyhow::Error> {
        self.list_by("sender_key", name, division).await
    }

    async fn update_status(
        &self,
        id: ProposalId,
        expected_version: u32,
        status: ProposalStatus,
        note: &str,
    ) -> Result<Option<Proposal>, anyhow::Error> {
        let mut transaction = self.pool.begin().await?;

        let note = if note.trim().is_empty() { None } else { Some(note) };
        let updated = Self::transition(&mut transaction, id, expected_version, status, note).await?;

        transaction.commit().await?;

        Ok(updated)
    }

    async fn counter(
        &self,
        id: ProposalId,
        expected_version: u32,
        draft: &ProposalDraft,
    ) -> Result<Option<(Proposal, Proposal)>, anyhow::Error> {
        let mut transaction = self.pool.begin().await?;

        let Some(original) = Self::transition(
            &mut transaction,
            id,
            expected_version,
            ProposalStatus::Countered,
            None,
        )
        .await?
        else {
            transaction.rollback().await?;
            return Ok(None);
        };

        let counter_offer = Self::insert(&mut transaction, draft, Some(id)).await?;

        transaction.commit().await?;

        Ok(Some((original, counter_offer)))
    }
}

#[derive(Debug, FromRow)]
pub struct SqlProposal {
    id: i64,
    sender_name: String,
    sender_email: String,
    receiver_name: String,
    receiver_email: String,
    divisions: String,
    phase: String,
    date: String,
    time: String,
    location: String,
    game_type: String,
    race_length: Option<i64>,
    note: String,
    status: String,
    counter_of: Option<i64>,
    version: i64,
    created_at: String,
}

impl DBConvertible for Proposal {
    type DBType = SqlProposal;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(SqlProposal {
            id: self.id.to_db()?,
            sender_name: self.sender_name.to_string(),
            sender_email: self.sender_email.clone(),
            receiver_name: self.receiver_name.to_string(),
            receiver_email: self.receiver_email.clone(),
            divisions: self.divisions.to_db()?,
            phase: self.phase.to_db()?,
            date: self.date.to_canonical(),
            time: self.time.to_canonical(),
            location: self.location.clone(),
            game_type: self.game_type.clone(),
            race_length: self.race_length.map(i64::from),
            note: self.note.clone(),
            status: self.status.to_db()?,
            counter_of: self.counter_of.map(|id| id.to_db()).transpose()?,
            version: self.version as _,
            created_at: self.created_at.to_db()?,
        })
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        let id = ProposalId::from_db(&value.id)?;

        // A proposal whose divisions can't be read stays visible but can't satisfy anything.
        let divisions = BTreeSet::<Division>::from_db(&value.divisions).unwrap_or_else(|err| {
            warn!("Proposal {id} has unreadable divisions {:?}: {err}", value.divisions);
            BTreeSet::new()
        });

        Ok(Proposal {
            id,
            sender_name: PlayerName::new(&value.sender_name),
            sender_email: value.sender_email.clone(),
            receiver_name: PlayerName::new(&value.receiver_name),
            receiver_email: value.receiver_email.clone(),
            divisions,
            phase: Phase::from_db(&value.phase)?,
            date: normalize_date(&value.date),
            time: normalize_time(&value.time),
            location: value.location.clone(),
            game_type: value.game_type.clone(),
            race_length: value
                .race_length
                .map(|length| {
                    u16::try_from(length).map_err(|_| DBFromConversionError::InvalidNumber(length))
                })
                .transpose()?,
            note: value.note.clone(),
            status: ProposalStatus::from_db(&value.status)?,
            counter_of: value.counter_of.as_ref().map(ProposalId::from_db).transpose()?,
            version: u32::try_from(value.version)
                .map_err(|_| DBFromConversionError::InvalidNumber(value.version))?,
            created_at: LocalDateTime::from_db(&value.created_at)?,
        })
    }
}
