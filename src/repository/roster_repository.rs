use async_trait::async_trait;
use indoc::indoc;
use sqlx::{query, query_as, FromRow, Pool, Sqlite};
use tracing::{info, warn};

use super::{
    conversion::{DBConvertible, DBFromConversionError, DBToConversionError},
    RosterSource,
};
use crate::models::{
    types::{Division, PlayerName},
    RequirementEntry, RequirementPhase,
};

pub struct RosterRepository {
    pool: Pool<Sqlite>,
}

impl RosterRepository {
    pub fn new(pool: Pool<Sqlite>) -> RosterRepository {
        RosterRepository { pool }
    }

    /// Replaces the division's published roster. Entry order is preserved.
    #[tracing::instrument(skip(self, entries), fields(entries = entries.len()))]
    pub async fn publish_roster(
        &self,
        division: &Division,
        entries: &[RequirementEntry],
    ) -> Result<(), anyhow::Error> {
        let mut transaction = self.pool.begin().await?;

        query("DELETE FROM requirements WHERE division_key = $1")
            .bind(division.key())
            .execute(&mut *transaction)
            .await?;

        for entry in entries {
            if entry.division != *division {
                warn!(
                    "Skipping roster entry {} vs {} from division {}",
                    entry.player_a, entry.player_b, entry.division
                );
                continue;
            }

            let row = entry.to_db()?;
            query(indoc! {r#"
                INSERT INTO requirements (division_key, division, phase, player_a, player_b)
                VALUES ($1, $2, $3, $4, $5)
            "#})
            .bind(division.key())
            .bind(&row.division)
            .bind(row.phase)
            .bind(&row.player_a)
            .bind(&row.player_b)
            .execute(&mut *transaction)
            .await?;
        }

        transaction.commit().await?;

        info!("Published roster for {division}");

        Ok(())
    }
}

#[async_trait]
impl RosterSource for RosterRepository {
    async fn requirements(
        &self,
        division: &Division,
        phase: RequirementPhase,
    ) -> Result<Vec<RequirementEntry>, anyhow::Error> {
        let rows = query_as::<_, SqlRequirement>(indoc! {r#"
            SELECT division, phase, player_a, player_b
            FROM requirements
            WHERE division_key = $1 AND COALESCE(phase, 1) = $2
            ORDER BY id
        "#})
        .bind(division.key())
        .bind(phase.to_db()?)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| match RequirementEntry::from_db(row) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("Skipping unreadable roster entry {row:?}: {err}");
                    None
                }
            })
            .collect())
    }
}

#[derive(Debug, FromRow)]
pub struct SqlRequirement {
    division: String,
    phase: Option<i64>,
    player_a: String,
    player_b: String,
}

impl DBConvertible for RequirementEntry {
    type DBType = SqlRequirement;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(SqlRequirement {
            division: self.division.to_string(),
            phase: self.phase.map(|phase| phase.to_db()).transpose()?,
            player_a: self.player_a.to_string(),
            player_b: self.player_b.to_string(),
        })
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(RequirementEntry {
            division: Division::new(&value.division),
            phase: value.phase.as_ref().map(RequirementPhase::from_db).transpose()?,
            player_a: PlayerName::new(&value.player_a),
            player_b: PlayerName::new(&value.player_b),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RosterRepository;
    use crate::{
        models::{
            types::{Division, PlayerName},
            RequirementEntry, RequirementPhase,
        },
        repository::{testing::memory_pool, RosterSource},
    };

    fn entry(division: &str, phase: Option<u8>, a: &str, b: &str) -> RequirementEntry {
        RequirementEntry {
            division: Division::new(division),
            phase: phase.map(RequirementPhase),
            player_a: PlayerName::new(a),
            player_b: PlayerName::new(b),
        }
    }

    #[test_log::test(tokio::test)]
    async fn requirements_by_phase_in_order() {
        let repository = RosterRepository::new(memory_pool().await);
        let division = Division::new("D");
        let roster = vec![
            entry("D", None, "Pat", "Ann"),
            entry("D", Some(2), "Pat", "Bob"),
            entry("D", Some(1), "Cid", "Pat"),
        ];

        repository.publish_roster(&division, &roster).await.unwrap();

        let phase1 = repository
            .requirements(&division, RequirementPhase::ONE)
            .await
            .unwrap();
        assert_eq!(phase1, vec![roster[0].clone(), roster[2].clone()]);

        let phase2 = repository
            .requirements(&division, RequirementPhase::TWO)
            .await
            .unwrap();
        assert_eq!(phase2, vec![roster[1].clone()]);
    }

    #[test_log::test(tokio::test)]
    async fn republishing_replaces_only_that_division() {
        let repository = RosterRepository::new(memory_pool().await);
        let d = Division::new("D");
        let e = Division::new("E");

        repository
            .publish_roster(&d, &[entry("D", None, "Pat", "Ann")])
            .await
            .unwrap();
        repository
            .publish_roster(&e, &[entry("E", None, "Pat", "Bob")])
            .await
            .unwrap();
        repository
            .publish_roster(&d, &[entry("D", None, "Pat", "Cid"), entry("E", None, "X", "Y")])
            .await
            .unwrap();

        let d_roster = repository.requirements(&d, RequirementPhase::ONE).await.unwrap();
        assert_eq!(d_roster, vec![entry("D", None, "Pat", "Cid")]);

        let e_roster = repository.requirements(&e, RequirementPhase::ONE).await.unwrap();
        assert_eq!(e_roster, vec![entry("E", None, "Pat", "Bob")]);
    }
}
