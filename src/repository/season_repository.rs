use async_trait::async_trait;
use indoc::indoc;
use sqlx::{query, query_as, FromRow, Pool, Sqlite};

use super::{
    conversion::{DBConvertible, DBFromConversionError, DBToConversionError},
    SeasonStore,
};
use crate::models::{
    types::{Division, LocalDateTime},
    Phase, PhaseSettings, Season,
};

pub struct SeasonRepository {
    pool: Pool<Sqlite>,
}

impl SeasonRepository {
    pub fn new(pool: Pool<Sqlite>) -> SeasonRepository {
        SeasonRepository { pool }
    }

    /// Publishes `season` as the division's active season, replacing any previous one.
    pub async fn publish_season(&self, season: &Season) -> Result<(), anyhow::Error> {
        let mut transaction = self.pool.begin().await?;

        let row = season.to_db()?;
        query(indoc! {r#"
            INSERT INTO seasons (
                division_key,
                division,
                phase1_start,
                phase1_end,
                phase2_start,
                phase2_end)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (division_key) DO UPDATE SET
                division = $2,
                phase1_start = $3,
                phase1_end = $4,
                phase2_start = $5,
                phase2_end = $6
        "#})
        .bind(season.division.key())
        .bind(&row.division)
        .bind(&row.phase1_start)
        .bind(&row.phase1_end)
        .bind(&row.phase2_start)
        .bind(&row.phase2_end)
        .execute(&mut *transaction)
        .await?;

        transaction.commit().await?;

        Ok(())
    }

    /// Sets or clears the admin phase override. Bumps the settings version.
    pub async fn set_phase_override(
        &self,
        division: &Division,
        phase_override: Option<Phase>,
    ) -> Result<PhaseSettings, anyhow::Error> {
        let phase_override = phase_override.map(|phase| phase.to_db()).transpose()?;

        let settings = query_as::<_, SqlPhaseSettings>(indoc! {r#"
            INSERT INTO phase_settings (division_key, division, phase_override, version)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (division_key) DO UPDATE SET
                phase_override = $3,
                version = version + 1
            RETURNING division, phase_override, phase2_activated, version
        "#})
        .bind(division.key())
        .bind(division.as_ref())
        .bind(phase_override)
        .fetch_one(&self.pool)
        .await?;

        Ok(PhaseSettings::from_db(&settings)?)
    }

    /// Unlocks (or locks again) Phase 2 for the division. Bumps the settings version.
    pub async fn set_phase2_activated(
        &self,
        division: &Division,
        activated: bool,
    ) -> Result<PhaseSettings, anyhow::Error> {
        let settings = query_as::<_, SqlPhaseSettings>(indoc! {r#"
            INSERT INTO phase_settings (division_key, division, phase2_activated, version)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (division_key) DO UPDATE SET
                phase2_activated = $3,
                version = version + 1
            RETURNING division, phase_override, phase2_activated, version
        "#})
        .bind(division.key())
        .bind(division.as_ref())
        .bind(activated)
        .fetch_one(&self.pool)
        .await?;

        Ok(PhaseSettings::from_db(&settings)?)
    }
}

#[async_trait]
impl SeasonStore for SeasonRepository {
    async fn get_current_season(
        &self,
        division: &Division,
    ) -> Result<Option<Season>, anyhow::Error> {
        let season = query_as::<_, SqlSeason>(indoc! {r#"
            SELECT division, phase1_start, phase1_end, phase2_start, phase2_end
            FROM seasons
            WHERE division_key = $1
        "#})
        .bind(division.key())
        .fetch_optional(&self.pool)
        .await?;

        match season {
            Some(season) => Ok(Some(Season::from_db(&season)?)),
            None => Ok(None),
        }
    }

    async fn get_phase_settings(&self, division: &Division) -> Result<PhaseSettings, anyhow::Error> {
        let settings = query_as::<_, SqlPhaseSettings>(indoc! {r#"
            SELECT division, phase_override, phase2_activated, version
            FROM phase_settings
            WHERE division_key = $1
        "#})
        .bind(division.key())
        .fetch_optional(&self.pool)
        .await?;

        match settings {
            Some(settings) => Ok(PhaseSettings::from_db(&settings)?),
            None => Ok(PhaseSettings::unconfigured(division.clone())),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct SqlSeason {
    division: String,
    phase1_start: String,
    phase1_end: String,
    phase2_start: String,
    phase2_end: String,
}

impl DBConvertible for Season {
    type DBType = SqlSeason;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(SqlSeason {
            division: self.division.to_string(),
            phase1_start: self.phase1_start.to_db()?,
            phase1_end: self.phase1_end.to_db()?,
            phase2_start: self.phase2_start.to_db()?,
            phase2_end: self.phase2_end.to_db()?,
        })
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(Season {
            division: Division::new(&value.division),
            phase1_start: LocalDateTime::from_db(&value.phase1_start)?,
            phase1_end: LocalDateTime::from_db(&value.phase1_end)?,
            phase2_start: LocalDateTime::from_db(&value.phase2_start)?,
            phase2_end: LocalDateTime::from_db(&value.phase2_end)?,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct SqlPhaseSettings {
    division: String,
    phase_override: Option<String>,
    phase2_activated: bool,
    version: i64,
}

impl DBConvertible for PhaseSettings {
    type DBType = SqlPhaseSettings;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(SqlPhaseSettings {
            division: self.division.to_string(),
            phase_override: self.phase_override.map(|phase| phase.to_db()).transpose()?,
            phase2_activated: self.phase2_activated,
            version: self.version as _,
        })
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(PhaseSettings {
            division: Division::new(&value.division),
            phase_override: value.phase_override.as_ref().map(Phase::from_db).transpose()?,
            phase2_activated: value.phase2_activated,
            version: u32::try_from(value.version)
                .map_err(|_| DBFromConversionError::InvalidNumber(value.version))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::SeasonRepository;
    use crate::{
        models::{types::Division, Phase, Season},
        repository::{testing::memory_pool, SeasonStore},
    };

    fn season(division: &str) -> Season {
        Season {
            division: Division::new(division),
            phase1_start: datetime!(2024-01-01 00:00).into(),
            phase1_end: datetime!(2024-03-01 00:00).into(),
            phase2_start: datetime!(2024-03-01 00:00).into(),
            phase2_end: datetime!(2024-04-15 00:00).into(),
        }
    }

    #[test_log::test(tokio::test)]
    async fn publish_and_get() {
        let repository = SeasonRepository::new(memory_pool().await);

        repository.publish_season(&season("Monday 8-Ball")).await.unwrap();

        let loaded = repository
            .get_current_season(&Division::new("monday 8-ball"))
            .await
            .unwrap();
        assert_eq!(loaded, Some(season("Monday 8-Ball")));

        let missing = repository
            .get_current_season(&Division::new("Tuesday"))
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[test_log::test(tokio::test)]
    async fn republishing_replaces() {
        let repository = SeasonRepository::new(memory_pool().await);
        repository.publish_season(&season("D")).await.unwrap();

        let mut extended = season("D");
        extended.phase1_end = datetime!(2024-03-08 00:00).into();
        repository.publish_season(&extended).await.unwrap();

        let loaded = repository.get_current_season(&Division::new("D")).await.unwrap();
        assert_eq!(loaded, Some(extended));
    }

    #[test_log::test(tokio::test)]
    async fn settings_default_to_unconfigured() {
        let repository = SeasonRepository::new(memory_pool().await);

        let settings = repository.get_phase_settings(&Division::new("D")).await.unwrap();

        assert_eq!(settings.phase_override, None);
        assert!(!settings.phase2_activated);
        assert_eq!(settings.version, 0);
    }

    #[test_log::test(tokio::test)]
    async fn settings_changes_bump_version() {
        let repository = SeasonRepository::new(memory_pool().await);
        let division = Division::new("D");

        let settings = repository
            .set_phase_override(&division, Some(Phase::Challenge))
            .await
            .unwrap();
        assert_eq!(settings.phase_override, Some(Phase::Challenge));
        assert_eq!(settings.version, 1);

        let settings = repository.set_phase2_activated(&division, true).await.unwrap();
        assert_eq!(settings.phase_override, Some(Phase::Challenge));
        assert!(settings.phase2_activated);
        assert_eq!(settings.version, 2);

        let settings = repository.set_phase_override(&division, None).await.unwrap();
        assert_eq!(settings.phase_override, None);
        assert_eq!(settings.version, 3);

        assert_eq!(repository.get_phase_settings(&division).await.unwrap(), settings);
    }
}
