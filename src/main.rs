#![forbid(unsafe_code)]

use std::{process::exit, str::FromStr, sync::Arc, time::Duration};

use pool_league_scheduler::{
    ledger::ProposalLedger,
    progress_service::{ProgressService, WatchedPlayer, DEFAULT_POLL_INTERVAL},
    repository::{
        CompletedMatchRepository, ProposalRepository, RosterRepository, SeasonRepository,
    },
};
use serde::Deserialize;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tokio::{signal, sync::Notify};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Deserialize)]
struct AppConfig {
    database_url: String,
    poll_interval_secs: Option<u64>,
    watched_players: Option<Vec<String>>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        warn!("Could not load config from .env file: {err}");
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(
                    "pool_league_scheduler=info"
                        .parse()
                        .expect("Hard-coded default directive should be correct"),
                )
                .from_env_lossy(),
        )
        .init();

    let app_config = match envy::from_env::<AppConfig>() {
        Ok(config) => config,
        Err(err) => {
            error!("Could not load app config: {err}");
            exit(255);
        }
    };

    let watched = match parse_watched_players(app_config.watched_players.unwrap_or_default()) {
        Ok(watched) => watched,
        Err(err) => {
            error!("Invalid WATCHED_PLAYERS: {err}");
            exit(255);
        }
    };

    let poll_interval = app_config
        .poll_interval_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_POLL_INTERVAL);

    let db_pool = match setup_database(&app_config.database_url).await {
        Ok(pool) => pool,
        Err(err) => {
            error!("Could not setup database: {err}");
            exit(255);
        }
    };

    let completed_repository = Arc::new(CompletedMatchRepository::new(db_pool.clone()));
    let ledger = Arc::new(ProposalLedger::new(
        Arc::new(ProposalRepository::new(db_pool.clone())),
        completed_repository.clone(),
    ));

    let service = ProgressService::new(
        Arc::new(SeasonRepository::new(db_pool.clone())),
        Arc::new(RosterRepository::new(db_pool.clone())),
        completed_repository,
        ledger,
        watched,
        poll_interval,
    );

    let shutdown_notify = Arc::new(Notify::new());
    let service_handle = service.create_and_start(shutdown_notify.clone());

    if let Err(err) = signal::ctrl_c().await {
        error!("Could not listen for Ctrl-C: {err}");
    } else {
        info!("Ctrl-C received, shutting down");
    }

    shutdown_notify.notify_one();
    if let Err(err) = service_handle.await {
        error!("Progress service terminated abnormally: {err}");
    }
    db_pool.close().await;
}

fn parse_watched_players(entries: Vec<String>) -> Result<Vec<WatchedPlayer>, String> {
    entries
        .iter()
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| WatchedPlayer::from_str(entry))
        .collect()
}

#[tracing::instrument(skip(url))]
async fn setup_database(url: &str) -> anyhow::Result<SqlitePool> {
    info!("Connecting to SQLite database at {url}");
    let pool = SqlitePoolOptions::new().connect(url).await?;
    info!("Running migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Done!");
    Ok(pool)
}
