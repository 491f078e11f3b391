use std::{
    collections::HashMap,
    str::FromStr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use tokio::{select, sync::Notify};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    ledger::{LedgerEvent, ProposalLedger},
    models::{
        types::{Division, LocalDateTime, PlayerName},
        PlayerDirectory, Proposal,
    },
    phase::{resolve_phase, PhaseState},
    reconciler::{reconcile, ReconciliationResult},
    report::{report, ProgressReport},
    repository::{CompletedMatchStore, RosterSource, SeasonStore},
    requirements::load_requirement_set,
    utils::formatting::format_local,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// A player whose progress the service keeps up to date.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WatchedPlayer {
    pub division: Division,
    pub player: PlayerName,
}

impl FromStr for WatchedPlayer {
    type Err = String;

    /// Parses `Division/Player Name`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (division, player) = s
            .split_once('/')
            .ok_or_else(|| format!("Expected `Division/Player Name`, got `{s}`"))?;

        let division = Division::new(division);
        let player = PlayerName::new(player);
        if division.is_blank() || player.is_blank() {
            return Err(format!("Division and player must not be empty in `{s}`"));
        }

        Ok(WatchedPlayer { division, player })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerProgress {
    pub phase: PhaseState,
    pub reconciliation: ReconciliationResult,
    /// `None` while the division has no published season.
    pub report: Option<ProgressReport>,
    /// Start of the earliest confirmed match that hasn't begun yet.
    pub next_match: Option<LocalDateTime>,
}

/// Latest computed progress per watched player.
///
/// Each computation carries the sequence number of the fetch it started from. A result is
/// only stored if its sequence number is newer than the stored one, so a slow computation
/// finishing late can't overwrite fresher data.
#[derive(Debug, Default)]
pub struct ProgressBoard {
    entries: Mutex<HashMap<WatchedPlayer, (u64, PlayerProgress)>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Publication {
    Stale,
    Unchanged,
    Changed,
}

impl ProgressBoard {
    pub fn publish(
        &self,
        watched: &WatchedPlayer,
        sequence: u64,
        progress: PlayerProgress,
    ) -> Publication {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let previous = entries
            .get(watched)
            .map(|(stored_sequence, stored)| (*stored_sequence, *stored == progress));

        match previous {
            Some((stored_sequence, _)) if stored_sequence >= sequence => Publication::Stale,
            Some((_, unchanged)) => {
                entries.insert(watched.clone(), (sequence, progress));
                if unchanged {
                    Publication::Unchanged
                } else {
                    Publication::Changed
                }
            }
            None => {
                entries.insert(watched.clone(), (sequence, progress));
                Publication::Changed
            }
        }
    }

    pub fn get(&self, watched: &WatchedPlayer) -> Option<PlayerProgress> {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(watched).map(|(_, progress)| progress.clone())
    }
}

pub struct ProgressService {
    seasons: Arc<dyn SeasonStore>,
    roster: Arc<dyn RosterSource>,
    completed: Arc<dyn CompletedMatchStore>,
    ledger: Arc<ProposalLedger>,
    board: Arc<ProgressBoard>,
    watched: Vec<WatchedPlayer>,
    poll_interval: Duration,
    sequence: AtomicU64,
}

impl ProgressService {
    pub fn new(
        seasons: Arc<dyn SeasonStore>,
        roster: Arc<dyn RosterSource>,
        completed: Arc<dyn CompletedMatchStore>,
        ledger: Arc<ProposalLedger>,
        watched: Vec<WatchedPlayer>,
        poll_interval: Duration,
    ) -> ProgressService {
        ProgressService {
            seasons,
            roster,
            completed,
            ledger,
            board: Arc::new(ProgressBoard::default()),
            watched,
            poll_interval,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn board(&self) -> Arc<ProgressBoard> {
        self.board.clone()
    }

    pub fn create_and_start(self, shutdown: Arc<Notify>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(
            async move {
                let mut ledger_events = self.ledger.subscribe();

                info!(
                    "Watching {} player(s), polling every {:?}",
                    self.watched.len(),
                    self.poll_interval
                );

                loop {
                    self.refresh_all().await;

                    select! {
                        _ = tokio::time::sleep(self.poll_interval) => {}

                        evt = ledger_events.recv() => {
                            match evt {
                                Ok(event) => debug!("Refreshing after ledger event {event:?}"),
                                Err(err) => warn!("Error while receiving a ledger event: {err:?}"),
                            }
                        }

                        _ = shutdown.notified() => {
                            info!("Shutting down progress service");
                            break;
                        }
                    }
                }
            }
            .instrument(info_span!("progress_loop")),
        )
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub async fn refresh_all(&self) {
        let now = LocalDateTime::now();

        for watched in &self.watched {
            if let Err(err) = self.refresh(watched, now).await {
                error!(
                    "Could not compute progress of {} in {}: {err}",
                    watched.player, watched.division
                );
            }
        }
    }

    /// Recomputes and publishes one player's progress.
    #[tracing::instrument(skip(self), fields(player = %watched.player, division = %watched.division))]
    pub async fn refresh(
        &self,
        watched: &WatchedPlayer,
        now: LocalDateTime,
    ) -> Result<Publication, anyhow::Error> {
        let sequence = self.next_sequence();
        let progress = self.compute(&watched.division, &watched.player, now).await?;

        let publication = self.board.publish(watched, sequence, progress.clone());
        match publication {
            Publication::Changed => match &progress.report {
                Some(report) => info!(
                    "Progress in {} (week {:?}, next match {}):\n{}",
                    progress.phase.phase,
                    progress.phase.week_number,
                    progress
                        .next_match
                        .map(format_local)
                        .unwrap_or_else(|| "not scheduled".to_string()),
                    report.summary()
                ),
                None => info!("No season published, phase is {}", progress.phase.phase),
            },
            Publication::Unchanged => debug!("Progress unchanged"),
            Publication::Stale => debug!("Discarding stale progress #{sequence}"),
        }

        Ok(publication)
    }

    /// Gathers requirements, confirmations and results for the player and reconciles them.
    pub async fn compute(
        &self,
        division: &Division,
        player: &PlayerName,
        now: LocalDateTime,
    ) -> Result<PlayerProgress, anyhow::Error> {
        let season = self.seasons.get_current_season(division).await?;
        let settings = self.seasons.get_phase_settings(division).await?;
        let phase = resolve_phase(season.as_ref(), &settings, now);

        let requirement_set =
            load_requirement_set(self.roster.as_ref(), division, phase.phase, player).await?;
        let confirmed = self.ledger.confirmed_for(player, division).await?;
        let completed = self.completed.list_by_division(division).await?;

        check_names(&requirement_set.directory, &confirmed, player, division);

        // Only confirmations made for the active phase count toward its requirements.
        let confirmed_this_phase: Vec<Proposal> = confirmed
            .iter()
            .filter(|proposal| proposal.phase == phase.phase)
            .cloned()
            .collect();

        let reconciliation = reconcile(
            player,
            division,
            &requirement_set.entries,
            &confirmed_this_phase,
            &completed,
        );
        let report = season
            .as_ref()
            .map(|season| report(&reconciliation, season, now));
        let next_match = confirmed
            .iter()
            .filter_map(Proposal::scheduled_at)
            .filter(|start| *start >= now)
            .min();

        Ok(PlayerProgress {
            phase,
            reconciliation,
            report,
            next_match,
        })
    }
}

/// Warns about the player's proposals naming someone who isn't on the roster. Those can
/// never satisfy a requirement, which usually means a misspelled name.
fn check_names(
    directory: &PlayerDirectory,
    confirmed: &[Proposal],
    player: &PlayerName,
    division: &Division,
) {
    if directory.is_empty() {
        return;
    }
    if !directory.contains(player) {
        warn!("{player} is not on the {division} roster");
        return;
    }

    for proposal in confirmed {
        for name in [&proposal.sender_name, &proposal.receiver_name] {
            if directory.id_of(name).is_none() {
                warn!(
                    "Proposal {} names {name}, who is not on the {division} roster",
                    proposal.id
                );
            }
        }
    }
}
