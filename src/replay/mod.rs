// One race replay at a time: selection, acquisition, playback, standings.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error};
use tokio::task::JoinHandle;

use crate::api::RaceDataSource;
use crate::errors::ChicaneError;
use crate::model::Race;
use crate::playback::PlaybackSession;
use crate::standings::{StandingsEntry, project_standings};
use crate::timeline::{RaceData, RaceDataCache, fetch_timeline};

/// Load state of the selected race. "No data yet" (`Loaded` with empty
/// results/laps) and "load failed" (`Unavailable`) are deliberately
/// distinct states for the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplayData {
    /// No race selected yet
    NotLoaded,
    /// Acquisition in flight
    Loading,
    /// Acquisition failed; no partial data is ever kept
    Unavailable,
    Loaded(RaceData),
}

/// Fetch the fixed result set and the reconciled timeline for one round.
/// The two fetches are independent and run concurrently; either failure
/// makes the round unavailable.
pub async fn load_race_data(
    source: &dyn RaceDataSource,
    round: u32,
) -> Result<RaceData, ChicaneError> {
    let (results, timeline) = futures::try_join!(
        async {
            source
                .results(round)
                .await
                .map_err(|e| ChicaneError::unavailable(round, e))
        },
        fetch_timeline(source, round),
    )?;
    Ok(RaceData { results, timeline })
}

struct DataSlot {
    /// Bumped on every selection; an acquisition holding an older value
    /// is stale and must not install its outcome.
    generation: u64,
    state: ReplayData,
}

/// Owner of one active replay: the data source, the round cache, the
/// playback session, and at most one in-flight acquisition.
///
/// Selecting a race cancels the previous acquisition and resets the
/// playback clock immediately; stale results never overwrite a newer
/// selection.
pub struct ReplaySession {
    source: Arc<dyn RaceDataSource>,
    cache: Arc<Mutex<RaceDataCache>>,
    slot: Arc<Mutex<DataSlot>>,
    playback: PlaybackSession,
    inflight: Option<JoinHandle<()>>,
    selected: Option<u32>,
}

impl ReplaySession {
    pub fn new(source: Arc<dyn RaceDataSource>) -> Self {
        Self::with_cache(source, RaceDataCache::new())
    }

    pub fn with_cache(source: Arc<dyn RaceDataSource>, cache: RaceDataCache) -> Self {
        Self {
            source,
            cache: Arc::new(Mutex::new(cache)),
            slot: Arc::new(Mutex::new(DataSlot {
                generation: 0,
                state: ReplayData::NotLoaded,
            })),
            playback: PlaybackSession::new(),
            inflight: None,
            selected: None,
        }
    }

    /// The season calendar, for picking a round. A plain passthrough.
    pub async fn calendar(&self) -> Result<Vec<Race>, ChicaneError> {
        self.source.calendar().await
    }

    /// Switch the replay to `round`.
    ///
    /// Any in-flight acquisition for the previous selection is cancelled
    /// and the playback clock resets before the new data is even
    /// requested. Fresh cached rounds install synchronously; everything
    /// else loads in a background task.
    pub fn select_race(&mut self, round: u32) {
        if let Some(handle) = self.inflight.take() {
            debug!("cancelling in-flight acquisition for a newer selection");
            handle.abort();
        }
        self.selected = Some(round);

        let generation = {
            let mut slot = lock(&self.slot);
            slot.generation += 1;
            self.playback.set_total_laps(0);
            if let Some(data) = lock(&self.cache).get(round).cloned() {
                debug!("round {} served from cache", round);
                self.playback.set_total_laps(data.total_laps());
                slot.state = ReplayData::Loaded(data);
                return;
            }
            slot.state = ReplayData::Loading;
            slot.generation
        };

        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);
        let slot = Arc::clone(&self.slot);
        let playback = self.playback.clone();
        self.inflight = Some(tokio::spawn(async move {
            let outcome = load_race_data(source.as_ref(), round).await;
            let mut slot = lock(&slot);
            if slot.generation != generation {
                debug!("discarding stale acquisition for round {}", round);
                return;
            }
            match outcome {
                Ok(data) => {
                    lock(&cache).store(round, data.clone());
                    playback.set_total_laps(data.total_laps());
                    slot.state = ReplayData::Loaded(data);
                }
                Err(e) => {
                    error!("acquisition for round {} failed: {}", round, e);
                    slot.state = ReplayData::Unavailable;
                }
            }
        }));
    }

    pub fn selected_round(&self) -> Option<u32> {
        self.selected
    }

    pub fn data(&self) -> ReplayData {
        lock(&self.slot).state.clone()
    }

    /// The playback operation set plus its snapshot stream. The session
    /// keeps ownership; callers clone what they need.
    pub fn playback(&self) -> &PlaybackSession {
        &self.playback
    }

    /// Leaderboard at the current playback pointer. Empty until a race
    /// is loaded.
    pub fn standings(&self) -> Vec<StandingsEntry> {
        match &lock(&self.slot).state {
            ReplayData::Loaded(data) => project_standings(
                &data.results,
                &data.timeline,
                self.playback.state().current_lap,
            ),
            _ => Vec::new(),
        }
    }

    /// Wait for the in-flight acquisition, if any, to settle. A cancelled
    /// acquisition settles without installing anything.
    pub async fn wait_ready(&mut self) {
        if let Some(handle) = self.inflight.take() {
            let _ = handle.await;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
