// Timer task ownership for the playback clock.
//
// The advancement timer is owned by the session itself: every operation
// that can change cadence (speed, bound, playing flag) tears the task
// down and restarts it, so there is never more than one live ticker per
// session and its cadence always matches the current speed.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use log::debug;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::{PlaybackClock, PlaybackState};

struct Inner {
    clock: PlaybackClock,
    /// Bumped on every operation; a ticker that observes a newer epoch
    /// than its own has been superseded and stops itself.
    epoch: u64,
    ticker: Option<JoinHandle<()>>,
}

/// A [`PlaybackClock`] bound to a timer task, publishing a
/// [`PlaybackState`] snapshot to watchers on every change.
///
/// Cloning shares the same playback session. Operations are synchronous;
/// the ones that start playback spawn the ticker onto the ambient tokio
/// runtime and must be called from within one.
#[derive(Clone)]
pub struct PlaybackSession {
    inner: Arc<Mutex<Inner>>,
    snapshots: Arc<watch::Sender<PlaybackState>>,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self::with_total_laps(0)
    }

    pub fn with_total_laps(total_laps: u32) -> Self {
        let clock = PlaybackClock::new(total_laps);
        let (snapshots, _) = watch::channel(clock.state());
        Self {
            inner: Arc::new(Mutex::new(Inner {
                clock,
                epoch: 0,
                ticker: None,
            })),
            snapshots: Arc::new(snapshots),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.lock().clock.state()
    }

    /// Snapshot stream for observers (progress bars, standings refresh).
    /// The receiver always holds the latest state.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.snapshots.subscribe()
    }

    pub fn play(&self) {
        self.apply(PlaybackClock::play);
    }

    pub fn pause(&self) {
        self.apply(PlaybackClock::pause);
    }

    pub fn toggle_play(&self) {
        self.apply(PlaybackClock::toggle_play);
    }

    pub fn reset(&self) {
        self.apply(PlaybackClock::reset);
    }

    pub fn seek(&self, target_lap: i64) {
        self.apply(|clock| clock.seek(target_lap));
    }

    pub fn cycle_speed(&self) {
        self.apply(PlaybackClock::cycle_speed);
    }

    pub fn set_total_laps(&self, total_laps: u32) {
        self.apply(|clock| clock.set_total_laps(total_laps));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, op: impl FnOnce(&mut PlaybackClock)) {
        let mut inner = self.lock();
        op(&mut inner.clock);
        inner.epoch += 1;
        let state = inner.clock.state();
        self.snapshots.send_replace(state);
        self.resync_ticker(&mut inner, state);
    }

    fn resync_ticker(&self, inner: &mut Inner, state: PlaybackState) {
        if let Some(handle) = inner.ticker.take() {
            handle.abort();
        }
        if !state.playing {
            return;
        }
        debug!(
            "starting ticker at {}x from lap {}/{}",
            state.speed.multiplier(),
            state.current_lap,
            state.total_laps
        );
        let epoch = inner.epoch;
        let shared = Arc::downgrade(&self.inner);
        let snapshots = Arc::clone(&self.snapshots);
        inner.ticker = Some(tokio::spawn(advance_on_cadence(
            shared, snapshots, state, epoch,
        )));
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

async fn advance_on_cadence(
    shared: Weak<Mutex<Inner>>,
    snapshots: Arc<watch::Sender<PlaybackState>>,
    state: PlaybackState,
    epoch: u64,
) {
    let mut interval = time::interval(state.speed.tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // the first tick of a tokio interval completes immediately
    interval.tick().await;
    loop {
        interval.tick().await;
        let Some(inner) = shared.upgrade() else {
            // session dropped mid-replay
            break;
        };
        let snapshot = {
            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            if inner.epoch != epoch {
                // a newer ticker owns the cadence now
                break;
            }
            inner.clock.tick();
            inner.clock.state()
        };
        snapshots.send_replace(snapshot);
        if !snapshot.playing {
            break;
        }
    }
}
