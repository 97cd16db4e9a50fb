// VCR-style playback over a reconciled timeline.
//
// `PlaybackClock` is the pure state machine; `PlaybackSession` (ticker.rs)
// wraps it with the timer task that drives advancement on a wall-clock
// cadence.

pub(crate) mod ticker;

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

pub use ticker::PlaybackSession;

/// Enumerated speed multipliers, cycled in order by
/// [`PlaybackClock::cycle_speed`] and wrapping from the last back to the
/// first.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackSpeed {
    /// 0.01x, one lap per 100 s
    Crawl,
    /// 0.15x
    Slow,
    /// 0.25x
    Quarter,
    /// 0.5x
    Half,
    /// 1x, one lap per second
    Real,
    /// 2x
    Double,
    /// 3x
    Triple,
}

impl PlaybackSpeed {
    pub fn multiplier(self) -> f64 {
        match self {
            PlaybackSpeed::Crawl => 0.01,
            PlaybackSpeed::Slow => 0.15,
            PlaybackSpeed::Quarter => 0.25,
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::Real => 1.0,
            PlaybackSpeed::Double => 2.0,
            PlaybackSpeed::Triple => 3.0,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PlaybackSpeed::Crawl => PlaybackSpeed::Slow,
            PlaybackSpeed::Slow => PlaybackSpeed::Quarter,
            PlaybackSpeed::Quarter => PlaybackSpeed::Half,
            PlaybackSpeed::Half => PlaybackSpeed::Real,
            PlaybackSpeed::Real => PlaybackSpeed::Double,
            PlaybackSpeed::Double => PlaybackSpeed::Triple,
            PlaybackSpeed::Triple => PlaybackSpeed::Crawl,
        }
    }

    /// Advancement cadence: `1000 / multiplier` milliseconds per lap.
    pub fn tick_interval(self) -> Duration {
        Duration::from_secs_f64(1.0 / self.multiplier())
    }
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        PlaybackSpeed::Crawl
    }
}

/// Read-only snapshot of the playback machine, handed to observers on
/// every change.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PlaybackState {
    /// Current lap pointer; 0 = not started, `total_laps` = finished
    pub current_lap: u32,
    pub total_laps: u32,
    pub playing: bool,
    pub speed: PlaybackSpeed,
}

impl PlaybackState {
    /// Finished means the pointer sits at the last lap of a non-empty
    /// race. An empty race is "no data", never a completed replay.
    pub fn finished(&self) -> bool {
        self.total_laps > 0 && self.current_lap == self.total_laps
    }

    /// Replay progress in percent, e.g. for a progress bar. 0 when there
    /// is no lap data.
    pub fn progress(&self) -> f64 {
        if self.total_laps == 0 {
            0.0
        } else {
            f64::from(self.current_lap) / f64::from(self.total_laps) * 100.0
        }
    }
}

/// Finite-state machine over [`PlaybackState`].
///
/// All transitions are synchronous and side-effect free; the invariant
/// `0 <= current_lap <= total_laps` holds after every operation.
pub struct PlaybackClock {
    state: PlaybackState,
}

impl PlaybackClock {
    pub fn new(total_laps: u32) -> Self {
        Self {
            state: PlaybackState {
                current_lap: 0,
                total_laps,
                playing: false,
                speed: PlaybackSpeed::default(),
            },
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Start advancing. A no-op when there is nothing to play
    /// (`total_laps == 0`) or the replay already finished; idempotent
    /// while playing.
    pub fn play(&mut self) {
        if self.state.total_laps == 0 || self.state.finished() {
            return;
        }
        self.state.playing = true;
    }

    /// Stop advancing; idempotent.
    pub fn pause(&mut self) {
        self.state.playing = false;
    }

    /// Flip between playing and paused, honoring the same guards as
    /// [`PlaybackClock::play`].
    pub fn toggle_play(&mut self) {
        if self.state.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Back to lap 0, stopped. Always permitted.
    pub fn reset(&mut self) {
        self.state.playing = false;
        self.state.current_lap = 0;
    }

    /// Jump the pointer, clamping into `[0, total_laps]`. The playing
    /// flag is untouched: seeking while playing keeps playing.
    pub fn seek(&mut self, target_lap: i64) {
        self.state.current_lap = target_lap.clamp(0, i64::from(self.state.total_laps)) as u32;
    }

    pub fn cycle_speed(&mut self) {
        self.state.speed = self.state.speed.next();
    }

    /// Rebind to a different race. Stale progress never carries across
    /// races, so this unconditionally resets to lap 0, stopped. The
    /// selected speed is a user preference and survives.
    pub fn set_total_laps(&mut self, total_laps: u32) {
        self.state.total_laps = total_laps;
        self.reset();
    }

    /// One cadence step while playing: advance by exactly one lap,
    /// auto-pausing on reaching `total_laps`. The pointer never exceeds
    /// the bound.
    pub fn tick(&mut self) {
        if !self.state.playing {
            return;
        }
        if self.state.current_lap < self.state.total_laps {
            self.state.current_lap += 1;
        }
        if self.state.current_lap >= self.state.total_laps {
            self.state.playing = false;
            debug!("replay finished at lap {}", self.state.current_lap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_requires_laps() {
        let mut clock = PlaybackClock::new(0);
        clock.play();
        assert!(!clock.state().playing);
        clock.toggle_play();
        assert!(!clock.state().playing);
    }

    #[test]
    fn test_play_from_finished_is_a_noop() {
        let mut clock = PlaybackClock::new(5);
        clock.seek(5);
        assert!(clock.state().finished());
        clock.play();
        assert!(!clock.state().playing);

        // seeking backward leaves Finished and re-arms play
        clock.seek(4);
        clock.play();
        assert!(clock.state().playing);
    }

    #[test]
    fn test_seek_clamps_out_of_range_targets() {
        let mut clock = PlaybackClock::new(58);
        clock.seek(-5);
        assert_eq!(clock.state().current_lap, 0);
        clock.seek(9999);
        assert_eq!(clock.state().current_lap, 58);
        assert!(clock.state().finished());
    }

    #[test]
    fn test_seek_keeps_playing_flag() {
        let mut clock = PlaybackClock::new(58);
        clock.play();
        clock.seek(30);
        assert!(clock.state().playing);
        assert_eq!(clock.state().current_lap, 30);
    }

    #[test]
    fn test_auto_pause_at_finish() {
        let mut clock = PlaybackClock::new(3);
        clock.play();
        clock.tick();
        clock.tick();
        clock.tick();
        let state = clock.state();
        assert_eq!(state.current_lap, 3);
        assert!(!state.playing);
        assert!(state.finished());

        // a fourth tick is a no-op
        clock.tick();
        assert_eq!(clock.state(), state);
    }

    #[test]
    fn test_speed_cycle_closes_after_seven_steps() {
        let mut clock = PlaybackClock::new(10);
        assert_eq!(clock.state().speed.multiplier(), 0.01);
        let mut seen = Vec::new();
        for _ in 0..7 {
            clock.cycle_speed();
            seen.push(clock.state().speed.multiplier());
        }
        assert_eq!(seen, vec![0.15, 0.25, 0.5, 1.0, 2.0, 3.0, 0.01]);
    }

    #[test]
    fn test_rebinding_total_laps_resets_progress() {
        let mut clock = PlaybackClock::new(58);
        clock.play();
        clock.seek(20);
        clock.cycle_speed();
        clock.set_total_laps(71);
        let state = clock.state();
        assert_eq!(state.current_lap, 0);
        assert!(!state.playing);
        assert_eq!(state.total_laps, 71);
        // speed preference survives the rebind
        assert_eq!(state.speed, PlaybackSpeed::Slow);
    }

    #[test]
    fn test_reset_stops_and_rewinds() {
        let mut clock = PlaybackClock::new(58);
        clock.play();
        clock.seek(40);
        clock.reset();
        assert_eq!(clock.state().current_lap, 0);
        assert!(!clock.state().playing);
    }

    #[test]
    fn test_progress_is_clamped_for_empty_race() {
        let clock = PlaybackClock::new(0);
        assert_eq!(clock.state().progress(), 0.0);
        assert!(!clock.state().finished());

        let mut clock = PlaybackClock::new(4);
        clock.seek(1);
        assert_eq!(clock.state().progress(), 25.0);
    }

    #[test]
    fn test_tick_interval_follows_speed() {
        assert_eq!(
            PlaybackSpeed::Real.tick_interval(),
            Duration::from_millis(1000)
        );
        assert_eq!(
            PlaybackSpeed::Crawl.tick_interval(),
            Duration::from_millis(100_000)
        );
    }

    #[test]
    fn test_pointer_stays_in_bounds_under_any_operation() {
        let mut clock = PlaybackClock::new(3);
        let in_bounds =
            |clock: &PlaybackClock| clock.state().current_lap <= clock.state().total_laps;
        clock.play();
        for _ in 0..10 {
            clock.tick();
            assert!(in_bounds(&clock));
        }
        clock.seek(i64::MAX);
        assert!(in_bounds(&clock));
        clock.seek(i64::MIN);
        assert!(in_bounds(&clock));
    }
}
