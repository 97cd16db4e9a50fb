// Round-keyed cache of fetched race data.
//
// The replay session issues one acquisition per race selection; selecting
// the same round again within the freshness window reuses the reconciled
// data instead of refetching. Eviction beyond staleness is the caller's
// concern.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::debug;

use crate::model::{RaceResult, Timeline};

/// Historical sessions do not change; an hour of freshness only guards
/// against late result corrections.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Everything the playback clock and the standings projector need for one
/// race: the fixed result set plus the reconciled timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct RaceData {
    pub results: Vec<RaceResult>,
    pub timeline: Timeline,
}

impl RaceData {
    /// Upper bound for the playback pointer.
    pub fn total_laps(&self) -> u32 {
        self.timeline.len() as u32
    }

    /// Whether there is anything to replay. Both the results and the lap
    /// data can legitimately be empty for a round not yet run; that is
    /// "no data", not a failure.
    pub fn has_data(&self) -> bool {
        !self.results.is_empty() && !self.timeline.is_empty()
    }
}

struct CacheEntry {
    stored_at: Instant,
    data: RaceData,
}

/// Content-addressed cache: round number to completed [`RaceData`], with a
/// configurable freshness TTL.
pub struct RaceDataCache {
    ttl: Duration,
    entries: HashMap<u32, CacheEntry>,
}

impl RaceDataCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Fresh data for a round, or `None` when absent or stale.
    pub fn get(&self, round: u32) -> Option<&RaceData> {
        let entry = self.entries.get(&round)?;
        if entry.stored_at.elapsed() < self.ttl {
            Some(&entry.data)
        } else {
            None
        }
    }

    pub fn store(&mut self, round: u32, data: RaceData) {
        debug!(
            "caching round {}: {} results, {} laps",
            round,
            data.results.len(),
            data.timeline.len()
        );
        self.entries.insert(round, CacheEntry {
            stored_at: Instant::now(),
            data,
        });
    }

    pub fn remove(&mut self, round: u32) {
        self.entries.remove(&round);
    }
}

impl Default for RaceDataCache {
    fn default() -> Self {
        Self::new()
    }
}
