// Leaderboard projection at an arbitrary point of the replay.

use itertools::Itertools;
use serde::Serialize;

use crate::model::{Constructor, Driver, RaceResult, Timeline};

/// Gap text of the first classified entry.
pub const LEADER_GAP: &str = "LEADER";

/// Grid slot assumed for a timing row with no matching race result.
pub const DEFAULT_GRID: u32 = 20;

/// One row of the projected leaderboard. Derived data: recomputed on
/// every lap-pointer change, never stored.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct StandingsEntry {
    /// Running position as reported by the lap timing (authoritative),
    /// or grid order before the start
    pub rank: u32,
    pub driver: Driver,
    pub constructor: Constructor,
    pub grid: u32,
    /// `"LEADER"` for the leading entry, otherwise the timing's gap text
    /// verbatim; empty before the start
    pub gap: String,
    /// Grid position minus current rank; positive = places gained
    pub position_delta: i32,
    pub fastest_lap: bool,
}

/// Project the ranked leaderboard at `current_lap`.
///
/// Lap 0 (or an empty timeline) shows the starting grid. Later laps rank
/// by each timing row's reported position; a pointer past the end of the
/// timeline projects the last lap. Pure function over already-resolved
/// data, cheap enough to recompute on every pointer change.
pub fn project_standings(
    results: &[RaceResult],
    timeline: &Timeline,
    current_lap: u32,
) -> Vec<StandingsEntry> {
    if current_lap == 0 || timeline.is_empty() {
        return grid_standings(results);
    }
    let lap_index = (current_lap as usize).min(timeline.len()) - 1;
    let lap = &timeline[lap_index];

    let fastest_driver = results
        .iter()
        .find(|r| r.fastest_lap.as_ref().is_some_and(|f| f.rank == "1"))
        .map(|r| r.driver.driver_id.as_str());

    let mut entries: Vec<StandingsEntry> = lap
        .timings
        .iter()
        .map(|timing| {
            let result = results
                .iter()
                .find(|r| r.driver.driver_id == timing.driver_id);
            let grid = result.map_or(DEFAULT_GRID, |r| r.grid);
            StandingsEntry {
                rank: timing.position,
                driver: result.map_or_else(
                    || placeholder_driver(&timing.driver_id),
                    |r| r.driver.clone(),
                ),
                constructor: result.map_or_else(placeholder_constructor, |r| r.constructor.clone()),
                grid,
                gap: timing.time.clone(),
                position_delta: grid as i32 - timing.position as i32,
                fastest_lap: fastest_driver == Some(timing.driver_id.as_str()),
            }
        })
        .collect();

    entries.sort_by_key(|entry| entry.rank);
    if let Some(leader) = entries.first_mut() {
        leader.gap = LEADER_GAP.to_string();
    }
    entries
}

/// Pre-race display: results ordered by starting grid, no gaps, no
/// deltas, no fastest lap.
fn grid_standings(results: &[RaceResult]) -> Vec<StandingsEntry> {
    results
        .iter()
        .sorted_by_key(|r| r.grid)
        .enumerate()
        .map(|(i, result)| StandingsEntry {
            rank: i as u32 + 1,
            driver: result.driver.clone(),
            constructor: result.constructor.clone(),
            grid: result.grid,
            gap: String::new(),
            position_delta: 0,
            fastest_lap: false,
        })
        .collect()
}

/// A timing row can reference a driver absent from the results (late
/// entry corrections, sprint-only substitutes). Missing identity degrades
/// to a placeholder instead of aborting the projection.
fn placeholder_driver(driver_id: &str) -> Driver {
    Driver {
        driver_id: driver_id.to_string(),
        code: driver_id.chars().take(3).collect::<String>().to_uppercase(),
        given_name: String::new(),
        family_name: driver_id.to_string(),
        nationality: String::new(),
    }
}

fn placeholder_constructor() -> Constructor {
    Constructor {
        constructor_id: "unknown".to_string(),
        name: "Unknown".to_string(),
        nationality: String::new(),
    }
}
