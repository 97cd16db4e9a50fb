// Library interface for chicane
// This allows integration tests to access internal modules

pub mod api;
pub mod errors;
pub mod model;
pub mod playback;
pub mod replay;
pub mod standings;
pub mod timeline;

// Re-export commonly used types
pub use api::{DEFAULT_BASE_URL, ErgastClient, LapsPage, RaceDataSource};
pub use errors::ChicaneError;
pub use model::{
    Circuit, Constructor, Driver, FastestLap, Lap, LapTiming, Location, Race, RaceResult,
    Timeline, parse_lap_time,
};
pub use playback::{PlaybackClock, PlaybackSession, PlaybackSpeed, PlaybackState};
pub use replay::{ReplayData, ReplaySession, load_race_data};
pub use standings::{LEADER_GAP, StandingsEntry, project_standings};
pub use timeline::{PAGE_SIZE, RaceData, RaceDataCache, fetch_timeline, merge_pages};
