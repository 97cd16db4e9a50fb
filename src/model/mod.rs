// Core data structures for race replay reconstruction

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

/// One round of a season's calendar. Immutable once fetched; keyed by round.
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Race {
    pub season: String,
    #[serde_as(as = "DisplayFromStr")]
    pub round: u32,
    #[serde(rename = "raceName")]
    pub race_name: String,
    #[serde(rename = "Circuit")]
    pub circuit: Circuit,
    /// Scheduled date, `YYYY-MM-DD`
    pub date: String,
    /// Scheduled start time (UTC), absent for some historical rounds
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Circuit {
    #[serde(rename = "circuitId")]
    pub circuit_id: String,
    #[serde(rename = "circuitName")]
    pub circuit_name: String,
    #[serde(rename = "Location")]
    pub location: Location,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Location {
    pub lat: String,
    pub long: String,
    pub locality: String,
    pub country: String,
}

/// Driver reference data. The upstream omits `code` for some historical
/// entries, so it defaults to empty rather than failing the decode.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Driver {
    #[serde(rename = "driverId")]
    pub driver_id: String,
    #[serde(default)]
    pub code: String,
    #[serde(rename = "givenName", default)]
    pub given_name: String,
    #[serde(rename = "familyName", default)]
    pub family_name: String,
    #[serde(default)]
    pub nationality: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Constructor {
    #[serde(rename = "constructorId")]
    pub constructor_id: String,
    pub name: String,
    #[serde(default)]
    pub nationality: String,
}

/// Final classification of one driver in one race. The set of results for
/// a race is fixed once fetched.
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RaceResult {
    #[serde_as(as = "DisplayFromStr")]
    pub position: u32,
    #[serde(rename = "Driver")]
    pub driver: Driver,
    #[serde(rename = "Constructor")]
    pub constructor: Constructor,
    /// Starting grid position, 0 = pit-lane start
    #[serde_as(as = "DisplayFromStr")]
    pub grid: u32,
    /// Laps completed
    #[serde_as(as = "DisplayFromStr")]
    pub laps: u32,
    pub status: String,
    #[serde(rename = "FastestLap", default)]
    pub fastest_lap: Option<FastestLap>,
}

/// Fastest-lap classification. `rank` stays text: the projector only ever
/// compares it against the literal `"1"`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FastestLap {
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub lap: String,
    #[serde(rename = "Time", default)]
    pub time: Option<FastestLapTime>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FastestLapTime {
    pub time: String,
}

/// One driver's timing row for one lap.
///
/// `time` is retained exactly as the API sent it (`"M:SS.mmm"` or
/// `"SS.mmm"`); a malformed value must never abort acquisition, so numeric
/// conversion happens lazily through [`LapTiming::time_seconds`].
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LapTiming {
    #[serde(rename = "driverId")]
    pub driver_id: String,
    /// Running position at the end of this lap
    #[serde_as(as = "DisplayFromStr")]
    pub position: u32,
    pub time: String,
}

impl LapTiming {
    /// Lazy numeric conversion of the timing text. `None` for malformed
    /// input; callers that chart or do arithmetic skip those rows.
    pub fn time_seconds(&self) -> Option<f64> {
        parse_lap_time(&self.time)
    }
}

/// One lap of the race: the timing rows of every driver still running.
/// Drivers who retired stop appearing in later laps.
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Lap {
    #[serde_as(as = "DisplayFromStr")]
    pub number: u32,
    #[serde(rename = "Timings", default)]
    pub timings: Vec<LapTiming>,
}

/// The reconciled, gap-free, lap-number-ordered timing dataset for one
/// race. Produced only by the reconciler; read-only for every consumer.
pub type Timeline = Vec<Lap>;

/// Parse `"M:SS.mmm"` or `"SS.mmm"` timing text into seconds.
///
/// Returns `None` for anything else; the raw text is kept regardless.
pub fn parse_lap_time(text: &str) -> Option<f64> {
    let mut parts = text.split(':');
    let first = parts.next()?;
    match parts.next() {
        None => parse_seconds(first),
        Some(seconds) => {
            // reject a second ':' (no lap runs over an hour)
            if parts.next().is_some() {
                return None;
            }
            let minutes: u32 = first.parse().ok()?;
            Some(f64::from(minutes) * 60.0 + parse_seconds(seconds)?)
        }
    }
}

fn parse_seconds(text: &str) -> Option<f64> {
    let value: f64 = text.parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}
