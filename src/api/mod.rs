// Upstream timing API client.
//
// The remote source speaks the Ergast JSON shape: every payload is wrapped
// in an `MRData` envelope, numbers arrive as strings, and lap timings are
// paginated by row with a `total` count on each page.

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::errors::ChicaneError;
use crate::model::{Lap, Race, RaceResult};

pub const DEFAULT_BASE_URL: &str = "https://api.jolpi.ca/ergast/f1/2025";

/// One page of lap-timing rows plus the total row count the API reports
/// for the whole race.
#[derive(Clone, Debug, PartialEq)]
pub struct LapsPage {
    pub total: usize,
    pub laps: Vec<Lap>,
}

/// The narrow contract with the remote timing source. The reconciler and
/// the replay session only ever talk through this seam, which is also what
/// tests mock.
#[async_trait]
pub trait RaceDataSource: Send + Sync {
    /// The season's race calendar. A plain list fetch, no merge logic.
    async fn calendar(&self) -> Result<Vec<Race>, ChicaneError>;

    /// Final classifications for one round; empty when the round has no
    /// published results yet.
    async fn results(&self, round: u32) -> Result<Vec<RaceResult>, ChicaneError>;

    /// One page of lap timings for one round.
    async fn lap_page(&self, round: u32, limit: usize, offset: usize)
    -> Result<LapsPage, ChicaneError>;
}

/// HTTP implementation of [`RaceDataSource`] against a Jolpica/Ergast
/// style endpoint.
pub struct ErgastClient {
    client: reqwest::Client,
    base_url: String,
}

impl ErgastClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at a different deployment (or a local fixture
    /// server). The base URL carries the season, e.g. `.../ergast/f1/2025`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ChicaneError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let body = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ChicaneError::ApiRequest { source: e })?
            .text()
            .await
            .map_err(|e| ChicaneError::ApiRequest { source: e })?;
        serde_json::from_str(&body).map_err(|e| ChicaneError::ApiDecode { source: e })
    }
}

impl Default for ErgastClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RaceDataSource for ErgastClient {
    async fn calendar(&self) -> Result<Vec<Race>, ChicaneError> {
        let response: CalendarResponse = self.get_json(".json").await?;
        Ok(response.mr_data.race_table.races)
    }

    async fn results(&self, round: u32) -> Result<Vec<RaceResult>, ChicaneError> {
        let response: ResultsResponse = self.get_json(&format!("/{}/results.json", round)).await?;
        Ok(response.into_results())
    }

    async fn lap_page(
        &self,
        round: u32,
        limit: usize,
        offset: usize,
    ) -> Result<LapsPage, ChicaneError> {
        let response: LapsResponse = self
            .get_json(&format!("/{}/laps.json?limit={}&offset={}", round, limit, offset))
            .await?;
        Ok(response.into_page())
    }
}

// Wire envelopes. Unknown fields are ignored, and the race entries inside
// results/laps responses are only read for their payload arrays.

#[derive(Deserialize)]
struct CalendarResponse {
    #[serde(rename = "MRData")]
    mr_data: CalendarData,
}

#[derive(Deserialize)]
struct CalendarData {
    #[serde(rename = "RaceTable")]
    race_table: CalendarTable,
}

#[derive(Deserialize)]
struct CalendarTable {
    #[serde(rename = "Races", default)]
    races: Vec<Race>,
}

#[derive(Deserialize)]
struct ResultsResponse {
    #[serde(rename = "MRData")]
    mr_data: ResultsData,
}

impl ResultsResponse {
    fn into_results(self) -> Vec<RaceResult> {
        self.mr_data
            .race_table
            .races
            .into_iter()
            .next()
            .map(|race| race.results)
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct ResultsData {
    #[serde(rename = "RaceTable")]
    race_table: ResultsTable,
}

#[derive(Deserialize)]
struct ResultsTable {
    #[serde(rename = "Races", default)]
    races: Vec<ResultsRace>,
}

#[derive(Deserialize)]
struct ResultsRace {
    #[serde(rename = "Results", default)]
    results: Vec<RaceResult>,
}

#[derive(Deserialize)]
struct LapsResponse {
    #[serde(rename = "MRData")]
    mr_data: LapsData,
}

impl LapsResponse {
    fn into_page(self) -> LapsPage {
        // lenient total: a missing or garbled count degrades to a
        // single-page fetch instead of failing the decode
        let total = self.mr_data.total.parse().unwrap_or(0);
        let laps = self
            .mr_data
            .race_table
            .races
            .into_iter()
            .next()
            .map(|race| race.laps)
            .unwrap_or_default();
        LapsPage { total, laps }
    }
}

#[derive(Deserialize)]
struct LapsData {
    #[serde(default)]
    total: String,
    #[serde(rename = "RaceTable")]
    race_table: LapsTable,
}

#[derive(Deserialize)]
struct LapsTable {
    #[serde(rename = "Races", default)]
    races: Vec<LapsRace>,
}

#[derive(Deserialize)]
struct LapsRace {
    #[serde(rename = "Laps", default)]
    laps: Vec<Lap>,
}
