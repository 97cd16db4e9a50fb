// Error types for chicane

use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum ChicaneError {
    // Errors talking to the upstream timing API
    #[snafu(display("Request to the timing API failed"))]
    ApiRequest { source: reqwest::Error },
    #[snafu(display("Could not decode timing API response"))]
    ApiDecode { source: serde_json::Error },

    // Reconciliation failure. A single failed page poisons the whole
    // timeline: a partial timeline would corrupt standings and playback
    // bounds, so none is ever surfaced.
    #[snafu(display("Timing data for round {round} is unavailable"))]
    DataUnavailable {
        round: u32,
        source: Box<ChicaneError>,
    },
}

impl ChicaneError {
    /// Wrap an acquisition failure into the round-level unavailable state.
    pub(crate) fn unavailable(round: u32, cause: ChicaneError) -> Self {
        ChicaneError::DataUnavailable {
            round,
            source: Box::new(cause),
        }
    }
}
