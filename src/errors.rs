// Error types for apexview

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum ApexviewError {
    // Errors for the OpenF1 client
    #[snafu(display("Error calling the OpenF1 API"))]
    ApiRequestError { source: reqwest::Error },
    #[snafu(display("OpenF1 API returned status {status} for {url}"))]
    ApiStatusError { status: u16, url: String },
    #[snafu(display("Error decoding OpenF1 API response"))]
    ApiDecodeError { source: reqwest::Error },
    #[snafu(display("No {session_type} session found for {year} {event}"))]
    SessionNotFound {
        year: i32,
        event: String,
        session_type: String,
    },
    #[snafu(display("No completed laps in session {session_key}"))]
    NoLapsAvailable { session_key: u64 },
    #[snafu(display("No location telemetry for driver {driver}"))]
    EmptyDriverTelemetry { driver: String },
    #[snafu(display("Driver {code} did not take part in this session"))]
    UnknownDriver { code: String },
    #[snafu(display("No event named {name} in the {year} calendar"))]
    UnknownEvent { year: i32, name: String },

    // Cache management errors
    #[snafu(display("Could not find a local cache directory for telemetry data"))]
    NoCacheDir,
    #[snafu(display("Error reading or writing the telemetry cache"))]
    CacheIOError { source: io::Error },
    #[snafu(display("Error serializing cache entry"))]
    CacheSerializeError { source: serde_json::Error },

    // Telemetry series validation errors
    #[snafu(display("Telemetry series has no samples"))]
    EmptySeries,
    #[snafu(display("Telemetry timestamps go backwards at sample {index}"))]
    UnorderedSeries { index: usize },

    // Track geometry errors
    #[snafu(display("Track bounding box is degenerate ({width}m x {height}m)"))]
    DegenerateTrackBounds { width: f64, height: f64 },

    // Roster errors
    #[snafu(display("None of the selected drivers could be loaded"))]
    EmptyRoster,

    // User input validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },
}
