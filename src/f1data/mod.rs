pub mod api;
pub mod cache;
pub mod source;

pub use api::{F1Api, LapWindow, OpenF1Client};
pub use cache::CacheStore;
pub use source::{CarData, LoadedSession, SessionSource};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ApexviewError;

/// Session types the picker offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    Race,
    Qualifying,
    SprintQualifying,
    Practice1,
}

impl SessionType {
    pub const ALL: [SessionType; 4] = [
        SessionType::Race,
        SessionType::Qualifying,
        SessionType::SprintQualifying,
        SessionType::Practice1,
    ];

    /// The `session_name` value the OpenF1 API uses for this session.
    pub fn api_name(&self) -> &'static str {
        match self {
            SessionType::Race => "Race",
            SessionType::Qualifying => "Qualifying",
            SessionType::SprintQualifying => "Sprint Qualifying",
            SessionType::Practice1 => "Practice 1",
        }
    }

    /// Short code used on the command line and in cache keys.
    pub fn short_code(&self) -> &'static str {
        match self {
            SessionType::Race => "R",
            SessionType::Qualifying => "Q",
            SessionType::SprintQualifying => "SQ",
            SessionType::Practice1 => "FP1",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

impl FromStr for SessionType {
    type Err = ApexviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "R" | "RACE" => Ok(SessionType::Race),
            "Q" | "QUALIFYING" => Ok(SessionType::Qualifying),
            "SQ" | "SPRINT QUALIFYING" => Ok(SessionType::SprintQualifying),
            "FP1" | "PRACTICE 1" => Ok(SessionType::Practice1),
            other => Err(ApexviewError::InvalidUserInput {
                field: "session".to_string(),
                reason: format!("unknown session type '{}', expected R, Q, SQ or FP1", other),
            }),
        }
    }
}

/// One entry of a year's calendar, as shown in the race picker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RaceEvent {
    /// Round number within the season, starting at 1
    pub round: u32,
    /// OpenF1 meeting key, used to look up the session
    pub meeting_key: u64,
    /// Event name, e.g. "São Paulo Grand Prix"
    pub name: String,
    /// Short circuit name, e.g. "Interlagos"
    pub circuit: String,
    /// Start of the event weekend
    pub date_start: DateTime<Utc>,
}

impl fmt::Display for RaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.round, self.name)
    }
}

/// One driver of a session's roster.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverEntry {
    pub number: u32,
    /// Three-letter code, e.g. "VER"
    pub code: String,
    pub full_name: String,
    pub team_name: String,
    /// Team color as a hex string without the leading '#', when the API has one
    pub team_color: Option<String>,
}

/// A single telemetry sample of one driver's lap.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Seconds since the start of the lap
    pub time_s: f64,
    /// World X coordinate in meters
    pub x: f64,
    /// World Y coordinate in meters
    pub y: f64,
    /// Speed in km/h
    pub speed_kmh: f64,
    /// Selected gear, 0 for neutral
    pub gear: u8,
}

/// A time-ordered sequence of samples covering one lap.
///
/// The constructor is the only way to build a series and enforces the two
/// invariants the resolver relies on: at least one sample, and timestamps
/// that never go backwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TelemetrySeries {
    samples: Vec<TelemetrySample>,
}

impl TelemetrySeries {
    pub fn new(samples: Vec<TelemetrySample>) -> Result<Self, ApexviewError> {
        if samples.is_empty() {
            return Err(ApexviewError::EmptySeries);
        }
        for (index, pair) in samples.windows(2).enumerate() {
            if pair[1].time_s < pair[0].time_s {
                return Err(ApexviewError::UnorderedSeries { index: index + 1 });
            }
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Lap duration: the timestamp of the last sample.
    pub fn duration(&self) -> f64 {
        self.samples[self.samples.len() - 1].time_s
    }
}
