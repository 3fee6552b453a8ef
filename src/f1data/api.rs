// Blocking client for the public OpenF1 REST API

use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use log::info;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{DriverEntry, RaceEvent, SessionType, TelemetrySample, TelemetrySeries};
use crate::errors::ApexviewError;

const DEFAULT_BASE_URL: &str = "https://api.openf1.org/v1";

// The API stores timestamps without a zone; everything is UTC.
const DATE_FILTER_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// The slice of a session covered by one lap: who drove it, when it
/// started, and how long it took.
#[derive(Clone, Debug)]
pub struct LapWindow {
    pub driver_number: u32,
    pub start: DateTime<Utc>,
    pub duration_s: f64,
}

/// Data-access contract for the visualization. `OpenF1Client` is the real
/// implementation; tests substitute a stub.
pub trait F1Api {
    /// All race weekends of a year, ordered by date.
    fn schedule(&self, year: i32) -> Result<Vec<RaceEvent>, ApexviewError>;

    /// Resolve the session key for one session of an event.
    fn session_key(
        &self,
        year: i32,
        event: &RaceEvent,
        session_type: SessionType,
    ) -> Result<u64, ApexviewError>;

    /// The roster of a session.
    fn drivers(&self, session_key: u64) -> Result<Vec<DriverEntry>, ApexviewError>;

    /// The fastest completed lap of the whole session.
    fn session_fastest_lap(&self, session_key: u64) -> Result<LapWindow, ApexviewError>;

    /// One driver's fastest completed lap.
    fn driver_fastest_lap(
        &self,
        session_key: u64,
        driver: &DriverEntry,
    ) -> Result<LapWindow, ApexviewError>;

    /// The telemetry samples covering a lap window, re-based to seconds
    /// since the start of the lap.
    fn lap_series(
        &self,
        session_key: u64,
        window: &LapWindow,
    ) -> Result<TelemetrySeries, ApexviewError>;
}

// Raw API payloads. Fields the API occasionally leaves null are Options.

#[derive(Debug, Deserialize)]
struct ApiMeeting {
    meeting_key: u64,
    meeting_name: String,
    circuit_short_name: String,
    date_start: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ApiSession {
    session_key: u64,
}

#[derive(Debug, Deserialize)]
struct ApiDriver {
    driver_number: u32,
    name_acronym: String,
    full_name: Option<String>,
    team_name: Option<String>,
    team_colour: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiLap {
    driver_number: u32,
    date_start: Option<DateTime<Utc>>,
    lap_duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    date: DateTime<Utc>,
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct ApiCarData {
    date: DateTime<Utc>,
    speed: Option<f64>,
    n_gear: Option<u8>,
}

pub struct OpenF1Client {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl Default for OpenF1Client {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl OpenF1Client {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApexviewError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| ApexviewError::ApiRequestError { source: e })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApexviewError::ApiStatusError {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        response
            .json::<Vec<T>>()
            .map_err(|e| ApexviewError::ApiDecodeError { source: e })
    }
}

impl F1Api for OpenF1Client {
    fn schedule(&self, year: i32) -> Result<Vec<RaceEvent>, ApexviewError> {
        let meetings: Vec<ApiMeeting> =
            self.get_list("meetings", &[("year", year.to_string())])?;
        info!("Fetched {} meetings for {}", meetings.len(), year);
        Ok(events_from_meetings(meetings))
    }

    fn session_key(
        &self,
        year: i32,
        event: &RaceEvent,
        session_type: SessionType,
    ) -> Result<u64, ApexviewError> {
        let sessions: Vec<ApiSession> = self.get_list(
            "sessions",
            &[
                ("meeting_key", event.meeting_key.to_string()),
                ("session_name", session_type.api_name().to_string()),
            ],
        )?;
        sessions
            .first()
            .map(|s| s.session_key)
            .ok_or(ApexviewError::SessionNotFound {
                year,
                event: event.name.clone(),
                session_type: session_type.api_name().to_string(),
            })
    }

    fn drivers(&self, session_key: u64) -> Result<Vec<DriverEntry>, ApexviewError> {
        let drivers: Vec<ApiDriver> =
            self.get_list("drivers", &[("session_key", session_key.to_string())])?;
        Ok(drivers
            .into_iter()
            .unique_by(|d| d.driver_number)
            .map(|d| DriverEntry {
                number: d.driver_number,
                full_name: d.full_name.unwrap_or_else(|| d.name_acronym.clone()),
                code: d.name_acronym,
                team_name: d.team_name.unwrap_or_else(|| "Unknown".to_string()),
                team_color: d.team_colour,
            })
            .collect())
    }

    fn session_fastest_lap(&self, session_key: u64) -> Result<LapWindow, ApexviewError> {
        let laps: Vec<ApiLap> =
            self.get_list("laps", &[("session_key", session_key.to_string())])?;
        fastest_of(&laps).ok_or(ApexviewError::NoLapsAvailable { session_key })
    }

    fn driver_fastest_lap(
        &self,
        session_key: u64,
        driver: &DriverEntry,
    ) -> Result<LapWindow, ApexviewError> {
        let laps: Vec<ApiLap> = self.get_list(
            "laps",
            &[
                ("session_key", session_key.to_string()),
                ("driver_number", driver.number.to_string()),
            ],
        )?;
        fastest_of(&laps).ok_or(ApexviewError::EmptyDriverTelemetry {
            driver: driver.code.clone(),
        })
    }

    fn lap_series(
        &self,
        session_key: u64,
        window: &LapWindow,
    ) -> Result<TelemetrySeries, ApexviewError> {
        let end = window.start + Duration::milliseconds((window.duration_s * 1000.) as i64);
        let range_query = [
            ("session_key", session_key.to_string()),
            ("driver_number", window.driver_number.to_string()),
            ("date>", window.start.format(DATE_FILTER_FORMAT).to_string()),
            ("date<", end.format(DATE_FILTER_FORMAT).to_string()),
        ];

        let mut locations: Vec<ApiLocation> = self.get_list("location", &range_query)?;
        let mut car_data: Vec<ApiCarData> = self.get_list("car_data", &range_query)?;
        locations.sort_by_key(|l| l.date);
        car_data.sort_by_key(|c| c.date);
        info!(
            "Fetched {} location and {} car samples for driver {}",
            locations.len(),
            car_data.len(),
            window.driver_number
        );

        TelemetrySeries::new(merge_streams(&locations, &car_data, window.start)).map_err(|_| {
            ApexviewError::EmptyDriverTelemetry {
                driver: window.driver_number.to_string(),
            }
        })
    }
}

fn events_from_meetings(mut meetings: Vec<ApiMeeting>) -> Vec<RaceEvent> {
    meetings.sort_by_key(|m| m.date_start);
    meetings
        .into_iter()
        .enumerate()
        .map(|(index, m)| RaceEvent {
            round: index as u32 + 1,
            meeting_key: m.meeting_key,
            name: m.meeting_name,
            circuit: m.circuit_short_name,
            date_start: m.date_start,
        })
        .collect()
}

/// Pick the completed lap with the smallest duration. Laps without a
/// duration (in/out laps, red flags) or without a start date are ignored.
fn fastest_of(laps: &[ApiLap]) -> Option<LapWindow> {
    laps.iter()
        .filter_map(|lap| match (lap.date_start, lap.lap_duration) {
            (Some(start), Some(duration_s)) => Some(LapWindow {
                driver_number: lap.driver_number,
                start,
                duration_s,
            }),
            _ => None,
        })
        .min_by(|a, b| a.duration_s.total_cmp(&b.duration_s))
}

/// Join the position and car streams. The two tick at different instants,
/// so each location sample takes the most recent car sample at or before
/// its own timestamp; before the first car sample, speed and gear are 0.
fn merge_streams(
    locations: &[ApiLocation],
    car_data: &[ApiCarData],
    lap_start: DateTime<Utc>,
) -> Vec<TelemetrySample> {
    let mut samples = Vec::with_capacity(locations.len());
    let mut current: Option<&ApiCarData> = None;
    let mut next = 0;

    for location in locations {
        while next < car_data.len() && car_data[next].date <= location.date {
            current = Some(&car_data[next]);
            next += 1;
        }
        let time_s = ((location.date - lap_start).num_milliseconds() as f64 / 1000.).max(0.);
        samples.push(TelemetrySample {
            time_s,
            x: location.x,
            y: location.y,
            speed_kmh: current.and_then(|c| c.speed).unwrap_or(0.),
            gear: current.and_then(|c| c.n_gear).unwrap_or(0),
        });
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(seconds: i64, millis: u32) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, millis * 1_000_000).unwrap()
    }

    fn location(seconds: i64, millis: u32, x: f64, y: f64) -> ApiLocation {
        ApiLocation {
            date: date(seconds, millis),
            x,
            y,
        }
    }

    fn car(seconds: i64, millis: u32, speed: f64, gear: u8) -> ApiCarData {
        ApiCarData {
            date: date(seconds, millis),
            speed: Some(speed),
            n_gear: Some(gear),
        }
    }

    #[test]
    fn test_merge_takes_latest_car_sample_at_or_before() {
        let locations = vec![
            location(100, 0, 0., 0.),
            location(100, 500, 10., 0.),
            location(101, 0, 20., 5.),
        ];
        let car_data = vec![car(100, 200, 250., 7), car(100, 900, 180., 6)];

        let samples = merge_streams(&locations, &car_data, date(100, 0));
        assert_eq!(samples.len(), 3);
        // no car sample yet at the first location tick
        assert_eq!(samples[0].speed_kmh, 0.);
        assert_eq!(samples[0].gear, 0);
        // 100.2s sample is the latest at-or-before 100.5s
        assert_eq!(samples[1].speed_kmh, 250.);
        assert_eq!(samples[1].gear, 7);
        // 100.9s sample wins at 101.0s
        assert_eq!(samples[2].speed_kmh, 180.);
        assert_eq!(samples[2].gear, 6);
    }

    #[test]
    fn test_merge_rebases_times_to_lap_start() {
        let locations = vec![location(100, 250, 0., 0.), location(102, 0, 1., 1.)];
        let samples = merge_streams(&locations, &[], date(100, 0));
        assert_eq!(samples[0].time_s, 0.25);
        assert_eq!(samples[1].time_s, 2.0);
    }

    #[test]
    fn test_merge_clamps_early_samples_to_zero() {
        // A location sample timestamped just before the lap start line
        let locations = vec![location(99, 900, 0., 0.)];
        let samples = merge_streams(&locations, &[], date(100, 0));
        assert_eq!(samples[0].time_s, 0.);
    }

    #[test]
    fn test_fastest_of_ignores_incomplete_laps() {
        let laps = vec![
            ApiLap {
                driver_number: 1,
                date_start: Some(date(100, 0)),
                lap_duration: None,
            },
            ApiLap {
                driver_number: 44,
                date_start: Some(date(200, 0)),
                lap_duration: Some(71.35),
            },
            ApiLap {
                driver_number: 1,
                date_start: Some(date(300, 0)),
                lap_duration: Some(70.42),
            },
            ApiLap {
                driver_number: 16,
                date_start: None,
                lap_duration: Some(69.0),
            },
        ];

        let fastest = fastest_of(&laps).unwrap();
        assert_eq!(fastest.driver_number, 1);
        assert_eq!(fastest.duration_s, 70.42);
    }

    #[test]
    fn test_fastest_of_empty_when_nothing_completed() {
        assert!(fastest_of(&[]).is_none());
        let laps = vec![ApiLap {
            driver_number: 1,
            date_start: Some(date(100, 0)),
            lap_duration: None,
        }];
        assert!(fastest_of(&laps).is_none());
    }

    #[test]
    fn test_events_are_numbered_by_date() {
        let meetings = vec![
            ApiMeeting {
                meeting_key: 2,
                meeting_name: "São Paulo Grand Prix".to_string(),
                circuit_short_name: "Interlagos".to_string(),
                date_start: date(2_000_000, 0),
            },
            ApiMeeting {
                meeting_key: 1,
                meeting_name: "Bahrain Grand Prix".to_string(),
                circuit_short_name: "Sakhir".to_string(),
                date_start: date(1_000_000, 0),
            },
        ];

        let events = events_from_meetings(meetings);
        assert_eq!(events[0].round, 1);
        assert_eq!(events[0].name, "Bahrain Grand Prix");
        assert_eq!(events[1].round, 2);
        assert_eq!(events[1].meeting_key, 2);
    }

    #[test]
    fn test_api_payload_decoding() {
        let meeting: ApiMeeting = serde_json::from_str(
            r#"{"meeting_key":1219,"circuit_key":14,"circuit_short_name":"Interlagos",
                "meeting_name":"São Paulo Grand Prix","location":"São Paulo",
                "country_name":"Brazil","date_start":"2023-11-03T14:30:00+00:00","year":2023}"#,
        )
        .unwrap();
        assert_eq!(meeting.meeting_key, 1219);

        let loc: ApiLocation = serde_json::from_str(
            r#"{"x":-1362,"y":1211,"z":100,"driver_number":1,"date":"2023-11-05T17:03:24.023000+00:00",
                "session_key":9199,"meeting_key":1219}"#,
        )
        .unwrap();
        assert_eq!(loc.x, -1362.);

        let car: ApiCarData = serde_json::from_str(
            r#"{"date":"2023-11-05T17:03:24.279000+00:00","driver_number":1,"speed":301,
                "n_gear":8,"rpm":11342,"throttle":100,"brake":0,"drs":12,
                "session_key":9199,"meeting_key":1219}"#,
        )
        .unwrap();
        assert_eq!(car.speed, Some(301.));
        assert_eq!(car.n_gear, Some(8));

        let driver: ApiDriver = serde_json::from_str(
            r#"{"driver_number":1,"name_acronym":"VER","full_name":"Max VERSTAPPEN",
                "broadcast_name":"M VERSTAPPEN","team_name":"Red Bull Racing",
                "team_colour":"3671C6","session_key":9199,"meeting_key":1219}"#,
        )
        .unwrap();
        assert_eq!(driver.team_colour.as_deref(), Some("3671C6"));
    }
}
