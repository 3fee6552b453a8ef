// Cache-first access to schedule, roster and lap telemetry

use log::{info, warn};

use super::api::{F1Api, OpenF1Client};
use super::cache::CacheStore;
use super::{DriverEntry, RaceEvent, SessionType, TelemetrySeries};
use crate::errors::ApexviewError;

/// One selected driver, ready for the replay: roster entry plus the
/// telemetry of that driver's fastest lap.
#[derive(Clone, Debug)]
pub struct CarData {
    pub entry: DriverEntry,
    pub series: TelemetrySeries,
}

/// Everything the replay screen needs for one session.
#[derive(Clone, Debug)]
pub struct LoadedSession {
    /// The overall fastest lap of the session; its path draws the track.
    pub reference: TelemetrySeries,
    /// The selected drivers that loaded successfully.
    pub cars: Vec<CarData>,
}

/// Front door to the F1 data: an API client behind a disk cache.
///
/// Every operation checks the cache first and stores what it fetched.
/// Failures to write the cache are logged but never fail the operation.
pub struct SessionSource<A: F1Api> {
    api: A,
    cache: CacheStore,
}

impl SessionSource<OpenF1Client> {
    /// Source backed by the live OpenF1 API, cached under `cache_root`
    /// (or the platform cache directory when `None`).
    pub fn new(cache_root: Option<std::path::PathBuf>) -> Result<Self, ApexviewError> {
        let cache = match cache_root {
            Some(root) => CacheStore::new(root)?,
            None => CacheStore::new_default()?,
        };
        Ok(Self::with_api(OpenF1Client::default(), cache))
    }
}

impl<A: F1Api> SessionSource<A> {
    pub fn with_api(api: A, cache: CacheStore) -> Self {
        Self { api, cache }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// The calendar of a year, ordered by round.
    pub fn schedule(&self, year: i32) -> Result<Vec<RaceEvent>, ApexviewError> {
        let key = format!("schedule-{}", year);
        if let Some(events) = self.cache.load_json::<Vec<RaceEvent>>(&key) {
            return Ok(events);
        }
        let events = self.api.schedule(year)?;
        self.store_json(&key, &events);
        Ok(events)
    }

    /// The roster of one session of an event.
    pub fn driver_list(
        &self,
        year: i32,
        event: &RaceEvent,
        session_type: SessionType,
    ) -> Result<Vec<DriverEntry>, ApexviewError> {
        let session_key = self.session_key(year, event, session_type)?;
        let key = format!("drivers-{}", session_key);
        if let Some(drivers) = self.cache.load_json::<Vec<DriverEntry>>(&key) {
            return Ok(drivers);
        }
        let drivers = self.api.drivers(session_key)?;
        self.store_json(&key, &drivers);
        Ok(drivers)
    }

    /// Load the reference lap plus one lap per selected driver.
    ///
    /// A driver whose telemetry cannot be loaded is logged and skipped;
    /// the replay runs with whoever is left. Only an empty roster is an
    /// error.
    pub fn load_session(
        &self,
        year: i32,
        event: &RaceEvent,
        session_type: SessionType,
        driver_codes: &[String],
    ) -> Result<LoadedSession, ApexviewError> {
        if driver_codes.is_empty() {
            return Err(ApexviewError::InvalidUserInput {
                field: "drivers".to_string(),
                reason: "select at least one driver".to_string(),
            });
        }

        let session_key = self.session_key(year, event, session_type)?;
        let roster = self.driver_list(year, event, session_type)?;
        let reference = self.reference_series(session_key)?;

        let mut cars = Vec::with_capacity(driver_codes.len());
        for code in driver_codes {
            match self.driver_series(session_key, &roster, code) {
                Ok(car) => cars.push(car),
                Err(e) => warn!("Skipping driver {}: {}", code, e),
            }
        }
        if cars.is_empty() {
            return Err(ApexviewError::EmptyRoster);
        }
        info!(
            "Loaded session {}: {} of {} drivers",
            session_key,
            cars.len(),
            driver_codes.len()
        );
        Ok(LoadedSession { reference, cars })
    }

    fn session_key(
        &self,
        year: i32,
        event: &RaceEvent,
        session_type: SessionType,
    ) -> Result<u64, ApexviewError> {
        let key = format!(
            "session-{}-{}-{}",
            year,
            event.name,
            session_type.short_code()
        );
        if let Some(session_key) = self.cache.load_json::<u64>(&key) {
            return Ok(session_key);
        }
        let session_key = self.api.session_key(year, event, session_type)?;
        self.store_json(&key, &session_key);
        Ok(session_key)
    }

    fn reference_series(&self, session_key: u64) -> Result<TelemetrySeries, ApexviewError> {
        let key = format!("series-{}-reference", session_key);
        if let Some(series) = self.cache.load_series(&key) {
            return Ok(series);
        }
        let window = self.api.session_fastest_lap(session_key)?;
        let series = self.api.lap_series(session_key, &window)?;
        self.store_series(&key, &series);
        Ok(series)
    }

    fn driver_series(
        &self,
        session_key: u64,
        roster: &[DriverEntry],
        code: &str,
    ) -> Result<CarData, ApexviewError> {
        let entry = roster
            .iter()
            .find(|d| d.code.eq_ignore_ascii_case(code))
            .ok_or_else(|| ApexviewError::UnknownDriver {
                code: code.to_string(),
            })?
            .clone();

        let key = format!("series-{}-{}", session_key, entry.code);
        if let Some(series) = self.cache.load_series(&key) {
            return Ok(CarData { entry, series });
        }
        let window = self.api.driver_fastest_lap(session_key, &entry)?;
        let series = self.api.lap_series(session_key, &window)?;
        self.store_series(&key, &series);
        Ok(CarData { entry, series })
    }

    fn store_json<T: serde::Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.save_json(key, value) {
            warn!("Could not cache {}: {}", key, e);
        }
    }

    fn store_series(&self, key: &str, series: &TelemetrySeries) {
        if let Err(e) = self.cache.save_series(key, series) {
            warn!("Could not cache {}: {}", key, e);
        }
    }
}
