// Integration tests for the replay pipeline
//
// Covers the observable guarantees of the system:
// 1. Every projected track point stays inside the drawing area
// 2. Position resolution is deterministic, monotonic and wraps per lap
// 3. The playback clock respects the speed multiplier floor
// 4. The session source is cache-first and skips failing drivers

use std::cell::Cell;

use chrono::{DateTime, Utc};
use proptest::prelude::*;

use apexview::errors::ApexviewError;
use apexview::f1data::{
    CacheStore, DriverEntry, F1Api, LapWindow, RaceEvent, SessionSource, SessionType,
    TelemetrySample, TelemetrySeries,
};
use apexview::replay::{Car, MIN_SPEED_MULTIPLIER, PlaybackClock, TrackTransform};

fn sample(time_s: f64, x: f64, y: f64) -> TelemetrySample {
    TelemetrySample {
        time_s,
        x,
        y,
        speed_kmh: 250.,
        gear: 6,
    }
}

fn series_from(points: Vec<(f64, f64, f64)>) -> TelemetrySeries {
    TelemetrySeries::new(
        points
            .into_iter()
            .map(|(time_s, x, y)| sample(time_s, x, y))
            .collect(),
    )
    .unwrap()
}

// A square 10m x 10m lap of 4 seconds
fn square_lap() -> TelemetrySeries {
    series_from(vec![
        (0., 0., 0.),
        (1., 10., 0.),
        (2., 10., 10.),
        (3., 0., 10.),
        (4., 0., 0.),
    ])
}

proptest! {
    #[test]
    fn prop_track_points_stay_inside_the_draw_area(
        points in prop::collection::vec((0.01f64..2., -5000f64..5000., -5000f64..5000.), 2..120),
        draw_width in 300f64..2000.,
        draw_height in 300f64..2000.,
        margin in 0f64..100.,
    ) {
        let mut time_s = 0.;
        let samples: Vec<TelemetrySample> = points
            .iter()
            .map(|&(dt, x, y)| {
                time_s += dt;
                sample(time_s, x, y)
            })
            .collect();
        let series = TelemetrySeries::new(samples).unwrap();

        match TrackTransform::fit(&series, draw_width, draw_height, margin) {
            Ok(transform) => {
                for (x, y) in transform.polyline(&series) {
                    prop_assert!(x >= -1e-9 && x <= draw_width + 1e-9);
                    prop_assert!(y >= -1e-9 && y <= draw_height + 1e-9);
                }
            }
            Err(ApexviewError::DegenerateTrackBounds { .. }) => {
                // legal outcome for a flat point cloud
            }
            Err(e) => prop_assert!(false, "unexpected error: {}", e),
        }
    }

    #[test]
    fn prop_resolution_is_monotonic_within_a_lap(
        deltas in prop::collection::vec(0.05f64..1., 2..80),
        fractions in prop::collection::vec(0f64..1., 2..40),
    ) {
        let mut time_s = 0.;
        let samples: Vec<TelemetrySample> = deltas
            .iter()
            .map(|&dt| {
                time_s += dt;
                sample(time_s, time_s, 0.)
            })
            .collect();
        let series = TelemetrySeries::new(samples).unwrap();
        let duration = series.duration();
        let car = Car::new("VER".to_string(), "Red Bull Racing".to_string(), [1, 2, 3], series);

        let mut times: Vec<f64> = fractions.iter().map(|f| f * duration * 0.999).collect();
        times.sort_by(f64::total_cmp);

        let mut previous = 0;
        for t in times {
            let index = car.sample_index_at(t);
            prop_assert!(index >= previous, "index went backwards at t={}", t);
            previous = index;
        }
    }

    #[test]
    fn prop_resolution_wraps_per_lap(epsilon in 0.001f64..3.9, laps in 1u32..5) {
        let car = Car::new(
            "HAM".to_string(),
            "Mercedes".to_string(),
            [1, 2, 3],
            square_lap(),
        );
        let wrapped = car.duration() * laps as f64 + epsilon;
        prop_assert_eq!(car.sample_index_at(wrapped), car.sample_index_at(epsilon));
    }

    #[test]
    fn prop_resolution_is_idempotent(t in 0f64..100.) {
        let car = Car::new(
            "LEC".to_string(),
            "Ferrari".to_string(),
            [1, 2, 3],
            square_lap(),
        );
        let series = square_lap();
        let transform = TrackTransform::fit(&series, 800., 600., 100.).unwrap();
        prop_assert_eq!(car.position_at(t, &transform), car.position_at(t, &transform));
    }

    #[test]
    fn prop_speed_multiplier_floor_holds_under_any_input(ops in prop::collection::vec(0u8..4, 0..200)) {
        let mut clock = PlaybackClock::default();
        let mut last_elapsed = 0.;
        for op in ops {
            match op {
                0 => clock.tick(1. / 60.),
                1 => clock.faster(),
                2 => clock.slower(),
                _ => clock.toggle_pause(),
            }
            prop_assert!(clock.speed_multiplier() >= MIN_SPEED_MULTIPLIER);
            prop_assert!(clock.elapsed() >= last_elapsed);
            last_elapsed = clock.elapsed();
        }
    }
}

// ---- session source behavior against a stubbed API ----

const SESSION_KEY: u64 = 9199;

fn stub_event() -> RaceEvent {
    RaceEvent {
        round: 20,
        meeting_key: 1219,
        name: "São Paulo Grand Prix".to_string(),
        circuit: "Interlagos".to_string(),
        date_start: epoch(),
    }
}

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_699_200_000, 0).unwrap()
}

fn stub_roster() -> Vec<DriverEntry> {
    vec![
        DriverEntry {
            number: 1,
            code: "VER".to_string(),
            full_name: "Max VERSTAPPEN".to_string(),
            team_name: "Red Bull Racing".to_string(),
            team_color: Some("3671C6".to_string()),
        },
        DriverEntry {
            number: 44,
            code: "HAM".to_string(),
            full_name: "Lewis HAMILTON".to_string(),
            team_name: "Mercedes".to_string(),
            team_color: Some("6CD3BF".to_string()),
        },
    ]
}

struct StubApi {
    schedule_calls: Cell<usize>,
    series_calls: Cell<usize>,
    failing_driver: Option<u32>,
}

impl StubApi {
    fn new(failing_driver: Option<u32>) -> Self {
        Self {
            schedule_calls: Cell::new(0),
            series_calls: Cell::new(0),
            failing_driver,
        }
    }
}

impl F1Api for StubApi {
    fn schedule(&self, _year: i32) -> Result<Vec<RaceEvent>, ApexviewError> {
        self.schedule_calls.set(self.schedule_calls.get() + 1);
        Ok(vec![stub_event()])
    }

    fn session_key(
        &self,
        _year: i32,
        _event: &RaceEvent,
        _session_type: SessionType,
    ) -> Result<u64, ApexviewError> {
        Ok(SESSION_KEY)
    }

    fn drivers(&self, _session_key: u64) -> Result<Vec<DriverEntry>, ApexviewError> {
        Ok(stub_roster())
    }

    fn session_fastest_lap(&self, _session_key: u64) -> Result<LapWindow, ApexviewError> {
        Ok(LapWindow {
            driver_number: 1,
            start: epoch(),
            duration_s: 4.,
        })
    }

    fn driver_fastest_lap(
        &self,
        _session_key: u64,
        driver: &DriverEntry,
    ) -> Result<LapWindow, ApexviewError> {
        if self.failing_driver == Some(driver.number) {
            return Err(ApexviewError::EmptyDriverTelemetry {
                driver: driver.code.clone(),
            });
        }
        Ok(LapWindow {
            driver_number: driver.number,
            start: epoch(),
            duration_s: 4.,
        })
    }

    fn lap_series(
        &self,
        _session_key: u64,
        _window: &LapWindow,
    ) -> Result<TelemetrySeries, ApexviewError> {
        self.series_calls.set(self.series_calls.get() + 1);
        Ok(square_lap())
    }
}

fn stub_source(failing_driver: Option<u32>) -> (SessionSource<StubApi>, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().unwrap();
    let cache = CacheStore::new(dir.path().to_path_buf()).unwrap();
    (
        SessionSource::with_api(StubApi::new(failing_driver), cache),
        dir,
    )
}

#[test]
fn test_load_session_returns_reference_and_cars() {
    let (source, _dir) = stub_source(None);
    let loaded = source
        .load_session(
            2023,
            &stub_event(),
            SessionType::Race,
            &["VER".to_string(), "HAM".to_string()],
        )
        .unwrap();

    assert_eq!(loaded.reference.duration(), 4.);
    assert_eq!(loaded.cars.len(), 2);
}

#[test]
fn test_failing_driver_is_skipped_not_fatal() {
    let (source, _dir) = stub_source(Some(44));
    let loaded = source
        .load_session(
            2023,
            &stub_event(),
            SessionType::Race,
            &["VER".to_string(), "HAM".to_string()],
        )
        .unwrap();

    assert_eq!(loaded.cars.len(), 1);
    assert_eq!(loaded.cars[0].entry.code, "VER");
}

#[test]
fn test_unknown_driver_is_skipped_not_fatal() {
    let (source, _dir) = stub_source(None);
    let loaded = source
        .load_session(
            2023,
            &stub_event(),
            SessionType::Race,
            &["VER".to_string(), "XXX".to_string()],
        )
        .unwrap();

    assert_eq!(loaded.cars.len(), 1);
}

#[test]
fn test_empty_roster_after_skips_is_an_error() {
    let (source, _dir) = stub_source(Some(1));
    let result = source.load_session(
        2023,
        &stub_event(),
        SessionType::Race,
        &["VER".to_string()],
    );
    assert!(matches!(result, Err(ApexviewError::EmptyRoster)));
}

#[test]
fn test_no_selection_is_rejected_before_any_fetch() {
    let (source, _dir) = stub_source(None);
    let result = source.load_session(2023, &stub_event(), SessionType::Race, &[]);
    assert!(matches!(
        result,
        Err(ApexviewError::InvalidUserInput { .. })
    ));
}

#[test]
fn test_second_load_is_served_from_the_cache() {
    let (source, _dir) = stub_source(None);
    let codes = vec!["VER".to_string(), "HAM".to_string()];

    source.schedule(2023).unwrap();
    source.schedule(2023).unwrap();
    source
        .load_session(2023, &stub_event(), SessionType::Race, &codes)
        .unwrap();
    let calls_after_first = source_calls(&source);
    source
        .load_session(2023, &stub_event(), SessionType::Race, &codes)
        .unwrap();

    assert_eq!(source_calls(&source).0, 1, "schedule refetched");
    assert_eq!(
        source_calls(&source).1,
        calls_after_first.1,
        "telemetry refetched despite cache"
    );
}

fn source_calls(source: &SessionSource<StubApi>) -> (usize, usize) {
    let api = source.api();
    (api.schedule_calls.get(), api.series_calls.get())
}
