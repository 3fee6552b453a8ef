// Per-car position resolution against the playback clock

use crate::f1data::{TelemetrySample, TelemetrySeries};

use super::TrackTransform;

/// One car of the replay: identity, lap telemetry, and the screen
/// position resolved on the latest tick.
#[derive(Clone, Debug)]
pub struct Car {
    pub code: String,
    pub team_name: String,
    /// Team color as RGB
    pub rgb: [u8; 3],
    series: TelemetrySeries,
    pub screen_position: (f64, f64),
}

impl Car {
    pub fn new(code: String, team_name: String, rgb: [u8; 3], series: TelemetrySeries) -> Self {
        Self {
            code,
            team_name,
            rgb,
            series,
            screen_position: (0., 0.),
        }
    }

    pub fn series(&self) -> &TelemetrySeries {
        &self.series
    }

    pub fn duration(&self) -> f64 {
        self.series.duration()
    }

    /// Index of the sample displayed at playback time `t`.
    ///
    /// The lap replays indefinitely: `t` wraps against this car's own
    /// duration, independent of any other car. Within the lap, the sample
    /// is the first one at or after the wrapped time (lower bound, no
    /// interpolation), clamped to the last sample.
    pub fn sample_index_at(&self, t: f64) -> usize {
        let duration = self.series.duration();
        let lap_time = if duration > 0. { t % duration } else { 0. };
        let index = self
            .series
            .samples()
            .partition_point(|s| s.time_s < lap_time);
        index.min(self.series.len() - 1)
    }

    pub fn sample_at(&self, t: f64) -> &TelemetrySample {
        &self.series.samples()[self.sample_index_at(t)]
    }

    /// Screen position at playback time `t` through the shared transform.
    pub fn position_at(&self, t: f64, transform: &TrackTransform) -> (f64, f64) {
        let sample = self.sample_at(t);
        transform.project(sample.x, sample.y)
    }

    /// Resolve and remember the position for this tick.
    pub fn advance(&mut self, t: f64, transform: &TrackTransform) {
        self.screen_position = self.position_at(t, transform);
    }
}
