// World-to-screen mapping shared by the track outline and every car

use crate::errors::ApexviewError;
use crate::f1data::TelemetrySeries;

/// Affine map from world coordinates (meters) to drawing-surface pixels.
///
/// Built once per session from the reference lap and shared read-only by
/// all cars. The scale is uniform on both axes so the track keeps its
/// aspect ratio; the offset centers the scaled bounding box in the
/// drawing area.
#[derive(Clone, Copy, Debug)]
pub struct TrackTransform {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    min_x: f64,
    min_y: f64,
}

impl TrackTransform {
    /// Fit the reference lap into a `draw_width` x `draw_height` area,
    /// keeping `margin` pixels of total breathing room on each axis.
    ///
    /// A bounding box with zero width or zero height has no defined
    /// scale; that is a configuration error, not an `inf` to propagate.
    pub fn fit(
        series: &TelemetrySeries,
        draw_width: f64,
        draw_height: f64,
        margin: f64,
    ) -> Result<Self, ApexviewError> {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for sample in series.samples() {
            min_x = min_x.min(sample.x);
            max_x = max_x.max(sample.x);
            min_y = min_y.min(sample.y);
            max_y = max_y.max(sample.y);
        }

        let width = max_x - min_x;
        let height = max_y - min_y;
        if width <= 0. || height <= 0. {
            return Err(ApexviewError::DegenerateTrackBounds { width, height });
        }

        let scale = ((draw_width - margin) / width).min((draw_height - margin) / height);
        Ok(Self {
            scale,
            offset_x: (draw_width - width * scale) / 2.,
            offset_y: (draw_height - height * scale) / 2.,
            min_x,
            min_y,
        })
    }

    /// Map one world coordinate to screen space.
    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.min_x) * self.scale + self.offset_x,
            (y - self.min_y) * self.scale + self.offset_y,
        )
    }

    /// Map every sample of a series, in order. The order defines the
    /// visual path of the track outline.
    pub fn polyline(&self, series: &TelemetrySeries) -> Vec<(f64, f64)> {
        series
            .samples()
            .iter()
            .map(|s| self.project(s.x, s.y))
            .collect()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}
