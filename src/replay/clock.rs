// Simulation clock driving the replay

/// Lowest allowed speed multiplier; also the keyboard step size.
pub const MIN_SPEED_MULTIPLIER: f64 = 0.5;
pub const SPEED_MULTIPLIER_STEP: f64 = 0.5;

/// Monotonically increasing simulation time.
///
/// `elapsed` never wraps here; each car wraps it against its own lap
/// duration when resolving a position.
#[derive(Clone, Copy, Debug)]
pub struct PlaybackClock {
    elapsed: f64,
    speed_multiplier: f64,
    paused: bool,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self {
            elapsed: 0.,
            speed_multiplier: 1.,
            paused: false,
        }
    }
}

impl PlaybackClock {
    /// Advance by one frame of `frame_delta` wall-clock seconds.
    pub fn tick(&mut self, frame_delta: f64) {
        if !self.paused {
            self.elapsed += frame_delta * self.speed_multiplier;
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn faster(&mut self) {
        self.speed_multiplier += SPEED_MULTIPLIER_STEP;
    }

    pub fn slower(&mut self) {
        self.speed_multiplier =
            (self.speed_multiplier - SPEED_MULTIPLIER_STEP).max(MIN_SPEED_MULTIPLIER);
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
