pub mod car;
pub mod clock;
pub mod transform;

pub use car::Car;
pub use clock::{MIN_SPEED_MULTIPLIER, PlaybackClock, SPEED_MULTIPLIER_STEP};
pub use transform::TrackTransform;
