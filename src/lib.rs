// Library interface for apexview
// This allows integration tests to access internal modules

pub mod errors;
pub mod f1data;
pub mod replay;
pub mod ui;

// Re-export commonly used types
pub use errors::ApexviewError;
pub use f1data::{
    CacheStore, DriverEntry, F1Api, LapWindow, LoadedSession, OpenF1Client, RaceEvent,
    SessionSource, SessionType, TelemetrySample, TelemetrySeries,
};
pub use replay::{Car, PlaybackClock, TrackTransform};
pub use ui::ApexviewApp;
