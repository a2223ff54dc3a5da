mod controller;
mod error;
mod session;
mod types;

pub use controller::{SharedController, TrackingController, FASTEST_INTERVAL, MAX_INTERVAL};
pub use error::TrackingError;
pub use types::{DutyCommand, DutyOutcome, TrackingMode, TrackingStatus};
