use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One position fix. Never mutated after the sensor produces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
    pub speed_mps: f64,
    pub bearing_degrees: f64,
    pub captured_at_millis: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SamplingPriority {
    HighAccuracy,
}

/// Cadence window handed to the sensor: fixes no faster than `min_interval`
/// and no slower than `max_interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingRequest {
    pub min_interval: Duration,
    pub max_interval: Duration,
    pub priority: SamplingPriority,
}

impl SamplingRequest {
    pub fn clamp(&self, interval: Duration) -> Duration {
        interval.clamp(self.min_interval, self.max_interval)
    }
}

/// Handle to a live sensor registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionRef(Uuid);

impl SubscriptionRef {
    pub fn generate() -> Self {
        SubscriptionRef(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
