use serde::{Deserialize, Serialize};

use crate::sensor::LocationSample;

/// Field of the worker document that holds the latest position.
pub const CURRENT_LOCATION_FIELD: &str = "currentLocation";

/// Remote representation of a fix. Replaces the previous value on every publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLocationRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
    pub speed_mps: f64,
    pub bearing_degrees: f64,
    pub captured_at_millis: i64,
    pub is_on_duty: bool,
}

impl RemoteLocationRecord {
    pub fn from_sample(sample: &LocationSample, is_on_duty: bool) -> Self {
        RemoteLocationRecord {
            latitude: sample.latitude,
            longitude: sample.longitude,
            accuracy_meters: sample.accuracy_meters,
            speed_mps: sample.speed_mps,
            bearing_degrees: sample.bearing_degrees,
            captured_at_millis: sample.captured_at_millis,
            is_on_duty,
        }
    }
}
