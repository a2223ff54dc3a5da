use thiserror::Error;

use crate::sensor::SensorError;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),
}

impl From<SensorError> for TrackingError {
    fn from(err: SensorError) -> Self {
        match err {
            SensorError::PermissionDenied => TrackingError::PermissionDenied,
            SensorError::Unavailable(reason) => TrackingError::SensorUnavailable(reason),
        }
    }
}
