use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("fine location permission not granted")]
    PermissionDenied,
    #[error("sensor unavailable: {0}")]
    Unavailable(String),
}
