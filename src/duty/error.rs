use thiserror::Error;

#[derive(Debug, Error)]
pub enum DutyStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("malformed duty state: {0}")]
    Malformed(&'static str),
}
