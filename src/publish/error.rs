use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteStoreError {
    #[error("invalid remote store url: {0}")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote store rejected write with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}
