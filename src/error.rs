use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidsubError {
    #[error("Download failed: {0}")]
    Download(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VidsubError {
    /// Whether a retry has a chance of succeeding. Auth failures never do,
    /// retrying with bad credentials only wastes quota.
    pub fn is_transient(&self) -> bool {
        matches!(self, VidsubError::Api(_) | VidsubError::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, VidsubError>;
