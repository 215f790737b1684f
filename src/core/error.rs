use thiserror::Error;

/// Errors raised outside the RTE call boundary.
///
/// SCORM API calls never produce these; protocol violations there are
/// reported through return sentinels and numeric error codes instead.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Launch initialization failed: {0}")]
    LaunchInit(String),

    #[error("Package metadata could not be loaded: {0}")]
    MetadataFetch(String),

    #[error("Frame target {0} is not accessible from this origin")]
    CrossOrigin(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    Url(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<reqwest::Error> for BridgeError {
    fn from(e: reqwest::Error) -> Self {
        BridgeError::Http(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
