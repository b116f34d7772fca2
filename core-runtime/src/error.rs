use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings store is not running")]
    SettingsUnavailable,

    #[error("No music directories configured")]
    NoDirectoriesConfigured,

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Logging initialization failed: {0}")]
    LoggingInit(String),
}

pub type Result<T> = std::result::Result<T, Error>;
