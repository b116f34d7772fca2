use thiserror::Error;

#[derive(Error, Debug)]
pub enum LyricsError {
    #[error("Lyric search failed: {0}")]
    SearchFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Runtime(#[from] core_runtime::Error),
}

pub type Result<T> = std::result::Result<T, LyricsError>;
