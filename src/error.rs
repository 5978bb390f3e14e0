use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("{0} not found. Install it or set its path in Preferences.")]
    ToolMissing(&'static str),
    #[error("Could not start yt-dlp: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("yt-dlp exited with status {0}")]
    ToolFailed(i32),
    #[error("Downloaded file not found")]
    OutputNotFound,
    #[error("Cancelled")]
    Cancelled,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
