use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while reading or writing Ogg artwork
#[derive(Debug, Error)]
pub enum ArtworkError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Malformed `METADATA_BLOCK_PICTURE` structure
    #[error("Invalid picture block: {0}")]
    Format(String),

    /// Invalid base64 payload
    #[error("Invalid base64 data: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The media prober could not describe the file
    #[error("Probe failed: {0}")]
    Probe(String),

    /// External tool exited unsuccessfully
    #[error("{program} exited with {status}: {stderr}")]
    ProcessFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// External tool exceeded its time budget and was killed
    #[error("{program} timed out after {timeout:?}")]
    ProcessTimeout { program: String, timeout: Duration },

    /// Embed was asked to write artwork but no image data was supplied
    #[error("No artwork data supplied")]
    MissingArtwork,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ArtworkError {
    fn from(err: serde_json::Error) -> Self {
        ArtworkError::Probe(format!("unreadable probe output: {}", err))
    }
}

impl ArtworkError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        ArtworkError::Format(msg.into())
    }
}

/// Result type for artwork operations
pub type Result<T> = std::result::Result<T, ArtworkError>;
