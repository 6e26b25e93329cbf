/// CLI error types
use coverdeck_artwork::ArtworkError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{} is outside the music library {}", .path.display(), .library.display())]
    OutsideLibrary { path: PathBuf, library: PathBuf },

    #[error("Artwork error: {0}")]
    Artwork(#[from] ArtworkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}
