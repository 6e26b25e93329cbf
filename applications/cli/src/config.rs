/// CLI configuration
use crate::error::{CliError, Result};
use coverdeck_artwork::FileOwner;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "coverdeck.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub tools: ToolSettings,

    #[serde(default)]
    pub ownership: OwnershipSettings,

    #[serde(default)]
    pub library: LibrarySettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolSettings {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
}

/// Owner for rewritten files, typically the container's PUID/PGID
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OwnershipSettings {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LibrarySettings {
    /// When set, only files below this directory may be touched
    pub music_dir: Option<PathBuf>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
        }
    }
}

impl Settings {
    /// Load configuration from file and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(config_file, None)
    }

    /// Like [`Settings::load`], reading variables from `env` instead of the
    /// process environment when given
    pub fn load_with_env(
        config_file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut settings = config::Config::builder();

        match config_file {
            // An explicitly named file must exist
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables, e.g. COVERDECK_TOOLS__FFMPEG_PATH
        settings = settings.add_source(
            config::Environment::with_prefix("COVERDECK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.ownership.uid.is_some() != self.ownership.gid.is_some() {
            return Err(CliError::Config(
                "ownership needs both uid and gid (set COVERDECK_OWNERSHIP__UID and COVERDECK_OWNERSHIP__GID)"
                    .to_string(),
            ));
        }

        if let Some(music_dir) = &self.library.music_dir {
            if !music_dir.is_dir() {
                return Err(CliError::Config(format!(
                    "Music directory not found at {:?}",
                    music_dir
                )));
            }
        }

        Ok(())
    }

    pub fn owner(&self) -> Option<FileOwner> {
        match (self.ownership.uid, self.ownership.gid) {
            (Some(uid), Some(gid)) => Some(FileOwner { uid, gid }),
            _ => None,
        }
    }

    /// Resolve a user supplied path, refusing anything outside the music
    /// library when one is configured
    pub fn resolve_path(&self, path: &Path) -> Result<PathBuf> {
        let Some(music_dir) = &self.library.music_dir else {
            return Ok(path.to_path_buf());
        };

        let library = music_dir.canonicalize()?;
        let resolved = path.canonicalize()?;
        if !resolved.starts_with(&library) {
            return Err(CliError::OutsideLibrary {
                path: resolved,
                library,
            });
        }
        Ok(resolved)
    }
}

// Default values
fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}
