/// Media probing (ffprobe) and codec detection
use crate::error::{ArtworkError, Result};
use crate::process::{ProcessRunner, TokioProcessRunner};
use crate::types::CodecKind;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for a single ffprobe run
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Container and stream description, shaped like `ffprobe -print_format json`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub format: FormatInfo,
    #[serde(default)]
    pub streams: Vec<StreamInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FormatInfo {
    #[serde(default)]
    pub format_name: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamInfo {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub codec_name: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub disposition: Disposition,
}

/// Stream flags reported by ffprobe as 0/1 integers
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Disposition {
    #[serde(default)]
    pub attached_pic: u8,
}

impl StreamInfo {
    pub fn is_audio(&self) -> bool {
        self.codec_type.as_deref() == Some("audio")
    }

    pub fn is_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
    }

    /// Cover art exposed as a single-frame video stream. ffmpeg surfaces a
    /// `METADATA_BLOCK_PICTURE` comment this way when it reads an Ogg file.
    pub fn is_attached_picture(&self) -> bool {
        self.is_video() && self.disposition.attached_pic != 0
    }
}

impl ProbeReport {
    pub fn audio_streams(&self) -> impl Iterator<Item = &StreamInfo> {
        self.streams.iter().filter(|s| s.is_audio())
    }

    pub fn has_video_stream(&self) -> bool {
        self.streams.iter().any(|s| s.is_video())
    }

    /// Indices of the attached picture streams
    pub fn attached_picture_streams(&self) -> Vec<u32> {
        self.streams
            .iter()
            .filter(|s| s.is_attached_picture())
            .map(|s| s.index)
            .collect()
    }

    /// Codec of the first audio stream. Anything but "opus" (including no
    /// audio stream at all) is treated as Vorbis.
    pub fn codec_kind(&self) -> CodecKind {
        self.audio_streams()
            .next()
            .and_then(|stream| stream.codec_name.as_deref())
            .map_or_else(CodecKind::default, CodecKind::from_codec_name)
    }
}

/// Describes the container and streams of a media file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbeReport>;
}

/// [`MediaProber`] that shells out to ffprobe
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
    runner: Arc<dyn ProcessRunner>,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self::with_runner(ffprobe_path, Arc::new(TokioProcessRunner::new()))
    }

    pub fn with_runner(ffprobe_path: PathBuf, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            ffprobe_path,
            runner,
        }
    }

    fn args(path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(path.into());
        args
    }
}

impl std::fmt::Debug for FfprobeProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfprobeProber")
            .field("ffprobe_path", &self.ffprobe_path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<ProbeReport> {
        let output = self
            .runner
            .run(&self.ffprobe_path, &Self::args(path), PROBE_TIMEOUT)
            .await?;

        if !output.status.success() {
            return Err(ArtworkError::Probe(format!(
                "ffprobe failed on {}: {}",
                path.display(),
                output.stderr_lossy()
            )));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

/// Decide which codec an Ogg file carries.
///
/// Never fails: probe errors are logged and resolve to Vorbis so that a tag
/// location can always be chosen.
pub async fn detect_codec(prober: &dyn MediaProber, path: &Path) -> CodecKind {
    match prober.probe(path).await {
        Ok(report) => report.codec_kind(),
        Err(e) => {
            tracing::warn!(
                "Codec detection failed for {}, assuming vorbis: {}",
                path.display(),
                e
            );
            CodecKind::default()
        }
    }
}
