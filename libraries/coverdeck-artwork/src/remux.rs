/// Remux service - ffmpeg stream copy that rewrites the picture tag
use crate::error::Result;
use crate::process::{ProcessRunner, TokioProcessRunner};
use crate::types::TagLocation;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Vorbis comment key carrying the picture block
pub const PICTURE_TAG_KEY: &str = "METADATA_BLOCK_PICTURE";

/// Upper bound for a tag-rewriting remux
pub const REMUX_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for dumping an attached picture stream
pub const ATTACHED_PICTURE_TIMEOUT: Duration = Duration::from_secs(10);

/// Output container; Vorbis and Opus both live in Ogg
const OUTPUT_FORMAT: &str = "ogg";

/// New value for the picture tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureTag<'a> {
    /// Base64 encoded picture block
    Set(&'a str),
    /// Empty value, which drops the tag
    Clear,
}

impl<'a> PictureTag<'a> {
    pub fn value(self) -> &'a str {
        match self {
            PictureTag::Set(encoded) => encoded,
            PictureTag::Clear => "",
        }
    }
}

#[derive(Clone)]
pub struct Remuxer {
    ffmpeg_path: PathBuf,
    runner: Arc<dyn ProcessRunner>,
}

impl Remuxer {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self::with_runner(ffmpeg_path, Arc::new(TokioProcessRunner::new()))
    }

    pub fn with_runner(ffmpeg_path: PathBuf, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            ffmpeg_path,
            runner,
        }
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    /// Arguments for a stream copy of every stream in `input` into an Ogg
    /// `output`, with the picture tag set at `location`.
    ///
    /// `superseded` lists attached picture streams to leave out: the tag
    /// replaces them, and the Ogg muxer cannot store image streams anyway.
    pub fn picture_tag_args(
        input: &Path,
        output: &Path,
        location: TagLocation,
        tag: PictureTag<'_>,
        superseded: &[u32],
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-i".into(),
            input.into(),
            "-y".into(),
            "-c".into(),
            "copy".into(),
            "-map".into(),
            "0".into(),
        ];
        for index in superseded {
            args.push("-map".into());
            args.push(format!("-0:{}", index).into());
        }
        args.extend([
            location.ffmpeg_option().into(),
            format!("{}={}", PICTURE_TAG_KEY, tag.value()).into(),
            "-f".into(),
            OUTPUT_FORMAT.into(),
            output.into(),
        ]);
        args
    }

    /// Copy `input` to `output` with the picture tag replaced.
    ///
    /// One attempt, bounded by [`REMUX_TIMEOUT`]. Non-zero exit becomes
    /// [`crate::ArtworkError::ProcessFailed`].
    pub async fn write_picture_tag(
        &self,
        input: &Path,
        output: &Path,
        location: TagLocation,
        tag: PictureTag<'_>,
        superseded: &[u32],
    ) -> Result<()> {
        let args = Self::picture_tag_args(input, output, location, tag, superseded);
        tracing::debug!(
            "Remuxing {} -> {} ({}, {})",
            input.display(),
            output.display(),
            location,
            if tag == PictureTag::Clear { "clear" } else { "set" }
        );

        let output_result = self
            .runner
            .run(&self.ffmpeg_path, &args, REMUX_TIMEOUT)
            .await?;

        if let Err(e) = output_result.check(&self.ffmpeg_path) {
            tracing::error!("FFmpeg failed on {}: {}", input.display(), e);
            return Err(e);
        }

        Ok(())
    }

    /// Dump the first video (attached picture) stream of `input` as raw
    /// image bytes. Older Ogg files carry cover art this way instead of a
    /// picture tag.
    pub async fn extract_attached_picture(&self, input: &Path) -> Result<Option<Vec<u8>>> {
        let args: Vec<OsString> = vec![
            "-i".into(),
            input.into(),
            "-an".into(),
            "-vcodec".into(),
            "copy".into(),
            "-f".into(),
            "image2pipe".into(),
            "-".into(),
        ];

        let output = self
            .runner
            .run(&self.ffmpeg_path, &args, ATTACHED_PICTURE_TIMEOUT)
            .await?
            .check(&self.ffmpeg_path)?;

        if output.stdout.is_empty() {
            return Ok(None);
        }
        Ok(Some(output.stdout))
    }
}

impl std::fmt::Debug for Remuxer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Remuxer")
            .field("ffmpeg_path", &self.ffmpeg_path)
            .finish_non_exhaustive()
    }
}
