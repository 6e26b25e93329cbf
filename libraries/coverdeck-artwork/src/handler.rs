use crate::error::{ArtworkError, Result};
use crate::mime;
use crate::picture::{decode_base64, PictureBlock};
use crate::probe::{self, FfprobeProber, MediaProber, ProbeReport};
use crate::process::{ProcessRunner, TokioProcessRunner};
use crate::remux::{PictureTag, Remuxer, PICTURE_TAG_KEY};
use crate::replace::{AtomicReplacer, FileOwner};
use crate::types::CodecKind;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads and writes cover art in Ogg Vorbis / Ogg Opus files
///
/// Pictures live in a `METADATA_BLOCK_PICTURE` tag holding a base64 FLAC
/// picture block. Vorbis files keep it in the container comments, Opus files
/// on the first audio stream. Writes go through an ffmpeg stream copy into a
/// temporary sibling which then replaces the original.
///
/// Calls on different files are independent. Concurrent writes to the *same*
/// file must be serialized by the caller.
pub struct OggArtworkHandler {
    prober: Arc<dyn MediaProber>,
    remuxer: Remuxer,
    replacer: AtomicReplacer,
}

impl OggArtworkHandler {
    /// Create a handler using the given ffmpeg and ffprobe executables
    pub fn new(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        let runner: Arc<dyn ProcessRunner> = Arc::new(TokioProcessRunner::new());
        Self::with_backends(
            Arc::new(FfprobeProber::with_runner(ffprobe_path, Arc::clone(&runner))),
            Remuxer::with_runner(ffmpeg_path, runner),
        )
    }

    /// Create a handler from explicit probe and remux backends
    pub fn with_backends(prober: Arc<dyn MediaProber>, remuxer: Remuxer) -> Self {
        Self {
            prober,
            remuxer,
            replacer: AtomicReplacer::new(),
        }
    }

    /// Chown rewritten files to `owner`
    #[must_use]
    pub fn with_owner(mut self, owner: Option<FileOwner>) -> Self {
        self.replacer = AtomicReplacer::with_owner(owner);
        self
    }

    /// Codec of the file's first audio stream, Vorbis when unsure
    pub async fn detect_codec(&self, path: &Path) -> CodecKind {
        probe::detect_codec(self.prober.as_ref(), path).await
    }

    /// Extract the embedded picture as base64 image bytes.
    ///
    /// Returns `Ok(None)` when the file has no picture or cannot be probed.
    pub async fn extract(&self, path: &Path) -> Result<Option<String>> {
        Ok(self
            .picture(path)
            .await?
            .map(|picture| picture.image_base64()))
    }

    /// The embedded picture block.
    ///
    /// Format-level tags are searched first, then the tags of each audio
    /// stream; the first `METADATA_BLOCK_PICTURE` key (any case) wins. Files
    /// without such a tag but with an attached picture stream fall back to
    /// dumping that stream.
    pub async fn picture(&self, path: &Path) -> Result<Option<PictureBlock>> {
        ensure_exists(path)?;

        let Some(report) = self.probe_quietly(path).await else {
            return Ok(None);
        };

        if let Some(encoded) = find_picture_tag(&report) {
            return PictureBlock::from_base64(encoded).map(Some);
        }

        if report.has_video_stream() {
            match self.remuxer.extract_attached_picture(path).await {
                Ok(Some(image)) => {
                    let mime_type = mime::detect(&image);
                    return Ok(Some(PictureBlock::new(image, mime_type)));
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    "Failed to extract attached picture from {}: {}",
                    path.display(),
                    e
                ),
            }
        }

        Ok(None)
    }

    /// Whether the file appears to carry cover art: a non-empty picture tag at
    /// format level or on any audio stream (same order as [`Self::picture`]),
    /// or a video stream holding an attached picture. Probe failures count as
    /// no.
    pub async fn has_artwork(&self, path: &Path) -> bool {
        match self.probe_quietly(path).await {
            Some(report) => find_picture_tag(&report).is_some() || report.has_video_stream(),
            None => false,
        }
    }

    /// Embed `data` as the front cover, or clear the picture when `remove_art`.
    ///
    /// `data` is base64 image bytes, optionally with a data-URI prefix
    /// (`data:image/png;base64,...`); it is ignored when removing. Attached
    /// picture streams are dropped in favour of the tag. The original file
    /// is only replaced if the remux succeeds.
    pub async fn embed(&self, path: &Path, data: &str, remove_art: bool) -> Result<()> {
        ensure_exists(path)?;

        let encoded_block;
        let tag = if remove_art {
            PictureTag::Clear
        } else {
            let image = decode_image_data(data)?;
            let mime_type = mime::detect(&image);
            encoded_block = PictureBlock::new(image, mime_type).to_base64()?;
            PictureTag::Set(&encoded_block)
        };

        // An unprobeable file still gets a tag location: Vorbis
        let report = self.probe_quietly(path).await.unwrap_or_default();
        let codec = report.codec_kind();
        let location = codec.tag_location();
        let superseded = report.attached_picture_streams();

        self.replacer
            .replace_with(path, |temp| async move {
                self.remuxer
                    .write_picture_tag(path, &temp, location, tag, &superseded)
                    .await
            })
            .await?;

        tracing::info!(
            "Successfully {} album art for {} ({}, {})",
            if remove_art { "removed" } else { "updated" },
            path.display(),
            codec,
            location
        );
        Ok(())
    }

    async fn probe_quietly(&self, path: &Path) -> Option<ProbeReport> {
        match self.prober.probe(path).await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!("Could not probe {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl std::fmt::Debug for OggArtworkHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OggArtworkHandler")
            .field("remuxer", &self.remuxer)
            .field("replacer", &self.replacer)
            .finish_non_exhaustive()
    }
}

/// Decode caller-supplied image data, stripping a data-URI prefix
/// (everything up to and including the first comma) if present.
/// Whitespace and line breaks inside the base64 are ignored.
pub fn decode_image_data(data: &str) -> Result<Vec<u8>> {
    let payload = match data.find(',') {
        Some(comma) => &data[comma + 1..],
        None => data,
    };
    if payload.trim().is_empty() {
        return Err(ArtworkError::MissingArtwork);
    }
    decode_base64(payload)
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ArtworkError::FileNotFound(path.to_path_buf()))
    }
}

/// First non-empty picture tag: format level, then audio streams in order
fn find_picture_tag(report: &ProbeReport) -> Option<&str> {
    std::iter::once(&report.format.tags)
        .chain(report.audio_streams().map(|stream| &stream.tags))
        .find_map(picture_tag_in)
}

fn picture_tag_in(tags: &BTreeMap<String, String>) -> Option<&str> {
    tags.iter()
        .find(|(key, value)| key.eq_ignore_ascii_case(PICTURE_TAG_KEY) && !value.trim().is_empty())
        .map(|(_, value)| value.as_str())
}
