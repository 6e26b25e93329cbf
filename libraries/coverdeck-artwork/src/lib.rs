//! Coverdeck Artwork - cover art for Ogg Vorbis and Ogg Opus files
//!
//! Cover art in Ogg files lives in a `METADATA_BLOCK_PICTURE` comment whose
//! value is a base64 encoded FLAC picture block. This library reads that tag
//! through ffprobe and rewrites it through an ffmpeg stream copy, choosing the
//! tag level from the audio codec (container level for Vorbis, first audio
//! stream for Opus).
//!
//! # Features
//!
//! - Extract embedded artwork as base64 image bytes
//! - Embed or remove artwork without re-encoding audio
//! - Crash-safe writes (temporary sibling file, then rename)
//! - Image type sniffing (JPEG, PNG, GIF, WEBP)
//!
//! # Example
//!
//! ```no_run
//! use coverdeck_artwork::OggArtworkHandler;
//! use std::path::{Path, PathBuf};
//!
//! # async fn run() -> coverdeck_artwork::Result<()> {
//! let handler = OggArtworkHandler::new(PathBuf::from("ffmpeg"), PathBuf::from("ffprobe"));
//! let path = Path::new("music/track.opus");
//!
//! match handler.extract(path).await? {
//!     Some(image) => println!("Found artwork: {} base64 chars", image.len()),
//!     None => println!("No artwork found"),
//! }
//!
//! // Clear it again
//! handler.embed(path, "", true).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod handler;
pub mod mime;
mod picture;
mod probe;
mod process;
mod remux;
mod replace;
mod types;

// Re-export public API
pub use error::{ArtworkError, Result};
pub use handler::{decode_image_data, OggArtworkHandler};
pub use picture::{build, PictureBlock, MIN_BLOCK_LEN};
pub use probe::{
    detect_codec, Disposition, FfprobeProber, FormatInfo, MediaProber, ProbeReport, StreamInfo,
    PROBE_TIMEOUT,
};
pub use process::{ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use remux::{
    PictureTag, Remuxer, ATTACHED_PICTURE_TIMEOUT, PICTURE_TAG_KEY, REMUX_TIMEOUT,
};
pub use replace::{AtomicReplacer, FileOwner};
pub use types::{CodecKind, PictureType, TagLocation};
