use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Picture role, as numbered by ID3v2 APIC and the FLAC picture block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PictureType {
    Other,
    Icon,
    OtherIcon,
    #[default]
    CoverFront,
    CoverBack,
    Leaflet,
    Media,
    LeadArtist,
    Artist,
    Conductor,
    Band,
    Composer,
    Lyricist,
    RecordingLocation,
    DuringRecording,
    DuringPerformance,
    ScreenCapture,
    BrightFish,
    Illustration,
    BandLogo,
    PublisherLogo,
    /// Any value outside 0-20, kept verbatim
    Undefined(u32),
}

/// (type, short name, display name), indexed by the numeric picture type
const PICTURE_TYPES: [(PictureType, &str, &str); 21] = [
    (PictureType::Other, "other", "Other"),
    (PictureType::Icon, "icon", "32x32 pixels file icon"),
    (PictureType::OtherIcon, "other-icon", "Other file icon"),
    (PictureType::CoverFront, "front-cover", "Cover (front)"),
    (PictureType::CoverBack, "back-cover", "Cover (back)"),
    (PictureType::Leaflet, "leaflet", "Leaflet page"),
    (PictureType::Media, "media", "Media (e.g. label side of CD)"),
    (PictureType::LeadArtist, "lead-artist", "Lead artist/lead performer/soloist"),
    (PictureType::Artist, "artist", "Artist/performer"),
    (PictureType::Conductor, "conductor", "Conductor"),
    (PictureType::Band, "band", "Band/Orchestra"),
    (PictureType::Composer, "composer", "Composer"),
    (PictureType::Lyricist, "lyricist", "Lyricist/text writer"),
    (PictureType::RecordingLocation, "recording-location", "Recording Location"),
    (PictureType::DuringRecording, "during-recording", "During recording"),
    (PictureType::DuringPerformance, "during-performance", "During performance"),
    (PictureType::ScreenCapture, "screen-capture", "Movie/video screen capture"),
    (PictureType::BrightFish, "bright-fish", "A bright coloured fish"),
    (PictureType::Illustration, "illustration", "Illustration"),
    (PictureType::BandLogo, "band-logo", "Band/artist logotype"),
    (PictureType::PublisherLogo, "publisher-logo", "Publisher/Studio logotype"),
];

/// Lowercased short and display names -> type. Built on first use, read-only after.
static PICTURE_TYPE_INDEX: Lazy<HashMap<String, PictureType>> = Lazy::new(|| {
    let mut index = HashMap::with_capacity(PICTURE_TYPES.len() * 2);
    for (ty, short, display) in PICTURE_TYPES {
        index.insert(short.to_string(), ty);
        index.insert(display.to_lowercase(), ty);
    }
    index
});

impl PictureType {
    /// Numeric value as stored in the picture block
    pub fn as_u32(self) -> u32 {
        match self {
            PictureType::Undefined(value) => value,
            known => PICTURE_TYPES
                .iter()
                .position(|(ty, _, _)| *ty == known)
                .map_or(0, |pos| pos as u32),
        }
    }

    pub fn from_u32(value: u32) -> Self {
        usize::try_from(value)
            .ok()
            .and_then(|pos| PICTURE_TYPES.get(pos))
            .map_or(PictureType::Undefined(value), |(ty, _, _)| *ty)
    }

    /// Human readable name, `None` for undefined values
    pub fn name(self) -> Option<&'static str> {
        self.entry().map(|(_, _, display)| display)
    }

    /// Short kebab-case name, `None` for undefined values
    pub fn short_name(self) -> Option<&'static str> {
        self.entry().map(|(_, short, _)| short)
    }

    fn entry(self) -> Option<(PictureType, &'static str, &'static str)> {
        match self {
            PictureType::Undefined(_) => None,
            known => PICTURE_TYPES.get(known.as_u32() as usize).copied(),
        }
    }
}

impl fmt::Display for PictureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Undefined ({})", self.as_u32()),
        }
    }
}

impl FromStr for PictureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        if let Some(ty) = PICTURE_TYPE_INDEX.get(&key) {
            return Ok(*ty);
        }
        key.parse::<u32>()
            .map(PictureType::from_u32)
            .map_err(|_| format!("Unknown picture type: {}", s))
    }
}

/// Audio codec inside an Ogg container, as far as tag placement cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodecKind {
    #[default]
    Vorbis,
    Opus,
}

/// Where the `METADATA_BLOCK_PICTURE` tag attaches inside the container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagLocation {
    /// Container-wide metadata
    FormatLevel,
    /// Metadata of the n-th audio stream
    StreamLevel { audio_index: u32 },
}

/// Probed codec name (lowercase) -> codec
const CODEC_NAMES: &[(&str, CodecKind)] = &[("vorbis", CodecKind::Vorbis), ("opus", CodecKind::Opus)];

/// Codec -> tag placement
const TAG_PLACEMENT: &[(CodecKind, TagLocation)] = &[
    (CodecKind::Vorbis, TagLocation::FormatLevel),
    (CodecKind::Opus, TagLocation::StreamLevel { audio_index: 0 }),
];

impl CodecKind {
    /// Map a probed codec name to a codec, case-insensitively.
    /// Unknown names fall back to Vorbis.
    pub fn from_codec_name(name: &str) -> Self {
        CODEC_NAMES
            .iter()
            .find(|(known, _)| name.eq_ignore_ascii_case(known))
            .map_or_else(CodecKind::default, |(_, kind)| *kind)
    }

    pub fn as_str(self) -> &'static str {
        CODEC_NAMES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("vorbis", |(name, _)| name)
    }

    pub fn tag_location(self) -> TagLocation {
        TAG_PLACEMENT
            .iter()
            .find(|(kind, _)| *kind == self)
            .map_or(TagLocation::FormatLevel, |(_, location)| *location)
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TagLocation {
    /// ffmpeg option selecting this metadata level
    pub fn ffmpeg_option(self) -> String {
        match self {
            TagLocation::FormatLevel => "-metadata".to_string(),
            TagLocation::StreamLevel { audio_index } => format!("-metadata:s:a:{}", audio_index),
        }
    }
}

impl fmt::Display for TagLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagLocation::FormatLevel => f.write_str("format level"),
            TagLocation::StreamLevel { audio_index } => {
                write!(f, "audio stream {}", audio_index)
            }
        }
    }
}
