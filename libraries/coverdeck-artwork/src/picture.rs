//! FLAC `METADATA_BLOCK_PICTURE` structure, as carried in Vorbis comments
//!
//! Layout (all integers big-endian u32):
//!
//! ```text
//! picture type | mime len | mime | desc len | desc |
//! width | height | color depth | colors used | image len | image
//! ```

use crate::error::{ArtworkError, Result};
use crate::types::PictureType;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use byteorder::{BigEndian, ByteOrder};

/// Size of a block with empty mime, description and image
pub const MIN_BLOCK_LEN: usize = 32;

/// A single embedded picture
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PictureBlock {
    pub picture_type: PictureType,
    pub mime_type: String,
    pub description: String,
    pub width: u32,
    pub height: u32,
    pub color_depth: u32,
    pub colors_used: u32,
    pub image: Vec<u8>,
}

impl PictureBlock {
    /// Front cover with no description and unknown dimensions
    pub fn new(image: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            image,
            mime_type: mime_type.into(),
            ..Self::default()
        }
    }

    /// Parse a raw (already base64-decoded) picture block.
    ///
    /// Only the picture type, mime type and image are kept. The description
    /// and the four dimension fields are read past but not retained, so the
    /// result always has an empty description and zero dimensions.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_BLOCK_LEN {
            return Err(ArtworkError::format(format!(
                "block is {} bytes, at least {} required",
                bytes.len(),
                MIN_BLOCK_LEN
            )));
        }

        let mut reader = BlockReader::new(bytes);

        let picture_type = PictureType::from_u32(reader.read_u32("picture type")?);

        let mime_len = reader.read_u32("mime length")?;
        let mime_type = String::from_utf8_lossy(reader.read_bytes(mime_len, "mime type")?).into_owned();

        let desc_len = reader.read_u32("description length")?;
        reader.read_bytes(desc_len, "description")?;

        // width, height, color depth, colors used
        for field in ["width", "height", "color depth", "colors used"] {
            reader.read_u32(field)?;
        }

        let image_len = reader.read_u32("image length")?;
        let image = reader.read_bytes(image_len, "image data")?.to_vec();

        Ok(Self {
            picture_type,
            mime_type,
            image,
            ..Self::default()
        })
    }

    /// Decode a base64 tag value and parse it
    pub fn from_base64(encoded: &str) -> Result<Self> {
        Self::parse(&decode_base64(encoded)?)
    }

    /// Serialize this block. Dimension fields are always written as zero.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        build(
            &self.image,
            &self.mime_type,
            self.picture_type,
            &self.description,
        )
    }

    /// Serialize and base64-encode, ready to be used as a tag value
    pub fn to_base64(&self) -> Result<String> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }

    /// The image bytes as base64
    pub fn image_base64(&self) -> String {
        STANDARD.encode(&self.image)
    }
}

/// Build a raw picture block.
///
/// Width, height, color depth and colors used are written as zero; no
/// attempt is made to inspect the image.
pub fn build(
    image: &[u8],
    mime_type: &str,
    picture_type: PictureType,
    description: &str,
) -> Result<Vec<u8>> {
    let mime_len = length_field(mime_type.len(), "mime type")?;
    let desc_len = length_field(description.len(), "description")?;
    let image_len = length_field(image.len(), "image data")?;

    let mut data =
        Vec::with_capacity(MIN_BLOCK_LEN + mime_type.len() + description.len() + image.len());

    data.extend(picture_type.as_u32().to_be_bytes());
    data.extend(mime_len.to_be_bytes());
    data.extend(mime_type.as_bytes());
    data.extend(desc_len.to_be_bytes());
    data.extend(description.as_bytes());
    data.extend([0; 16]);
    data.extend(image_len.to_be_bytes());
    data.extend(image);

    Ok(data)
}

/// Standard base64 decode that skips ASCII whitespace, so line-wrapped
/// input (`base64` output, PEM style) is accepted
pub(crate) fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    let compact: Vec<u8> = encoded
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    Ok(STANDARD.decode(compact)?)
}

fn length_field(len: usize, field: &str) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| ArtworkError::format(format!("{} is too long ({} bytes)", field, len)))
}

/// Bounds-checked cursor over a picture block
struct BlockReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BlockReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_u32(&mut self, field: &str) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take(4, field)?))
    }

    fn read_bytes(&mut self, len: u32, field: &str) -> Result<&'a [u8]> {
        self.take(len as usize, field)
    }

    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                ArtworkError::format(format!(
                    "{} ({} bytes at offset {}) exceeds block length {}",
                    field,
                    len,
                    self.pos,
                    self.data.len()
                ))
            })?;

        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}
