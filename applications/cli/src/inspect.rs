/// Summary of a file's codec and cover art, as printed by `coverdeck inspect`
use crate::error::Result;
use coverdeck_artwork::{CodecKind, OggArtworkHandler, PictureType, TagLocation};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub path: PathBuf,
    pub codec: CodecKind,
    pub tag_location: TagLocation,
    pub artwork: Option<ArtworkSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkSummary {
    pub picture_type: PictureType,
    pub mime_type: String,
    pub size: usize,
}

pub async fn inspect(handler: &OggArtworkHandler, path: &Path) -> Result<Inspection> {
    let codec = handler.detect_codec(path).await;
    let artwork = handler
        .picture(path)
        .await?
        .map(|picture| ArtworkSummary {
            picture_type: picture.picture_type,
            mime_type: picture.mime_type,
            size: picture.image.len(),
        });

    Ok(Inspection {
        path: path.to_path_buf(),
        codec,
        tag_location: codec.tag_location(),
        artwork,
    })
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "file:     {}", self.path.display())?;
        writeln!(f, "codec:    {}", self.codec)?;
        writeln!(f, "tag:      {}", self.tag_location)?;
        match &self.artwork {
            Some(art) => write!(
                f,
                "artwork:  {}, {}, {} bytes",
                art.picture_type, art.mime_type, art.size
            ),
            None => write!(f, "artwork:  none"),
        }
    }
}
