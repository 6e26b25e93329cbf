//! Image MIME type sniffing from magic bytes
//!
//! Only the leading bytes are looked at; the image itself is never decoded.

/// Returned when no signature matches
pub const FALLBACK_MIME: &str = "image/jpeg";

/// A signature is a set of byte patterns that must all match at their offsets
struct Signature {
    parts: &'static [(usize, &'static [u8])],
    mime: &'static str,
}

/// Evaluated in order, first match wins
const SIGNATURES: &[Signature] = &[
    Signature {
        parts: &[(0, &[0xFF, 0xD8])],
        mime: "image/jpeg",
    },
    Signature {
        parts: &[(0, &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])],
        mime: "image/png",
    },
    Signature {
        parts: &[(0, b"GIF8")],
        mime: "image/gif",
    },
    Signature {
        parts: &[(0, b"RIFF"), (8, b"WEBP")],
        mime: "image/webp",
    },
];

impl Signature {
    fn matches(&self, bytes: &[u8]) -> bool {
        self.parts.iter().all(|(offset, pattern)| {
            bytes
                .get(*offset..offset + pattern.len())
                .is_some_and(|window| window == *pattern)
        })
    }
}

/// Guess the MIME type of an image from its first bytes.
///
/// Unrecognized input (including an empty buffer) is reported as
/// [`FALLBACK_MIME`]; this never fails.
pub fn detect(bytes: &[u8]) -> &'static str {
    SIGNATURES
        .iter()
        .find(|signature| signature.matches(bytes))
        .map_or(FALLBACK_MIME, |signature| signature.mime)
}
