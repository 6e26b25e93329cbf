/// Tests against the real ffmpeg/ffprobe binaries
/// Skipped when the tools (or the needed encoder) are not installed
use base64::{engine::general_purpose::STANDARD, Engine as _};
use coverdeck_artwork::{CodecKind, OggArtworkHandler, PICTURE_TAG_KEY};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to check if FFmpeg and FFprobe are available
async fn is_ffmpeg_available() -> bool {
    for tool in ["ffmpeg", "ffprobe"] {
        let available = tokio::process::Command::new(tool)
            .arg("-version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false);
        if !available {
            return false;
        }
    }
    true
}

/// Run ffmpeg quietly, true on success
async fn run_ffmpeg(args: &[&str], output: &Path) -> bool {
    tokio::process::Command::new("ffmpeg")
        .args(["-v", "quiet"])
        .args(args)
        .arg("-y")
        .arg(output)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Encode one second of silence with `encoder`; false if it is missing
async fn create_test_audio_file(path: &Path, encoder: &str) -> bool {
    run_ffmpeg(
        &["-f", "lavfi", "-i", "anullsrc=r=48000:cl=mono", "-t", "1", "-c:a", encoder],
        path,
    )
    .await
}

/// Render a 16x16 PNG filled with `color`
async fn create_test_cover(path: &Path, color: &str) -> Option<Vec<u8>> {
    let source = format!("color=c={}:s=16x16", color);
    if !run_ffmpeg(&["-f", "lavfi", "-i", &source, "-frames:v", "1"], path).await {
        return None;
    }
    std::fs::read(path).ok()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Offset of the picture tag inside the raw file, if present
fn raw_tag_offset(path: &Path) -> Option<usize> {
    let tag = format!("{}=", PICTURE_TAG_KEY);
    find(&std::fs::read(path).unwrap(), tag.as_bytes())
}

fn handler() -> OggArtworkHandler {
    OggArtworkHandler::new(PathBuf::from("ffmpeg"), PathBuf::from("ffprobe"))
}

/// Audio file plus cover, or None when the environment cannot produce them
async fn fixtures(dir: &TempDir, name: &str, encoder: &str) -> Option<(PathBuf, Vec<u8>)> {
    if !is_ffmpeg_available().await {
        eprintln!("Skipping test: FFmpeg not available");
        return None;
    }

    let audio = dir.path().join(name);
    if !create_test_audio_file(&audio, encoder).await {
        eprintln!("Skipping test: {} encoder not available", encoder);
        return None;
    }

    let Some(cover) = create_test_cover(&dir.path().join("cover.png"), "red").await else {
        eprintln!("Skipping test: could not render a PNG");
        return None;
    };
    Some((audio, cover))
}

#[tokio::test]
async fn embed_then_extract_roundtrips_opus() {
    let dir = TempDir::new().unwrap();
    let Some((path, cover)) = fixtures(&dir, "song.opus", "libopus").await else {
        return;
    };
    let handler = handler();
    assert_eq!(handler.detect_codec(&path).await, CodecKind::Opus);

    handler
        .embed(&path, &STANDARD.encode(&cover), false)
        .await
        .unwrap();

    // Stream-level comments of an Opus stream live in its OpusTags header
    let raw = std::fs::read(&path).unwrap();
    let header = find(&raw, b"OpusTags").expect("OpusTags header");
    let tag = raw_tag_offset(&path).expect("picture tag written");
    assert!(tag > header);

    assert_eq!(handler.detect_codec(&path).await, CodecKind::Opus);
    assert_eq!(
        handler.extract(&path).await.unwrap(),
        Some(STANDARD.encode(&cover))
    );
    assert!(handler.has_artwork(&path).await);
}

#[tokio::test]
async fn embed_then_extract_roundtrips_vorbis() {
    let dir = TempDir::new().unwrap();
    let Some((path, cover)) = fixtures(&dir, "song.ogg", "libvorbis").await else {
        return;
    };
    let handler = handler();
    assert_eq!(handler.detect_codec(&path).await, CodecKind::Vorbis);

    handler
        .embed(&path, &STANDARD.encode(&cover), false)
        .await
        .unwrap();

    // Vorbis comment header: packet type 3 followed by "vorbis"
    let raw = std::fs::read(&path).unwrap();
    let header = find(&raw, b"\x03vorbis").expect("vorbis comment header");
    let tag = raw_tag_offset(&path).expect("picture tag written");
    assert!(tag > header);

    assert_eq!(
        handler.extract(&path).await.unwrap(),
        Some(STANDARD.encode(&cover))
    );
}

#[tokio::test]
async fn embed_twice_keeps_only_the_new_cover() {
    let dir = TempDir::new().unwrap();
    let Some((path, cover)) = fixtures(&dir, "song.opus", "libopus").await else {
        return;
    };
    let handler = handler();

    let first = create_test_cover(&dir.path().join("first.png"), "blue")
        .await
        .unwrap();
    assert_ne!(first, cover);
    handler.embed(&path, &STANDARD.encode(first), false).await.unwrap();
    handler
        .embed(&path, &STANDARD.encode(&cover), false)
        .await
        .unwrap();

    assert_eq!(
        handler.extract(&path).await.unwrap(),
        Some(STANDARD.encode(&cover))
    );
}

#[tokio::test]
async fn remove_then_extract_is_none() {
    let dir = TempDir::new().unwrap();
    let Some((path, cover)) = fixtures(&dir, "song.opus", "libopus").await else {
        return;
    };
    let handler = handler();

    handler
        .embed(&path, &STANDARD.encode(&cover), false)
        .await
        .unwrap();
    assert!(handler.has_artwork(&path).await);

    handler.embed(&path, "", true).await.unwrap();

    assert_eq!(handler.extract(&path).await.unwrap(), None);
    assert!(!handler.has_artwork(&path).await);
    assert_eq!(raw_tag_offset(&path), None);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[tokio::test]
async fn non_media_file_has_no_artwork() {
    if !is_ffmpeg_available().await {
        eprintln!("Skipping test: FFmpeg not available");
        return;
    }

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.ogg");
    std::fs::write(&path, b"plain text, not an ogg stream").unwrap();

    let handler = handler();
    assert_eq!(handler.extract(&path).await.unwrap(), None);
    assert_eq!(handler.detect_codec(&path).await, CodecKind::Vorbis);
}

#[tokio::test]
async fn failed_remux_keeps_non_media_file() {
    if !is_ffmpeg_available().await {
        eprintln!("Skipping test: FFmpeg not available");
        return;
    }

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.ogg");
    std::fs::write(&path, b"plain text, not an ogg stream").unwrap();

    let result = handler().embed(&path, "", true).await;
    assert!(result.is_err());
    assert_eq!(
        std::fs::read(&path).unwrap(),
        b"plain text, not an ogg stream"
    );
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
