//! Common test utilities and fixtures
//!
//! `FakeMedia` stands in for both ffprobe and ffmpeg. A fake "Ogg file" is a
//! JSON document shaped like ffprobe output; probing parses it, and a remux
//! applies the `-metadata` argument to it and writes the result to the output
//! path.
#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use coverdeck_artwork::{
    ArtworkError, MediaProber, OggArtworkHandler, ProbeReport, ProcessOutput, ProcessRunner,
    Remuxer, Result,
};
use serde_json::{json, Value};
use std::ffi::OsString;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 16, b'J', b'F', b'I', b'F'];

#[derive(Default)]
pub struct FakeMedia {
    fail_remux: AtomicBool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeMedia {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every following remux write partial output and exit 1
    pub fn fail_remuxes(&self) {
        self.fail_remux.store(true, Ordering::SeqCst);
    }

    /// Arguments of every ffmpeg invocation so far
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn handler(self: &Arc<Self>) -> OggArtworkHandler {
        OggArtworkHandler::with_backends(
            self.clone(),
            Remuxer::with_runner(PathBuf::from("ffmpeg"), self.clone()),
        )
    }

    fn remux(&self, args: &[String]) -> std::io::Result<ProcessOutput> {
        let input = &args[1];
        let output = args.last().map(String::as_str).unwrap_or_default();

        if self.fail_remux.load(Ordering::SeqCst) {
            std::fs::write(output, b"{ truncated")?;
            return Ok(exited(1, Vec::new(), b"Error muxing a packet"));
        }

        let mut doc: Value = serde_json::from_slice(&std::fs::read(input)?)?;

        // `-map -0:N` drops input stream N
        let dropped: Vec<u64> = args
            .windows(2)
            .filter(|w| w[0] == "-map")
            .filter_map(|w| w[1].strip_prefix("-0:")?.parse().ok())
            .collect();
        if let Some(streams) = doc["streams"].as_array_mut() {
            streams.retain(|s| !s["index"].as_u64().is_some_and(|i| dropped.contains(&i)));
        }

        let option = args
            .iter()
            .position(|a| a.starts_with("-metadata"))
            .expect("remux without -metadata");
        let (key, value) = args[option + 1].split_once('=').expect("KEY=VALUE");

        let tags = match args[option].as_str() {
            "-metadata" => &mut doc["format"]["tags"],
            "-metadata:s:a:0" => {
                let streams = doc["streams"].as_array_mut().expect("streams");
                let audio = streams
                    .iter_mut()
                    .find(|s| s["codec_type"] == "audio")
                    .expect("audio stream");
                &mut audio["tags"]
            }
            other => panic!("unexpected metadata option {}", other),
        };
        if !tags.is_object() {
            *tags = json!({});
        }
        let tags = tags.as_object_mut().expect("tags object");
        if value.is_empty() {
            tags.remove(key);
        } else {
            tags.insert(key.to_string(), Value::String(value.to_string()));
        }

        std::fs::write(output, serde_json::to_vec_pretty(&doc)?)?;
        Ok(exited(0, Vec::new(), b""))
    }

    fn dump_attached_picture(args: &[String]) -> std::io::Result<ProcessOutput> {
        let doc: Value = serde_json::from_slice(&std::fs::read(&args[1])?)?;
        match doc["attached_picture"].as_str() {
            Some(encoded) => {
                let image = STANDARD.decode(encoded).expect("fixture base64");
                Ok(exited(0, image, b""))
            }
            None => Ok(exited(1, Vec::new(), b"Output file does not contain any stream")),
        }
    }
}

#[async_trait]
impl MediaProber for FakeMedia {
    async fn probe(&self, path: &Path) -> Result<ProbeReport> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ArtworkError::Probe(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl ProcessRunner for FakeMedia {
    async fn run(
        &self,
        _program: &Path,
        args: &[OsString],
        _timeout: Duration,
    ) -> Result<ProcessOutput> {
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        self.calls.lock().unwrap().push(args.clone());

        let output = if args.iter().any(|a| a == "image2pipe") {
            Self::dump_attached_picture(&args)?
        } else {
            self.remux(&args)?
        };
        Ok(output)
    }
}

fn exited(code: i32, stdout: Vec<u8>, stderr: &[u8]) -> ProcessOutput {
    ProcessOutput {
        status: ExitStatus::from_raw(code << 8),
        stdout,
        stderr: stderr.to_vec(),
    }
}

/// Write a fake Ogg file with one audio stream of `codec`
pub fn create_ogg_file(dir: &Path, name: &str, codec: &str) -> PathBuf {
    write_document(
        dir,
        name,
        &json!({
            "format": { "format_name": "ogg", "tags": { "title": "Test Song" } },
            "streams": [
                { "index": 0, "codec_type": "audio", "codec_name": codec, "tags": {} }
            ]
        }),
    )
}

pub fn write_document(dir: &Path, name: &str, doc: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(doc).unwrap()).unwrap();
    path
}

pub fn read_document(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

/// Names of the entries in `dir`, sorted
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
