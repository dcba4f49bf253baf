//! Read-only media probing via ffmpeg diagnostic text.
//!
//! A probe invocation (`ffmpeg -i <file>` with no output) always exits
//! non-zero, but its stderr carries the facts we need. Scraping free-form
//! diagnostic text is inherently best-effort: every field of [`MediaInfo`]
//! is optional and a missing pattern is never an error. All patterns live in
//! [`parse_probe_output`] so they can be tested against fixed sample text
//! without a real subprocess.

use crate::command::{is_passthrough, resolve_source, InvocationSpec};
use crate::runner::FfmpegRunner;
use crate::{Error, Result};
use clipflow_storage::StorageGateway;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// Duration: 00:33:42.64, start: 0.000000, bitrate: 152 kb/s
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration: ([^,]+), start: ([^,]+), bitrate: (\d+) kb/s").expect("valid pattern")
});

// Stream #0:1: Video: rv20 (RV20 / 0x30325652), yuv420p, 352x288, 117 kb/s, 15 fps
static VIDEO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Video: ([^,]+), ([^,]+), ([^,\s]+)").expect("valid pattern"));

// Stream #0:0: Audio: cook (cook / 0x6B6F6F63), 22050 Hz, stereo, fltp, 32 kb/s
static AUDIO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Audio: (.*), (\d+) Hz").expect("valid pattern"));

/// Structured facts harvested from one probe invocation.
///
/// Fields are present only when the corresponding pattern matched; a silent
/// video has no audio fields and callers must tolerate any combination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Verbatim duration string, e.g. `00:01:30.00`.
    pub duration: Option<String>,
    /// Duration in whole seconds (fractional part truncated).
    pub seconds: Option<u64>,
    /// Start offset in seconds.
    pub start: Option<f64>,
    /// Overall bitrate in kb/s.
    pub bitrate: Option<u64>,
    /// Video codec, e.g. `h264 (High)`.
    pub vcodec: Option<String>,
    /// Video pixel/container format tag, e.g. `yuv420p`.
    pub vformat: Option<String>,
    /// Resolution token as reported, e.g. `1280x720`.
    pub resolution: Option<String>,
    /// Width parsed from the resolution token; 0 when the token is malformed.
    pub width: Option<u32>,
    /// Height parsed from the resolution token; 0 when the token is malformed.
    pub height: Option<u32>,
    /// Audio codec, e.g. `aac (LC)`.
    pub acodec: Option<String>,
    /// Audio sample rate in Hz.
    pub sample_rate: Option<u32>,
    /// `seconds + start`, present only when both matched.
    pub play_time: Option<f64>,
    /// File size in bytes. Populated only on the local tier; a remote-tier
    /// probe cannot report size without an extra fetch.
    pub size: Option<u64>,
}

/// Derive whole seconds from an `HH:MM:SS[.ff]` token using integer
/// arithmetic; the fractional part is truncated.
fn parse_seconds(duration: &str) -> Option<u64> {
    let mut parts = duration.split(':');
    let hours: u64 = parts.next()?.trim().parse().ok()?;
    let minutes: u64 = parts.next()?.trim().parse().ok()?;
    let secs_token = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let secs: u64 = secs_token
        .split('.')
        .next()?
        .trim()
        .parse()
        .ok()?;
    Some(hours * 3600 + minutes * 60 + secs)
}

/// Parse a `WIDTHxHEIGHT` token. A malformed token (not exactly two
/// `x`-separated integers) yields `(0, 0)` rather than failing the probe.
fn parse_resolution(token: &str) -> (u32, u32) {
    let parts: Vec<&str> = token.split('x').collect();
    if parts.len() == 2 {
        if let (Ok(w), Ok(h)) = (parts[0].parse(), parts[1].parse()) {
            return (w, h);
        }
    }
    (0, 0)
}

/// Scan diagnostic text with four independent, order-insensitive pattern
/// extractions and return whatever matched.
pub fn parse_probe_output(text: &str) -> MediaInfo {
    let mut info = MediaInfo::default();

    if let Some(caps) = DURATION_RE.captures(text) {
        let duration = caps[1].to_string();
        info.seconds = parse_seconds(&duration);
        info.start = caps[2].trim().parse().ok();
        info.bitrate = caps[3].parse().ok();
        info.duration = Some(duration);
    }

    if let Some(caps) = VIDEO_RE.captures(text) {
        info.vcodec = Some(caps[1].to_string());
        info.vformat = Some(caps[2].to_string());
        let resolution = caps[3].to_string();
        let (width, height) = parse_resolution(&resolution);
        info.width = Some(width);
        info.height = Some(height);
        info.resolution = Some(resolution);
    }

    if let Some(caps) = AUDIO_RE.captures(text) {
        info.acodec = Some(caps[1].to_string());
        info.sample_rate = caps[2].parse().ok();
    }

    if let (Some(seconds), Some(start)) = (info.seconds, info.start) {
        info.play_time = Some(seconds as f64 + start);
    }

    info
}

/// Probe a stored media file and return its metadata.
///
/// Validates the key first: an empty key is code 100, a key absent from the
/// tier is code 101, and in both cases the binary is never invoked. The probe
/// run's non-zero exit status is expected and ignored; only the captured
/// diagnostics matter.
pub async fn probe(
    store: &dyn StorageGateway,
    runner: &FfmpegRunner,
    key: &str,
) -> Result<MediaInfo> {
    if key.is_empty() {
        return Err(Error::EmptyInput);
    }
    let local_exists = !is_passthrough(key)
        && tokio::fs::try_exists(store.local_path(key))
            .await
            .unwrap_or(false);
    if !is_passthrough(key) && !local_exists && !store.exists(key).await {
        return Err(Error::input_not_found(key));
    }

    let resolved = if local_exists && !store.is_local() {
        // Scratch artifact from an earlier pipeline stage; read it in place.
        store.local_path(key).to_string_lossy().into_owned()
    } else {
        resolve_source(store, key)
    };

    let spec = InvocationSpec::new().input(resolved);
    let result = runner.run(&spec.to_args()).await;
    let mut info = parse_probe_output(&result.text());

    if !is_passthrough(key) && (store.is_local() || local_exists) {
        if let Ok(meta) = tokio::fs::metadata(store.local_path(key)).await {
            info.size = Some(meta.len());
        }
    }

    tracing::debug!(key, ?info.seconds, ?info.resolution, "probe completed");
    Ok(info)
}
