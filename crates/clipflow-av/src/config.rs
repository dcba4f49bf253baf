//! Orchestration configuration.
//!
//! An [`AvConfig`] is passed explicitly into [`crate::Transcoder`] and
//! [`crate::Pipeline`] construction; there is no process-wide cache. All
//! defaults are named constants.

use serde::{Deserialize, Serialize};

/// Default pad/scale width in pixels.
pub const DEFAULT_WIDTH: u32 = 540;
/// Default pad/scale height in pixels.
pub const DEFAULT_HEIGHT: u32 = 960;
/// Default input duration cap in seconds; 0 means unbounded.
pub const DEFAULT_DURATION_CAP: u32 = 0;
/// Default encoder thread count passed to the binary.
pub const DEFAULT_THREADS: u32 = 4;
/// Default subprocess timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
/// Default binary name, resolved through PATH.
pub const DEFAULT_BINARY: &str = "ffmpeg";

/// What happens to scratch artifacts after a composite operation succeeds.
///
/// Scratch files are never removed on failure; they are left on the local
/// tier for diagnosis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Delete scratch artifacts once the final output is verified.
    #[default]
    Remove,
    /// Leave scratch artifacts on the local tier.
    Keep,
}

/// Settings for transcode steps and pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvConfig {
    /// Default output width for pad/scale operations.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Default output height for pad/scale operations.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Clamp applied to thumbnail transcodes, in seconds; 0 means unbounded.
    #[serde(default)]
    pub duration_cap: u32,

    /// Encoder threads requested from the binary; 0 disables the thread
    /// clause. Controls only the binary's internal parallelism.
    #[serde(default = "default_threads")]
    pub threads: u32,

    /// Binary name or path.
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Per-invocation timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Scratch artifact cleanup policy.
    #[serde(default)]
    pub cleanup: CleanupPolicy,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_threads() -> u32 {
    DEFAULT_THREADS
}

fn default_binary() -> String {
    DEFAULT_BINARY.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AvConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            duration_cap: DEFAULT_DURATION_CAP,
            threads: DEFAULT_THREADS,
            binary: DEFAULT_BINARY.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cleanup: CleanupPolicy::default(),
        }
    }
}
