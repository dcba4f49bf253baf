//! # clipflow-av
//!
//! ffmpeg command assembly, diagnostic probing and pipeline orchestration.
//!
//! This crate shapes and sequences invocations of the external ffmpeg binary
//! and interprets its console output; it never touches compressed bitstreams.
//! Data flows strictly upward:
//!
//! storage tier -> [`FfmpegRunner`] -> [`InvocationSpec`] -> [`probe`] ->
//! [`Transcoder`] -> [`Pipeline`]
//!
//! Artifacts live in a key-addressed storage tier
//! ([`clipflow_storage::StorageGateway`]). On a remote tier, outputs are
//! produced locally first and published out afterwards.
//!
//! ## Example
//!
//! ```no_run
//! use clipflow_av::{AvConfig, Pipeline, Transcoder};
//! use clipflow_storage::LocalDiskStorage;
//! use std::sync::Arc;
//!
//! # async fn example() -> clipflow_av::Result<()> {
//! let store = Arc::new(LocalDiskStorage::new("/var/lib/clipflow").unwrap());
//! let tx = Transcoder::new(store, AvConfig::default());
//!
//! let info = tx.probe("videos/clip.mp4").await?;
//! println!("duration: {:?} seconds", info.seconds);
//!
//! let pipeline = Pipeline::new(tx);
//! let options = clipflow_av::ThumbOptions::from_config(pipeline.transcoder().config());
//! pipeline
//!     .concat(&["videos/intro.mp4", "videos/clip.mp4"], "videos/full.mp4", &options, true)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
mod error;
pub mod pipeline;
pub mod probe;
pub mod runner;
pub mod tools;
pub mod transcode;

// Re-exports
pub use command::{is_passthrough, resolve_source, InvocationSpec};
pub use config::{AvConfig, CleanupPolicy};
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use probe::{parse_probe_output, MediaInfo};
pub use runner::{FfmpegRunner, ProcessResult};
pub use tools::{check_tool, check_tools, require_tool, ToolInfo};
pub use transcode::{Source, ThumbOptions, Transcoder};
