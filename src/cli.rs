use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clipflow")]
#[command(author, version, about = "Media transcoding orchestration over the ffmpeg command line")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage root directory (overrides the config file)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe a stored media file and display its diagnostics
    Probe {
        /// Storage key of the file to probe
        #[arg(required = true)]
        key: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pad, scale and rate-limit a video into the configured frame
    Thumbnail {
        /// Input storage key
        input: String,

        /// Output storage key
        output: String,
    },

    /// Grab a single frame as a jpeg image
    Frame {
        /// Input storage key
        input: String,

        /// Output storage key
        output: String,

        /// Timestamp to seek to, as HH:MM:SS
        #[arg(long, default_value = "00:00:01")]
        at: String,
    },

    /// Extract the audio track, dropping video
    ExtractAudio {
        input: String,
        output: String,
    },

    /// Extract the video track, dropping audio
    ExtractVideo {
        input: String,
        output: String,
    },

    /// Fit a video into a box, preserving aspect ratio
    Resize {
        input: String,
        output: String,

        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,
    },

    /// Render the first frames as an animated gif preview
    Gif {
        input: String,
        output: String,

        /// Number of frames to render
        #[arg(long, default_value = "10")]
        frames: u32,
    },

    /// Composite two videos side by side
    Overlay {
        /// Source video (left pane, sets the frame size)
        first: String,

        /// Main video (right pane, sets the duration)
        second: String,

        output: String,
    },

    /// Put the audio of a source video under a new video
    SameStyle {
        /// New video
        video: String,

        /// Source whose audio track is carried over
        source: String,

        output: String,

        /// Strip the new video's own audio instead of merging
        #[arg(long)]
        mute: bool,
    },

    /// Loop a short audio track under a muted copy of a video
    BgAudioLoop {
        video: String,
        audio: String,
        output: String,
    },

    /// Replace a video's audio track, clamped to the video's duration
    BgAudio {
        audio: String,
        video: String,
        output: String,
    },

    /// Mix an audio track into a video starting at an offset
    BgAudioAt {
        video: String,
        audio: String,
        output: String,

        /// Insertion point in milliseconds
        #[arg(long, default_value = "0")]
        at_ms: u64,

        /// Strip the video's own audio before mixing
        #[arg(long)]
        mute: bool,
    },

    /// Concatenate videos into one uniformly sized file
    Concat {
        /// Input storage keys, in playback order
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<String>,

        #[arg(long)]
        output: String,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
