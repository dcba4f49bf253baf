//! Single validated input-to-output transcode steps.
//!
//! Every operation here is a parameterization of one contract: validate the
//! inputs, resolve the local output path, run one invocation, verify the
//! exit status and the output's existence, then optionally publish to the
//! remote tier. Composite pipelines are built on top in [`crate::pipeline`].

use crate::command::{is_passthrough, resolve_source, InvocationSpec};
use crate::config::AvConfig;
use crate::probe::{self, MediaInfo};
use crate::runner::{FfmpegRunner, ProcessResult};
use crate::{Error, Result};
use clipflow_storage::StorageGateway;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// One ffmpeg source: a storage key (or passthrough URL) plus the arguments
/// that must precede its `-i` flag, such as `-stream_loop -1`.
#[derive(Debug, Clone, Default)]
pub struct Source {
    pub key: String,
    pub args: Vec<String>,
}

impl Source {
    /// A source with no per-input arguments.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            args: Vec::new(),
        }
    }

    /// A source with arguments emitted before its `-i` flag.
    pub fn with_args(
        key: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            key: key.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Pad/scale/rate settings for thumbnail-style transcodes.
#[derive(Debug, Clone)]
pub struct ThumbOptions {
    /// Pad the frame to this size, when set.
    pub pad: Option<(u32, u32)>,
    /// Scale the frame to this size, when set.
    pub scale: Option<(u32, u32)>,
    /// Output frame rate; 0 keeps the source rate.
    pub frame_rate: u32,
    /// Video bitrate in kb/s; 0 omits the flag.
    pub min_rate: u32,
    /// Maximum bitrate in kb/s; 0 omits the flag.
    pub max_rate: u32,
    /// Rate-control buffer size in kb; 0 omits the flag.
    pub buf_size: u32,
}

impl ThumbOptions {
    /// Defaults derived from the configured width/height.
    pub fn from_config(config: &AvConfig) -> Self {
        Self {
            pad: Some((config.width, config.height)),
            scale: Some((config.width, config.height)),
            frame_rate: 0,
            min_rate: 1000,
            max_rate: 2000,
            buf_size: 1000,
        }
    }

    fn to_args(&self, duration_cap: u32) -> Vec<String> {
        let mut args = Vec::new();

        let mut filters = Vec::new();
        if let Some((w, h)) = self.pad {
            filters.push(format!("pad={w}:{h}"));
        }
        if let Some((w, h)) = self.scale {
            filters.push(format!("scale={w}:{h}"));
        }
        if !filters.is_empty() {
            args.push("-vf".to_string());
            args.push(filters.join(","));
        }
        if self.frame_rate > 0 {
            args.push("-r".to_string());
            args.push(self.frame_rate.to_string());
        }
        if self.min_rate > 0 {
            args.push("-b:v".to_string());
            args.push(format!("{}k", self.min_rate));
        }
        if self.buf_size > 0 {
            args.push("-bufsize".to_string());
            args.push(format!("{}k", self.buf_size));
        }
        if self.max_rate > 0 {
            args.push("-maxrate".to_string());
            args.push(format!("{}k", self.max_rate));
        }
        if duration_cap > 0 {
            args.push("-t".to_string());
            args.push(duration_cap.to_string());
        }
        args.push("-y".to_string());
        args
    }
}

/// Runs single transcode steps against a storage tier.
#[derive(Clone)]
pub struct Transcoder {
    store: Arc<dyn StorageGateway>,
    runner: FfmpegRunner,
    config: AvConfig,
}

impl Transcoder {
    /// Create a transcoder over the given tier with explicit settings.
    pub fn new(store: Arc<dyn StorageGateway>, config: AvConfig) -> Self {
        let runner = FfmpegRunner::new(config.binary.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs));
        Self {
            store,
            runner,
            config,
        }
    }

    /// The storage tier this transcoder operates on.
    pub fn store(&self) -> &Arc<dyn StorageGateway> {
        &self.store
    }

    /// The active settings.
    pub fn config(&self) -> &AvConfig {
        &self.config
    }

    /// Probe a stored media file.
    pub async fn probe(&self, key: &str) -> Result<MediaInfo> {
        probe::probe(&*self.store, &self.runner, key).await
    }

    /// Validate that every key is non-empty and reachable, without invoking
    /// the binary. Scratch artifacts from an earlier pipeline stage count as
    /// reachable even before they are published.
    pub async fn ensure_inputs(&self, keys: &[&str]) -> Result<()> {
        if keys.is_empty() {
            return Err(Error::EmptyInput);
        }
        for key in keys {
            if key.is_empty() {
                return Err(Error::EmptyInput);
            }
            if is_passthrough(key) {
                continue;
            }
            let local = tokio::fs::try_exists(self.store.local_path(key))
                .await
                .unwrap_or(false);
            if !local && !self.store.exists(key).await {
                return Err(Error::input_not_found(*key));
            }
        }
        Ok(())
    }

    async fn resolve_input(&self, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(Error::EmptyInput);
        }
        if is_passthrough(key) {
            return Ok(key.to_string());
        }
        let local_path = self.store.local_path(key);
        if tokio::fs::try_exists(&local_path).await.unwrap_or(false) {
            // Local copies (including unpublished scratch) win over the tier.
            return Ok(local_path.to_string_lossy().into_owned());
        }
        if self.store.exists(key).await {
            return Ok(resolve_source(&*self.store, key));
        }
        Err(Error::input_not_found(key))
    }

    /// Resolve the local output path, creating any missing parent directory.
    async fn prepare_output(&self, key: &str) -> Result<PathBuf> {
        if let Some((parent, _)) = key.rsplit_once('/') {
            self.store.make_dir(parent).await.map_err(|e| {
                Error::subprocess(format!("failed to create output directory {parent}: {e}"), vec![])
            })?;
        } else if let Some(parent) = self.store.local_path(key).parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::subprocess(format!("failed to create output directory: {e}"), vec![])
            })?;
        }
        Ok(self.store.local_path(key))
    }

    async fn verify(&self, result: ProcessResult, output_key: &str) -> Result<()> {
        let output_exists = tokio::fs::try_exists(self.store.local_path(output_key))
            .await
            .unwrap_or(false);
        if !result.success() || !output_exists {
            tracing::warn!(
                output_key,
                status = result.status,
                output_exists,
                "transcode failed"
            );
            return Err(Error::subprocess(
                format!("exited with status {}", result.status),
                result.lines,
            ));
        }
        Ok(())
    }

    /// Copy a finished local artifact out to the remote tier and drop the
    /// local scratch copy. No-op success on the local tier.
    pub async fn publish(&self, key: &str) -> Result<()> {
        if self.store.is_local() {
            return Ok(());
        }
        let resource = self.store.local_path(key);
        let data = tokio::fs::read(&resource)
            .await
            .map_err(|_| Error::publish_failed(key, resource.to_string_lossy()))?;
        self.store.put(key, data.into()).await.map_err(|e| {
            tracing::error!(key, error = %e, "publish to remote tier failed");
            Error::publish_failed(key, resource.to_string_lossy())
        })?;
        if let Err(e) = tokio::fs::remove_file(&resource).await {
            tracing::warn!(key, error = %e, "failed to remove local copy after publish");
        }
        tracing::info!(key, "published to remote tier");
        Ok(())
    }

    /// Run one validated transcode invocation.
    ///
    /// Assembly order: `prefix`, then the resolved inputs with their per-input
    /// arguments, then `options`, the thread clause, and the resolved output
    /// path. Each step short-circuits with its failure code; see
    /// [`crate::Error`].
    pub async fn process(
        &self,
        sources: &[Source],
        output: &str,
        options: &[String],
        publish: bool,
        prefix: &[String],
    ) -> Result<()> {
        if sources.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut spec = InvocationSpec::new().global(prefix.iter().cloned());
        for source in sources {
            let resolved = self.resolve_input(&source.key).await?;
            spec = spec.input(resolved).input_args(source.args.iter().cloned());
        }

        let local_output = self.prepare_output(output).await?;

        let mut output_args: Vec<String> = options.to_vec();
        if self.config.threads > 0 {
            output_args.extend([
                "-threads".to_string(),
                self.config.threads.to_string(),
                "-preset".to_string(),
                "ultrafast".to_string(),
            ]);
        }
        spec = spec
            .output(local_output.to_string_lossy().into_owned())
            .output_args(output_args);

        let result = self.runner.run(&spec.to_args()).await;
        self.verify(result, output).await?;

        if publish {
            self.publish(output).await?;
        }
        Ok(())
    }

    /// Transcode with pad/scale and rate control (the general-purpose
    /// resize/thumbnail step).
    pub async fn thumbnail(
        &self,
        input: &str,
        output: &str,
        options: &ThumbOptions,
        publish: bool,
    ) -> Result<()> {
        self.process(
            &[Source::new(input)],
            output,
            &options.to_args(self.config.duration_cap),
            publish,
            &[],
        )
        .await
    }

    /// Grab a single frame at `timestamp` (`HH:MM:SS`) as an mjpeg image.
    pub async fn frame(
        &self,
        input: &str,
        output: &str,
        timestamp: &str,
        publish: bool,
    ) -> Result<()> {
        let prefix = ["-ss".to_string(), timestamp.to_string()];
        let options = str_args(&["-r", "1", "-vframes", "1", "-an", "-f", "mjpeg", "-y"]);
        self.process(&[Source::new(input)], output, &options, publish, &prefix)
            .await
    }

    /// Extract the audio track, dropping video.
    pub async fn extract_audio(&self, input: &str, output: &str, publish: bool) -> Result<()> {
        let options = str_args(&["-vcodec", "copy", "-vn", "-y"]);
        self.process(&[Source::new(input)], output, &options, publish, &[])
            .await
    }

    /// Extract the video track, dropping audio (a muted copy).
    pub async fn extract_video(&self, input: &str, output: &str, publish: bool) -> Result<()> {
        let options = str_args(&["-vcodec", "copy", "-an", "-y"]);
        self.process(&[Source::new(input)], output, &options, publish, &[])
            .await
    }

    /// Fit into a `width` x `height` box, preserving aspect ratio and padding
    /// the remainder.
    pub async fn resize(
        &self,
        input: &str,
        output: &str,
        width: u32,
        height: u32,
        publish: bool,
    ) -> Result<()> {
        let filter = format!(
            "scale=iw*min({w}/iw\\,{h}/ih):ih*min({w}/iw\\,{h}/ih),pad={w}:{h}:({w}-iw)/2:({h}-ih)/2",
            w = width,
            h = height
        );
        let options = vec!["-vf".to_string(), filter, "-y".to_string()];
        self.process(&[Source::new(input)], output, &options, publish, &[])
            .await
    }

    /// Render the first `frames` frames as an animated gif preview.
    pub async fn gif(&self, input: &str, output: &str, frames: u32, publish: bool) -> Result<()> {
        let options = vec![
            "-vframes".to_string(),
            frames.to_string(),
            "-f".to_string(),
            "gif".to_string(),
            "-y".to_string(),
        ];
        self.process(&[Source::new(input)], output, &options, publish, &[])
            .await
    }
}

pub(crate) fn str_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
