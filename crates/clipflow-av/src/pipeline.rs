//! Composite multi-stage operations.
//!
//! Each operation decomposes into probes, single transcode steps and scratch
//! artifacts, executed strictly in sequence. A child failure aborts the
//! composite and is returned verbatim; scratch files already produced are
//! left in place for diagnosis. Scratch names derive from the final output
//! key, so concurrent pipelines targeting different outputs never collide.
//! Two invocations targeting the *same* output race on the same scratch
//! names; callers serialize by output key when that matters.

use crate::config::CleanupPolicy;
use crate::transcode::{str_args, Source, ThumbOptions, Transcoder};
use crate::Error;
use crate::Result;
use sha2::{Digest, Sha256};

/// Scratch namespace for intermediate video artifacts.
pub const TMP_VIDEO: &str = "tmp_video";
/// Scratch namespace for intermediate audio artifacts.
pub const TMP_AUDIO: &str = "tmp_audio";
/// Scratch namespace for concatenation manifests.
pub const TMP_LIST: &str = "tmp_list";

/// Hex digest naming scratch artifacts: a pure function of the final output
/// key, so re-runs reuse the same scratch names.
pub fn scratch_hash(output: &str) -> String {
    hex::encode(Sha256::digest(output.as_bytes()))
}

/// Scratch key for the intermediate video derived for `output`.
pub fn scratch_video_key(output: &str) -> String {
    format!("{TMP_VIDEO}/{}.mp4", scratch_hash(output))
}

/// Scratch key for the intermediate audio derived for `output`.
pub fn scratch_audio_key(output: &str) -> String {
    format!("{TMP_AUDIO}/{}.mp3", scratch_hash(output))
}

/// Scratch key for the concat manifest derived for `output`.
pub fn scratch_list_key(output: &str) -> String {
    format!("{TMP_LIST}/{}.txt", scratch_hash(output))
}

/// Scratch key for the `index`-th concat intermediate derived for `output`.
pub fn scratch_segment_key(output: &str, index: usize) -> String {
    format!("{TMP_VIDEO}/{}-{index}.ts", scratch_hash(output))
}

/// Composes transcode steps and probes into multi-stage operations.
#[derive(Clone)]
pub struct Pipeline {
    tx: Transcoder,
}

impl Pipeline {
    /// Build a pipeline over an existing transcoder.
    pub fn new(tx: Transcoder) -> Self {
        Self { tx }
    }

    /// The underlying transcoder, for single-step operations.
    pub fn transcoder(&self) -> &Transcoder {
        &self.tx
    }

    /// Apply the configured cleanup policy to scratch keys after a composite
    /// succeeded. Scratch always lives on the local tier.
    async fn cleanup(&self, scratch: &[String]) {
        if self.tx.config().cleanup == CleanupPolicy::Keep {
            return;
        }
        for key in scratch {
            let path = self.tx.store().local_path(key);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(key, error = %e, "failed to remove scratch artifact");
                }
            }
        }
    }

    /// Dual-video overlay: side-by-side compositing of `inputs[0]` (source)
    /// and `inputs[1]` (main).
    ///
    /// When dimensions differ the main video is first resized to the source's
    /// size through a scratch artifact. The main video's probed duration
    /// bounds the final clip length.
    pub async fn overlay(&self, inputs: [&str; 2], output: &str, publish: bool) -> Result<()> {
        self.tx.ensure_inputs(&inputs).await?;

        let first = self.tx.probe(inputs[0]).await?;
        let main = self.tx.probe(inputs[1]).await?;

        let mut scratch = Vec::new();
        let mut second = inputs[1].to_string();
        let (fw, fh) = (first.width.unwrap_or(0), first.height.unwrap_or(0));
        let (mw, mh) = (main.width.unwrap_or(0), main.height.unwrap_or(0));
        if fw > 0 && fh > 0 && (fw != mw || fh != mh) {
            let key = scratch_video_key(output);
            self.tx.resize(inputs[1], &key, fw, fh, false).await?;
            scratch.push(key.clone());
            second = key;
        }

        let mut options = str_args(&[
            "-filter_complex",
            "[1:v]pad=iw*2:ih[a];[a][0:v]overlay=w",
        ]);
        if let Some(seconds) = main.seconds.filter(|s| *s > 0) {
            options.push("-t".to_string());
            options.push(seconds.to_string());
        }
        options.push("-y".to_string());

        self.tx
            .process(
                &[Source::new(inputs[0]), Source::new(second)],
                output,
                &options,
                publish,
                &[],
            )
            .await?;
        self.cleanup(&scratch).await;
        Ok(())
    }

    /// Style-transfer remux: put the audio of `inputs[1]` (source) under
    /// `inputs[0]` (new video), clamped to the source's duration.
    ///
    /// With `mute` the new video's own audio is stripped first; otherwise the
    /// two audio tracks are merged into one stereo stream.
    pub async fn same_style(
        &self,
        inputs: [&str; 2],
        output: &str,
        mute: bool,
        publish: bool,
    ) -> Result<()> {
        self.tx.ensure_inputs(&inputs).await?;

        let source_info = self.tx.probe(inputs[1]).await?;
        let mut scratch = Vec::new();

        let audio_key = scratch_audio_key(output);
        self.tx.extract_audio(inputs[1], &audio_key, false).await?;
        scratch.push(audio_key.clone());

        let mut clamp = Vec::new();
        if let Some(seconds) = source_info.seconds.filter(|s| *s > 0) {
            clamp.push("-t".to_string());
            clamp.push(seconds.to_string());
        }

        if mute {
            let video_key = scratch_video_key(output);
            self.tx.extract_video(inputs[0], &video_key, false).await?;
            scratch.push(video_key.clone());

            let mut options = str_args(&["-c:v", "copy"]);
            options.extend(clamp);
            options.push("-y".to_string());
            self.tx
                .process(
                    &[Source::new(&audio_key), Source::new(&video_key)],
                    output,
                    &options,
                    publish,
                    &[],
                )
                .await?;
        } else {
            let mut options = str_args(&[
                "-c:v",
                "copy",
                "-map",
                "0:v:0",
                "-filter_complex",
                "[0:a][1:a]amerge=inputs=2[aout]",
                "-map",
                "[aout]",
                "-ac",
                "2",
            ]);
            options.extend(clamp);
            options.push("-y".to_string());
            self.tx
                .process(
                    &[Source::new(inputs[0]), Source::new(&audio_key)],
                    output,
                    &options,
                    publish,
                    &[],
                )
                .await?;
        }
        self.cleanup(&scratch).await;
        Ok(())
    }

    /// Loop a short audio track under a muted copy of the primary video.
    ///
    /// The second input is looped indefinitely and `-shortest` bounds the
    /// result to the primary video's length.
    pub async fn bg_audio_loop(
        &self,
        inputs: [&str; 2],
        output: &str,
        publish: bool,
    ) -> Result<()> {
        self.tx.ensure_inputs(&inputs).await?;

        let video_key = scratch_video_key(output);
        self.tx.extract_video(inputs[0], &video_key, false).await?;
        let scratch = vec![video_key.clone()];

        self.tx
            .process(
                &[
                    Source::new(&video_key),
                    Source::with_args(inputs[1], ["-stream_loop", "-1"]),
                ],
                output,
                &str_args(&["-shortest", "-y"]),
                publish,
                &[],
            )
            .await?;
        self.cleanup(&scratch).await;
        Ok(())
    }

    /// Replace the audio of `inputs[1]` (video) with `inputs[0]` (audio),
    /// clamped to the video's probed duration.
    pub async fn bg_audio(&self, inputs: [&str; 2], output: &str, publish: bool) -> Result<()> {
        self.tx.ensure_inputs(&inputs).await?;

        let info = self.tx.probe(inputs[1]).await?;
        let video_key = scratch_video_key(output);
        self.tx.extract_video(inputs[1], &video_key, false).await?;
        let scratch = vec![video_key.clone()];

        let mut options = Vec::new();
        if let Some(seconds) = info.seconds.filter(|s| *s > 0) {
            options.push("-t".to_string());
            options.push(seconds.to_string());
        }
        options.push("-y".to_string());

        self.tx
            .process(
                &[Source::new(inputs[0]), Source::new(&video_key)],
                output,
                &options,
                publish,
                &[],
            )
            .await?;
        self.cleanup(&scratch).await;
        Ok(())
    }

    /// Mix `inputs[1]` (audio) into `inputs[0]` (video) starting at
    /// `delay_ms`, keeping the video stream untouched.
    ///
    /// With `source_mute` the video's own audio is stripped first through a
    /// scratch copy.
    pub async fn bg_audio_at(
        &self,
        inputs: [&str; 2],
        output: &str,
        delay_ms: u64,
        source_mute: bool,
        publish: bool,
    ) -> Result<()> {
        self.tx.ensure_inputs(&inputs).await?;

        let mut scratch = Vec::new();
        let video = if source_mute {
            let video_key = scratch_video_key(output);
            self.tx.extract_video(inputs[0], &video_key, false).await?;
            scratch.push(video_key.clone());
            video_key
        } else {
            inputs[0].to_string()
        };

        let filter = format!(
            "[0:a]aformat=sample_fmts=fltp:channel_layouts=stereo,volume=1[a1];\
             [1:a]aformat=sample_fmts=fltp:channel_layouts=stereo,volume=1,\
             adelay={delay_ms}|{delay_ms}|{delay_ms}[a2];\
             [a1][a2]amix=inputs=2:duration=first[aout]"
        );
        let options = vec![
            "-filter_complex".to_string(),
            filter,
            "-map".to_string(),
            "[aout]".to_string(),
            "-ac".to_string(),
            "2".to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-y".to_string(),
        ];

        self.tx
            .process(
                &[Source::new(&video), Source::new(inputs[1])],
                output,
                &options,
                publish,
                &[],
            )
            .await?;
        self.cleanup(&scratch).await;
        Ok(())
    }

    /// Concatenate every input into one file.
    ///
    /// Each input is first transcoded to a uniformly sized and rated `.ts`
    /// intermediate; a manifest lists the intermediates in input order; a
    /// single concat-demuxer invocation re-encodes to the final container.
    /// Any per-input failure aborts before the manifest is written.
    pub async fn concat(
        &self,
        inputs: &[&str],
        output: &str,
        options: &ThumbOptions,
        publish: bool,
    ) -> Result<()> {
        self.tx.ensure_inputs(inputs).await?;

        let mut scratch = Vec::new();
        let mut manifest = String::new();
        for (index, input) in inputs.iter().enumerate() {
            let segment_key = scratch_segment_key(output, index);
            self.tx.thumbnail(input, &segment_key, options, false).await?;
            let segment_path = self.tx.store().local_path(&segment_key);
            manifest.push_str(&format!("file '{}'\n", segment_path.display()));
            scratch.push(segment_key);
        }

        let list_key = scratch_list_key(output);
        let list_path = self.tx.store().local_path(&list_key);
        if let Some(parent) = list_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::subprocess(format!("failed to create manifest directory: {e}"), vec![])
            })?;
        }
        tokio::fs::write(&list_path, &manifest).await.map_err(|e| {
            Error::subprocess(format!("failed to write concat manifest: {e}"), vec![])
        })?;
        scratch.push(list_key.clone());

        self.tx
            .process(
                &[Source::new(&list_key)],
                output,
                &str_args(&["-c:v", "libx264", "-c:a", "copy", "-y"]),
                publish,
                &str_args(&["-f", "concat", "-safe", "0"]),
            )
            .await?;
        self.cleanup(&scratch).await;
        Ok(())
    }
}
