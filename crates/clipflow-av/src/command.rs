//! Invocation assembly for the external media binary.
//!
//! An [`InvocationSpec`] is an explicit value built once per logical
//! operation and consumed exactly once by the runner. It holds ordered
//! input and output files, their per-file argument sets, and global
//! arguments, and renders them into a single argument vector.

use clipflow_storage::StorageGateway;
use regex::Regex;
use std::sync::LazyLock;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(http|https)://").expect("valid URL pattern"));

/// Whether a source is an absolute network URL that must be passed to the
/// binary verbatim instead of being resolved through the storage tier.
pub fn is_passthrough(source: &str) -> bool {
    URL_RE.is_match(source)
}

/// Resolve a storage key (or passthrough URL) to the form ffmpeg consumes.
///
/// Local-tier keys become filesystem paths; remote-tier keys become URLs.
pub fn resolve_source(store: &dyn StorageGateway, key: &str) -> String {
    if is_passthrough(key) {
        key.to_string()
    } else if store.is_local() {
        store.local_path(key).to_string_lossy().into_owned()
    } else {
        store.remote_url(key)
    }
}

/// One assembled subprocess invocation.
///
/// Arguments are token vectors, not shell strings: filter graphs and other
/// values with spaces or commas are single tokens and need no quoting.
#[derive(Debug, Clone, Default)]
pub struct InvocationSpec {
    global: Vec<String>,
    inputs: Vec<String>,
    input_args: Vec<Vec<String>>,
    outputs: Vec<String>,
    output_args: Vec<Vec<String>>,
}

impl InvocationSpec {
    /// Create an empty invocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append global arguments emitted before any input.
    pub fn global(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.global.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append one input file (already resolved to a path or URL).
    pub fn input(mut self, path: impl Into<String>) -> Self {
        self.inputs.push(path.into());
        self
    }

    /// Append one per-input argument set. Sets pair positionally with input
    /// files; an empty set is a valid placeholder that emits nothing.
    pub fn input_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.input_args
            .push(args.into_iter().map(Into::into).collect());
        self
    }

    /// Append one output file (already resolved to a local path).
    pub fn output(mut self, path: impl Into<String>) -> Self {
        self.outputs.push(path.into());
        self
    }

    /// Append one per-output argument set, paired like [`Self::input_args`].
    pub fn output_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.output_args
            .push(args.into_iter().map(Into::into).collect());
        self
    }

    /// Render the final argument vector.
    ///
    /// Order: global arguments, then `<input-args> -i <file>` per input, then
    /// `<output-args> <file>` per output. Per-file argument sets are emitted
    /// only when their count equals the file count; on any mismatch the sets
    /// are dropped entirely rather than mispaired.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = self.global.clone();

        let pair_inputs = self.input_args.len() == self.inputs.len();
        for (i, input) in self.inputs.iter().enumerate() {
            if pair_inputs {
                args.extend(self.input_args[i].iter().cloned());
            }
            args.push("-i".to_string());
            args.push(input.clone());
        }

        let pair_outputs = self.output_args.len() == self.outputs.len();
        for (i, output) in self.outputs.iter().enumerate() {
            if pair_outputs {
                args.extend(self.output_args[i].iter().cloned());
            }
            args.push(output.clone());
        }

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_matches_network_urls_only() {
        assert!(is_passthrough("http://cdn.example.com/v.mp4"));
        assert!(is_passthrough("https://cdn.example.com/v.mp4"));
        assert!(!is_passthrough("videos/v.mp4"));
        assert!(!is_passthrough("/abs/path/v.mp4"));
        assert!(!is_passthrough("ftp://cdn.example.com/v.mp4"));
    }

    #[test]
    fn renders_global_inputs_outputs_in_order() {
        let spec = InvocationSpec::new()
            .global(["-f", "concat"])
            .input("/tmp/list.txt")
            .output("/tmp/out.mp4")
            .output_args(["-c:v", "libx264", "-y"]);

        assert_eq!(
            spec.to_args(),
            vec!["-f", "concat", "-i", "/tmp/list.txt", "-c:v", "libx264", "-y", "/tmp/out.mp4"]
        );
    }

    #[test]
    fn pairs_input_args_positionally_when_counts_match() {
        let spec = InvocationSpec::new()
            .input("/tmp/a.mp4")
            .input_args(Vec::<String>::new())
            .input("/tmp/b.mp3")
            .input_args(["-stream_loop", "-1"])
            .output("/tmp/out.mp4")
            .output_args(["-shortest", "-y"]);

        assert_eq!(
            spec.to_args(),
            vec![
                "-i",
                "/tmp/a.mp4",
                "-stream_loop",
                "-1",
                "-i",
                "/tmp/b.mp3",
                "-shortest",
                "-y",
                "/tmp/out.mp4"
            ]
        );
    }

    #[test]
    fn drops_per_file_args_on_count_mismatch() {
        let spec = InvocationSpec::new()
            .input("/tmp/a.mp4")
            .input("/tmp/b.mp4")
            .input_args(["-ss", "00:00:01"])
            .output("/tmp/out.mp4");

        assert_eq!(
            spec.to_args(),
            vec!["-i", "/tmp/a.mp4", "-i", "/tmp/b.mp4", "/tmp/out.mp4"]
        );
    }

    #[test]
    fn empty_spec_renders_nothing() {
        assert!(InvocationSpec::new().to_args().is_empty());
    }
}
