//! Shared fixtures: a temp storage root and a stub ffmpeg binary.
//!
//! The stub appends every invocation's arguments to a log file. With exactly
//! two arguments (`-i <file>`) it behaves like a probe: it prints canned
//! diagnostics on stderr keyed off the file name and exits non-zero, the way
//! a real bare `ffmpeg -i` does. Otherwise it creates the file named by the
//! last argument and exits zero.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use clipflow_av::AvConfig;
use clipflow_storage::{LocalDiskStorage, StorageError, StorageGateway, StorageResult};
use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
    pub store: Arc<LocalDiskStorage>,
    pub config: AvConfig,
    pub log: PathBuf,
}

impl Fixture {
    /// Temp directory holding the stub, the log and the storage root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Seed an input file under the given key on the local tier.
    pub fn seed(&self, key: &str, contents: &[u8]) {
        let path = self.store.local_path(key);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// All stub invocations so far, one argument line per run.
    pub fn logged(&self) -> Vec<String> {
        match fs::read_to_string(&self.log) {
            Ok(text) => text.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Build a fixture around the standard stub script.
pub fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("ffmpeg.log");
    let stub = write_stub(dir.path(), &standard_stub_body(&log));
    let store = Arc::new(LocalDiskStorage::new(dir.path().join("store")).unwrap());
    let config = AvConfig {
        binary: stub.to_string_lossy().into_owned(),
        ..AvConfig::default()
    };
    Fixture {
        dir,
        store,
        config,
        log,
    }
}

/// Remote-tier stand-in: blobs live in memory, scratch files on disk.
pub struct MockRemote {
    local_root: PathBuf,
    remote: Mutex<HashMap<String, Bytes>>,
    fail_put: bool,
}

impl MockRemote {
    pub fn new(local_root: impl Into<PathBuf>) -> Self {
        Self {
            local_root: local_root.into(),
            remote: Mutex::new(HashMap::new()),
            fail_put: false,
        }
    }

    /// A remote that rejects every publish attempt.
    pub fn failing_puts(local_root: impl Into<PathBuf>) -> Self {
        Self {
            fail_put: true,
            ..Self::new(local_root)
        }
    }

    pub fn seed(&self, key: &str, contents: &[u8]) {
        self.remote
            .lock()
            .unwrap()
            .insert(key.to_string(), Bytes::copy_from_slice(contents));
    }

    pub fn published(&self, key: &str) -> Option<Bytes> {
        self.remote.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl StorageGateway for MockRemote {
    async fn exists(&self, key: &str) -> bool {
        self.remote.lock().unwrap().contains_key(key)
    }

    fn is_local(&self) -> bool {
        false
    }

    fn local_path(&self, key: &str) -> PathBuf {
        self.local_root.join(key)
    }

    fn remote_url(&self, key: &str) -> String {
        format!("https://cdn.test/{key}")
    }

    async fn make_dir(&self, key: &str) -> StorageResult<()> {
        tokio::fs::create_dir_all(self.local_root.join(key)).await?;
        Ok(())
    }

    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        if self.fail_put {
            return Err(StorageError::backend("upload rejected"));
        }
        self.remote.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.remote
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.remote.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Write an executable shell script to `dir` and return its path.
pub fn write_stub(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("ffmpeg-stub.sh");
    fs::write(&path, body).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Stub body with probe diagnostics keyed off the input file name.
pub fn standard_stub_body(log: &Path) -> String {
    format!(
        r#"#!/bin/sh
echo "$@" >> "{log}"
if [ "$#" -eq 2 ]; then
    case "$2" in
        *first*) cat >&2 <<'EOF'
  Duration: 00:00:20.00, start: 0.000000, bitrate: 600 kb/s
    Stream #0:0: Video: h264 (High), yuv420p, 1280x720, 500 kb/s, 25 fps
    Stream #0:1: Audio: aac (LC), 44100 Hz, stereo, fltp, 96 kb/s
EOF
        ;;
        *second*) cat >&2 <<'EOF'
  Duration: 00:00:10.00, start: 0.000000, bitrate: 600 kb/s
    Stream #0:0: Video: h264 (Main), yuv420p, 640x360, 500 kb/s, 25 fps
    Stream #0:1: Audio: aac (LC), 44100 Hz, stereo, fltp, 96 kb/s
EOF
        ;;
        *) cat >&2 <<'EOF'
  Duration: 00:01:30.00, start: 0.000000, bitrate: 500 kb/s
    Stream #0:0: Video: h264 (High), yuv420p, 1280x720, 400 kb/s, 25 fps
    Stream #0:1: Audio: aac (LC), 44100 Hz, stereo, fltp, 96 kb/s
EOF
        ;;
    esac
    exit 1
fi
for last in "$@"; do :; done
: > "$last"
exit 0
"#,
        log = log.display()
    )
}
