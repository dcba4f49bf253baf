use anyhow::{Context, Result};
use clipflow_av::AvConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration: a storage root plus the orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory of the local storage tier.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Transcode and pipeline settings.
    #[serde(default)]
    pub av: AvConfig,
}

fn default_root() -> PathBuf {
    PathBuf::from("./media")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            av: AvConfig::default(),
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./clipflow.toml",
        "~/.config/clipflow/config.toml",
        "/etc/clipflow/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.av.binary.is_empty() {
        anyhow::bail!("av.binary cannot be empty");
    }
    if config.av.width == 0 || config.av.height == 0 {
        anyhow::bail!("av.width and av.height must be non-zero");
    }
    if config.av.timeout_secs == 0 {
        anyhow::bail!("av.timeout_secs must be non-zero");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipflow_av::CleanupPolicy;
    use std::io::Write;

    #[test]
    fn parses_partial_toml_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
root = "/srv/clipflow"

[av]
width = 544
cleanup = "keep"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/clipflow"));
        assert_eq!(config.av.width, 544);
        assert_eq!(config.av.height, 960);
        assert_eq!(config.av.cleanup, CleanupPolicy::Keep);
        assert_eq!(config.av.binary, "ffmpeg");
    }

    #[test]
    fn rejects_zero_dimensions() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[av]\nwidth = 0\n").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config_or_default(None).unwrap();
        assert_eq!(config.av.threads, 4);
    }
}
