mod cli;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use clipflow_av::{check_tools, MediaInfo, Pipeline, ThumbOptions, Transcoder};
use clipflow_storage::LocalDiskStorage;
use std::path::Path;
use std::sync::Arc;

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "clipflow=trace,clipflow_av=trace,clipflow_storage=debug".to_string()
        } else {
            "clipflow=info,clipflow_av=info,clipflow_storage=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        // Pipeline failures carry stable numeric codes; pass them through.
        let code = e
            .downcast_ref::<clipflow_av::Error>()
            .map(|err| i32::from(err.code()))
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let command = match cli.command {
        Commands::CheckTools => return check_external_tools(),
        Commands::Validate { config: path } => {
            let path = path.or(cli.config);
            return validate_config(path.as_deref());
        }
        Commands::Version => {
            println!("clipflow {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        command => command,
    };

    let mut config = config::load_config_or_default(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config.root = root;
    }
    if !config.av.binary.contains('/') {
        // Bare binary names are resolved through PATH up front so a missing
        // tool fails before any storage work.
        let resolved = clipflow_av::require_tool(&config.av.binary)?;
        config.av.binary = resolved.to_string_lossy().into_owned();
    }
    tracing::debug!(root = %config.root.display(), binary = %config.av.binary, "configuration loaded");

    let store = Arc::new(LocalDiskStorage::new(&config.root)?);
    let tx = Transcoder::new(store, config.av.clone());
    let pipeline = Pipeline::new(tx);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(dispatch(command, &pipeline))
}

async fn dispatch(command: Commands, pipeline: &Pipeline) -> Result<()> {
    let tx = pipeline.transcoder();
    match command {
        Commands::Probe { key, json } => {
            let info = tx.probe(&key).await?;
            print_media_info(&key, &info, json)?;
        }
        Commands::Thumbnail { input, output } => {
            let options = ThumbOptions::from_config(tx.config());
            tx.thumbnail(&input, &output, &options, false).await?;
            println!("wrote {output}");
        }
        Commands::Frame { input, output, at } => {
            tx.frame(&input, &output, &at, false).await?;
            println!("wrote {output}");
        }
        Commands::ExtractAudio { input, output } => {
            tx.extract_audio(&input, &output, false).await?;
            println!("wrote {output}");
        }
        Commands::ExtractVideo { input, output } => {
            tx.extract_video(&input, &output, false).await?;
            println!("wrote {output}");
        }
        Commands::Resize {
            input,
            output,
            width,
            height,
        } => {
            tx.resize(&input, &output, width, height, false).await?;
            println!("wrote {output}");
        }
        Commands::Gif {
            input,
            output,
            frames,
        } => {
            tx.gif(&input, &output, frames, false).await?;
            println!("wrote {output}");
        }
        Commands::Overlay {
            first,
            second,
            output,
        } => {
            pipeline.overlay([&first, &second], &output, false).await?;
            println!("wrote {output}");
        }
        Commands::SameStyle {
            video,
            source,
            output,
            mute,
        } => {
            pipeline
                .same_style([&video, &source], &output, mute, false)
                .await?;
            println!("wrote {output}");
        }
        Commands::BgAudioLoop {
            video,
            audio,
            output,
        } => {
            pipeline
                .bg_audio_loop([&video, &audio], &output, false)
                .await?;
            println!("wrote {output}");
        }
        Commands::BgAudio {
            audio,
            video,
            output,
        } => {
            pipeline.bg_audio([&audio, &video], &output, false).await?;
            println!("wrote {output}");
        }
        Commands::BgAudioAt {
            video,
            audio,
            output,
            at_ms,
            mute,
        } => {
            pipeline
                .bg_audio_at([&video, &audio], &output, at_ms, mute, false)
                .await?;
            println!("wrote {output}");
        }
        Commands::Concat { inputs, output } => {
            let options = ThumbOptions::from_config(tx.config());
            let keys: Vec<&str> = inputs.iter().map(String::as_str).collect();
            pipeline.concat(&keys, &output, &options, false).await?;
            println!("wrote {output}");
        }
        Commands::CheckTools | Commands::Validate { .. } | Commands::Version => unreachable!(),
    }
    Ok(())
}

fn print_media_info(key: &str, info: &MediaInfo, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(info)?);
        return Ok(());
    }

    println!("Key: {key}");
    if let Some(ref duration) = info.duration {
        println!("Duration: {duration}");
    }
    if let Some(seconds) = info.seconds {
        println!("Seconds: {seconds}");
    }
    if let Some(bitrate) = info.bitrate {
        println!("Bitrate: {bitrate} kb/s");
    }
    if let (Some(w), Some(h)) = (info.width, info.height) {
        println!("Resolution: {w}x{h}");
    }
    if let Some(ref codec) = info.vcodec {
        println!("Video codec: {codec}");
    }
    if let Some(ref format) = info.vformat {
        println!("Pixel format: {format}");
    }
    if let Some(ref codec) = info.acodec {
        println!("Audio codec: {codec}");
    }
    if let Some(rate) = info.sample_rate {
        println!("Audio sample rate: {rate} Hz");
    }
    if let Some(size) = info.size {
        println!("Size: {size} bytes");
    }
    Ok(())
}

fn check_external_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = check_tools();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "ok     "
        } else {
            all_ok = false;
            "missing"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({version})");
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available.");
    } else {
        println!("Some tools are missing. Install them to enable all operations.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("Configuration is valid");
            println!("  Storage root: {}", config.root.display());
            println!("  Frame: {}x{}", config.av.width, config.av.height);
            println!("  Binary: {}", config.av.binary);
            println!("  Timeout: {}s", config.av.timeout_secs);
            println!("  Cleanup: {:?}", config.av.cleanup);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Storage root: {}", config.root.display());
            println!("  Frame: {}x{}", config.av.width, config.av.height);
        }
    }

    Ok(())
}
