use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use vidsub::config::Config;
use vidsub::{pipeline, VidsubError};

#[derive(Parser)]
#[command(name = "vidsub")]
#[command(version, about = "Download videos with subtitles and translate them")]
#[command(
    long_about = "Download a video with its subtitles via yt-dlp, then machine-translate the subtitle track with the Claude API, preserving timing. Pass an existing .vtt file or video folder instead of a URL to translate without downloading."
)]
struct Cli {
    /// Video URL, or a .vtt file / video folder to translate
    input: String,

    /// Output directory for downloads
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Target language for subtitle translation (e.g. Vietnamese, Spanish)
    #[arg(short, long)]
    translate_to: Option<String>,

    /// Skip subtitle translation entirely
    #[arg(long)]
    no_translate: bool,

    /// Cues per translation request
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Hide progress bars
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(lang) = cli.translate_to {
        config.translation.target_language = lang;
    }
    if let Some(batch) = cli.batch_size {
        config.translation.batch_size = batch;
    }
    if cli.no_translate {
        config.translation.enabled = false;
    }
    config.validate().context("Configuration validation failed")?;

    let show_progress = !cli.quiet;
    let local_path = PathBuf::from(&cli.input);

    if local_path.exists() {
        if !config.translation.enabled {
            anyhow::bail!("Nothing to do: translation disabled and input is a local path");
        }
        let outcomes = pipeline::run_translate_only(&local_path, &config, show_progress)
            .await
            .map_err(describe)?;
        pipeline::print_translation_summary(&outcomes);
    } else {
        let report = pipeline::run_url(&cli.input, &config, show_progress)
            .await
            .map_err(describe)?;
        pipeline::print_summary(&report);
    }

    Ok(())
}

/// Attach a user-actionable hint to errors the user can fix themselves.
fn describe(error: VidsubError) -> anyhow::Error {
    match &error {
        VidsubError::Auth(_) => {
            anyhow::Error::new(error).context("Check your ANTHROPIC_API_KEY")
        }
        VidsubError::Download(_) => {
            anyhow::Error::new(error).context("Check the URL and your network connection")
        }
        _ => anyhow::Error::new(error),
    }
}
