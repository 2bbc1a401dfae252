//! CLI binary for script2hugo.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, drives single-file or batch conversion and owns the
//! feed cache for the lifetime of the run.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use script2hugo::{
    convert, convert_file, convert_path_with, feeds, hugo, BatchEvent, ConversionConfig,
    FeedCache, DEFAULT_RSS_URL,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one transcript to stdout
  script2hugo panopticon.pdf

  # Convert to a Hugo content page
  script2hugo panopticon.pdf -o content/transcripts/panopticon.html

  # Convert a whole season, skipping already-converted episodes
  script2hugo scripts/season-4/ -o content/transcripts/

  # Reconvert everything, fixing the episode title by hand
  script2hugo panopticon.pdf -o panopticon.html -O --episode-title "Panopticon"

  # Work offline
  script2hugo panopticon.pdf --skip-scraping

OUTPUT FORMAT:
  A Hugo content page: TOML frontmatter (+++ fences) holding title, date
  and params (series, season, season_episode_number, cover_url), followed
  by one <p class="{role}"> element per script entry.

METADATA:
  Publish date, season, episode number and cover art are scraped from the
  podcast RSS feed by fuzzy-matching the episode title. Fetched feeds are
  cached (with HTTP revalidation) under the user cache directory.
"#;

/// Convert screenplay-style transcript PDFs into Hugo HTML pages.
#[derive(Parser, Debug)]
#[command(
    name = "script2hugo",
    version,
    about = "Convert screenplay-style transcript PDFs into Hugo HTML pages",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file, or a directory tree of PDFs.
    input: PathBuf,

    /// Output file (or directory, when the input is a directory).
    /// Defaults to stdout for a file input.
    #[arg(short, long, env = "SCRIPT2HUGO_OUTPUT")]
    output: Option<PathBuf>,

    /// Override the episode title as parsed from the PDF.
    #[arg(long)]
    episode_title: Option<String>,

    /// Skip scraping extra metadata from the RSS feed.
    #[arg(long)]
    skip_scraping: bool,

    /// URL (or local file) of the podcast RSS feed.
    #[arg(long, env = "SCRIPT2HUGO_RSS_URL", default_value = DEFAULT_RSS_URL)]
    rss_url: String,

    /// Allow overwriting existing output files.
    #[arg(short = 'O', long)]
    overwrite: bool,

    /// Feed cache file. Defaults to the user cache directory.
    #[arg(long, env = "SCRIPT2HUGO_CACHE")]
    cache_file: Option<PathBuf>,

    /// HTTP timeout for feed fetches, in seconds.
    #[arg(long, default_value_t = 30)]
    fetch_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ConversionConfig::builder()
        .skip_scraping(cli.skip_scraping)
        .rss_url(cli.rss_url.clone())
        .overwrite(cli.overwrite)
        .fetch_timeout_secs(cli.fetch_timeout);
    if let Some(title) = &cli.episode_title {
        builder = builder.episode_title(title.clone());
    }
    let config = builder.build().context("Invalid configuration")?;

    let cache_path = cli
        .cache_file
        .clone()
        .unwrap_or_else(FeedCache::default_path);
    let mut cache = FeedCache::open(cache_path);

    // ── Run conversion ───────────────────────────────────────────────────
    let result = run(&cli, &config, &mut cache).await;

    if let Err(e) = cache.save() {
        tracing::warn!("Could not save feed cache: {}", e);
    }
    result
}

async fn run(cli: &Cli, config: &ConversionConfig, cache: &mut FeedCache) -> Result<()> {
    match &cli.output {
        None => convert_to_stdout(&cli.input, config, cache).await,
        Some(output) if cli.input.is_dir() => {
            convert_batch(&cli.input, output, config, cache, cli.quiet).await
        }
        Some(output) => {
            if !config.overwrite && output.exists() {
                eprintln!(
                    "Skipping: {} -> {} (use -O to overwrite)",
                    cli.input.display(),
                    output.display()
                );
                return Ok(());
            }
            convert_file(&cli.input, output, config, cache)
                .await
                .context("Conversion failed")?;
            if !cli.quiet {
                eprintln!("Wrote {}", output.display());
            }
            Ok(())
        }
    }
}

/// Convert a single PDF and print the Hugo page to stdout.
async fn convert_to_stdout(
    input: &Path,
    config: &ConversionConfig,
    cache: &mut FeedCache,
) -> Result<()> {
    let mut transcript = convert(input, config).await.context("Conversion failed")?;

    if let Some(title) = &config.episode_title {
        transcript.metadata.episode_title = Some(title.clone());
    }
    if !config.skip_scraping {
        feeds::scrape_episode_metadata(
            &mut transcript,
            &config.rss_url,
            cache,
            config.fetch_timeout_secs,
        )
        .await
        .context("Metadata scraping failed")?;
    }

    let page = hugo::dumps(&transcript).context("Serialisation failed")?;
    io::stdout()
        .lock()
        .write_all(page.as_bytes())
        .context("Failed to write to stdout")?;
    Ok(())
}

/// Convert every PDF below `input`, with a progress bar driven by the
/// library's batch events.
async fn convert_batch(
    input: &Path,
    output: &Path,
    config: &ConversionConfig,
    cache: &mut FeedCache,
    quiet: bool,
) -> Result<()> {
    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Converting");
        bar
    };

    let mut converted = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;

    let result = convert_path_with(input, output, config, cache, |event| match event {
        BatchEvent::Started { input, index, total } => {
            if index == 0 {
                bar.set_length(total as u64);
            }
            bar.set_message(
                input
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
        }
        BatchEvent::Skipped { .. } => {
            skipped += 1;
            bar.inc(1);
        }
        BatchEvent::Converted { .. } => {
            converted += 1;
            bar.inc(1);
        }
        BatchEvent::Failed { input, error } => {
            failed += 1;
            bar.println(format!("✗ {}: {}", input.display(), error));
            bar.inc(1);
        }
    })
    .await;
    bar.finish_and_clear();
    result.context("Batch conversion failed")?;

    if !quiet {
        eprintln!(
            "{} converted, {} skipped, {} failed (of {} PDFs)",
            converted,
            skipped,
            failed,
            converted + skipped + failed
        );
    }
    if failed > 0 && converted == 0 && skipped == 0 {
        anyhow::bail!("All conversions failed");
    }
    Ok(())
}
