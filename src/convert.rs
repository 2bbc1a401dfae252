//! Conversion entry points.
//!
//! [`convert`] turns one PDF into a [`Transcript`]; [`convert_file`]
//! additionally enriches the metadata and writes the Hugo page;
//! [`convert_path`] drives whole directory trees, isolating per-file
//! failures so one bad PDF never aborts its siblings.

use crate::cache::FeedCache;
use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::feeds;
use crate::hugo;
use crate::pipeline::{assemble, extract, normalise, repair, tagger};
use crate::transcript::Transcript;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// Convert one PDF into a structured transcript.
///
/// Runs the full parse pipeline: extraction, tagging, assembly, the three
/// repair passes and the metadata normalisations. Feed enrichment and
/// output are left to [`convert_file`].
///
/// # Errors
/// Returns `Err(ConvertError)` only for fatal conditions: a missing or
/// corrupt file, an input whose layout does not match the script format,
/// or repair markers with nothing to repair against. Degraded inputs
/// (missing title page, page numbers or end marker) convert with warnings.
pub async fn convert(input: &Path, config: &ConversionConfig) -> Result<Transcript, ConvertError> {
    let pages = extract::load_script(input, &config.layout).await?;
    debug!("Extracted {} page(s) from {}", pages.len(), input.display());

    let tagged = tagger::tag_pages(&pages, &config.layout)?;
    let mut transcript = assemble::assemble(tagged)?;

    repair::extract_parentheticals(&mut transcript)?;
    repair::combine_more(&mut transcript)?;
    repair::split_short_dialogue(&mut transcript);

    normalise::run_all(&mut transcript);

    debug!(
        "Parsed {:?}: {} content entries",
        transcript.metadata.episode_title,
        transcript.content.len()
    );
    Ok(transcript)
}

/// Convert one PDF and write the Hugo page to `output`.
///
/// If `output` already exists, its frontmatter replaces the parsed
/// metadata, so hand-curated values survive reconversion. The episode
/// title override and the feed scrape then apply on top.
pub async fn convert_file(
    input: &Path,
    output: &Path,
    config: &ConversionConfig,
    cache: &mut FeedCache,
) -> Result<(), ConvertError> {
    info!("Converting: {} -> {}", input.display(), output.display());

    let mut transcript = convert(input, config).await?;

    if output.exists() {
        hugo::load_metadata(output, &mut transcript).await?;
    }
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
        .await?;
    }

    hugo::dump(&transcript, output).await
}

/// One file's progress within a batch conversion.
///
/// Reported to the callback of [`convert_path_with`], so a caller can
/// drive a progress display without re-implementing the batch walk.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    /// `input` is about to be converted; `index` is 0-based of `total`.
    Started {
        input: &'a Path,
        index: usize,
        total: usize,
    },
    /// The output already exists and overwriting is off.
    Skipped { input: &'a Path, output: &'a Path },
    Converted { input: &'a Path, output: &'a Path },
    Failed {
        input: &'a Path,
        error: &'a ConvertError,
    },
}

/// Convert a PDF file or a directory tree of PDFs.
///
/// For a directory input, `output` must be a directory; the input's
/// relative structure is recreated beneath it. Existing outputs are
/// skipped unless `config.overwrite` is set. Returns the number of files
/// converted.
pub async fn convert_path(
    input: &Path,
    output: &Path,
    config: &ConversionConfig,
    cache: &mut FeedCache,
) -> Result<usize, ConvertError> {
    convert_path_with(input, output, config, cache, |event| {
        if let BatchEvent::Failed { input, error } = event {
            error!("Failed to convert {}: {}", input.display(), error);
        }
    })
    .await
}

/// [`convert_path`] with a progress callback, invoked once per batch event.
pub async fn convert_path_with(
    input: &Path,
    output: &Path,
    config: &ConversionConfig,
    cache: &mut FeedCache,
    mut progress: impl FnMut(BatchEvent<'_>),
) -> Result<usize, ConvertError> {
    if input.is_dir() {
        if !output.is_dir() {
            return Err(ConvertError::OutputNotADirectory {
                output: output.to_path_buf(),
            });
        }
        convert_dir(input, output, config, cache, &mut progress).await
    } else if input.is_file() {
        if !config.overwrite && output.exists() {
            info!("Skipping: {} -> {}", input.display(), output.display());
            progress(BatchEvent::Skipped { input, output });
            return Ok(0);
        }
        convert_file(input, output, config, cache).await?;
        Ok(1)
    } else {
        Err(ConvertError::InvalidInput {
            path: input.to_path_buf(),
        })
    }
}

async fn convert_dir(
    input: &Path,
    output: &Path,
    config: &ConversionConfig,
    cache: &mut FeedCache,
    progress: &mut impl FnMut(BatchEvent<'_>),
) -> Result<usize, ConvertError> {
    let mut pdfs: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "pdf"))
        .collect();
    pdfs.sort();

    let total = pdfs.len();
    let mut converted = 0;
    for (index, pdf) in pdfs.iter().enumerate() {
        progress(BatchEvent::Started {
            input: pdf,
            index,
            total,
        });
        let output_file = make_output_path(pdf, input, output);
        if !config.overwrite && output_file.exists() {
            info!("Skipping: {} -> {}", pdf.display(), output_file.display());
            progress(BatchEvent::Skipped {
                input: pdf,
                output: &output_file,
            });
            continue;
        }
        // One bad PDF must not abort the rest of the batch.
        match convert_file(pdf, &output_file, config, cache).await {
            Ok(()) => {
                converted += 1;
                progress(BatchEvent::Converted {
                    input: pdf,
                    output: &output_file,
                });
            }
            Err(e) => progress(BatchEvent::Failed {
                input: pdf,
                error: &e,
            }),
        }
    }
    Ok(converted)
}

/// Compute the output path for a converted PDF.
///
/// Recreates the path of `inp` relative to `inp_base` under `out_base`,
/// with `.html` replacing `.pdf`. If Hugo page-bundle output
/// (`name/index.html`) already exists there, that file is returned
/// instead, so reconversion overwrites the bundle rather than creating a
/// sibling.
pub fn make_output_path(inp: &Path, inp_base: &Path, out_base: &Path) -> PathBuf {
    let rel = inp.strip_prefix(inp_base).unwrap_or(inp);
    let output_html = out_base.join(rel).with_extension("html");

    let stem = rel.file_stem().unwrap_or_default();
    let output_indexhtml = match rel.parent() {
        Some(parent) => out_base.join(parent).join(stem).join("index.html"),
        None => out_base.join(stem).join("index.html"),
    };

    if output_indexhtml.exists() {
        output_indexhtml
    } else {
        output_html
    }
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(input: &Path, config: &ConversionConfig) -> Result<Transcript, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_mirrors_the_input_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let out_base = tmp.path();
        let input_base = Path::new("input_base");

        let existing = out_base.join("bar").join("index.html");
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, "").unwrap();

        assert_eq!(
            make_output_path(&input_base.join("foo.pdf"), input_base, out_base),
            out_base.join("foo.html")
        );
        // bar/index.html exists: the page bundle wins.
        assert_eq!(
            make_output_path(&input_base.join("bar.pdf"), input_base, out_base),
            out_base.join("bar").join("index.html")
        );
        assert_eq!(
            make_output_path(&input_base.join("sub/baz.pdf"), input_base, out_base),
            out_base.join("sub").join("baz.html")
        );
    }

    #[tokio::test]
    async fn directory_input_requires_directory_output() {
        let tmp = tempfile::tempdir().unwrap();
        let out_file = tmp.path().join("out.html");
        std::fs::write(&out_file, "").unwrap();

        let config = ConversionConfig::default();
        let mut cache = FeedCache::open(tmp.path().join("feeds.json"));

        let err = convert_path(tmp.path(), &out_file, &config, &mut cache)
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::OutputNotADirectory { .. }));
    }

    #[tokio::test]
    async fn invalid_input_path_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ConversionConfig::default();
        let mut cache = FeedCache::open(tmp.path().join("feeds.json"));

        let err = convert_path(
            Path::new("/nonexistent/episode.pdf"),
            tmp.path(),
            &config,
            &mut cache,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn batch_progress_reports_each_file() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(input.join("episode.pdf"), b"%PDF-1.4 stub").unwrap();
        std::fs::write(output.join("episode.html"), "existing").unwrap();

        let config = ConversionConfig::default();
        let mut cache = FeedCache::open(tmp.path().join("feeds.json"));

        let mut events = Vec::new();
        let converted = convert_path_with(&input, &output, &config, &mut cache, |event| {
            events.push(match event {
                BatchEvent::Started { index, total, .. } => format!("started {index}/{total}"),
                BatchEvent::Skipped { .. } => "skipped".to_string(),
                BatchEvent::Converted { .. } => "converted".to_string(),
                BatchEvent::Failed { .. } => "failed".to_string(),
            });
        })
        .await
        .unwrap();

        assert_eq!(converted, 0);
        assert_eq!(events, vec!["started 0/1", "skipped"]);
    }

    #[tokio::test]
    async fn existing_single_file_output_is_skipped_without_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("episode.pdf");
        std::fs::write(&input, b"%PDF-1.4 stub").unwrap();
        let output = tmp.path().join("episode.html");
        std::fs::write(&output, "existing").unwrap();

        let config = ConversionConfig::default();
        let mut cache = FeedCache::open(tmp.path().join("feeds.json"));

        let converted = convert_path(&input, &output, &config, &mut cache)
            .await
            .unwrap();
        assert_eq!(converted, 0);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "existing");
    }
}
