//! CLI entry point for the album downloader.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use album_dl_core::download::REQUEST_TIMEOUT_SECS;
use album_dl_core::{
    AlbumSelectors, AlbumWalker, BackoffPolicy, DownloadEngine, FilenameScheme, HttpClient,
    TaskSource, UrlListSource,
};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

mod cli;
mod progress;
mod prompt;

use cli::Args;
use progress::Reporter;

/// Where tasks come from for this run.
enum Input {
    Album(String),
    UrlList(String),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let (input, output_dir, workers) = match resolve_input(&args)? {
        Some(resolved) => resolved,
        None => {
            info!("No album URL provided. Pass one as an argument or enter it when prompted.");
            info!("Example: album-dl https://www.flickr.com/photos/<user>/albums/<id>");
            return Ok(());
        }
    };

    let client = HttpClient::with_timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .context("failed to build HTTP client")?;
    let engine = DownloadEngine::new(workers, BackoffPolicy::default(), client.clone())?;
    let naming = FilenameScheme::new(&args.name_prefix, "jpg");

    let mut source: Box<dyn TaskSource> = match input {
        Input::Album(url) => {
            info!("Navigating to {url}");
            let selectors = AlbumSelectors {
                image: args.image_selector.clone(),
                next_page: args.next_selector.clone(),
            };
            Box::new(AlbumWalker::new(client, &url, &output_dir, selectors, naming)?)
        }
        Input::UrlList(text) => {
            let list = UrlListSource::from_text(&text, &output_dir, naming);
            for skipped in list.skipped() {
                warn!(skipped = %skipped, "Skipped unrecognized input");
            }
            info!(urls = list.len(), "Parsed input");
            Box::new(list)
        }
    };

    let use_spinner = !args.quiet && io::stderr().is_terminal();
    let mut reporter = Reporter::new(use_spinner);
    let summary = engine
        .run_source(source.as_mut(), |outcome| reporter.report(outcome))
        .await;
    reporter.finish();

    if let Some(error) = &summary.source_error {
        warn!(error = %error, "Stopped early: the album could not be walked further");
    }

    let stats = engine.stats();
    info!(
        pages = summary.batches,
        completed = stats.completed(),
        failed = stats.failed(),
        retried = stats.retried(),
        rate_limited = stats.rate_limited(),
        "Download complete"
    );
    info!(
        "All images downloaded to {} folder. Total: {} images.",
        output_dir.display(),
        summary.submitted
    );

    Ok(())
}

/// Works out the input, output directory and worker count from flags and
/// start-up prompts. `None` means there is nothing to do.
///
/// Prompts read stdin line by line whether or not it is a terminal, so
/// answers can be piped in. URL-list mode is only entered through
/// `--urls-file`.
fn resolve_input(args: &Args) -> Result<Option<(Input, PathBuf, usize)>> {
    let flag_output = args.output_dir.clone();
    let flag_workers = args.workers.map(usize::from);

    if let Some(path) = &args.urls_file {
        let text = if path.as_os_str() == "-" {
            read_stdin()?
        } else {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read URL list {}", path.display()))?
        };
        return Ok(Some((
            Input::UrlList(text),
            flag_output.unwrap_or_else(|| PathBuf::from(prompt::DEFAULT_OUTPUT_DIR)),
            args.workers_or_default(),
        )));
    }

    // With the URL on the command line, only a terminal is asked for the rest.
    if let Some(url) = &args.url {
        let complete = flag_output.is_some() && flag_workers.is_some();
        if complete || !io::stdin().is_terminal() {
            return Ok(Some((
                Input::Album(url.clone()),
                flag_output.unwrap_or_else(|| PathBuf::from(prompt::DEFAULT_OUTPUT_DIR)),
                args.workers_or_default(),
            )));
        }
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let answers = prompt::collect(
        &mut input,
        &mut output,
        args.url.clone(),
        flag_output,
        flag_workers,
    )
    .context("failed to read start-up answers")?;

    if answers.url.is_empty() {
        return Ok(None);
    }
    Ok(Some((
        Input::Album(answers.url),
        answers.output_dir,
        answers.workers,
    )))
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read stdin")?;
    Ok(buffer)
}
