//! Interactive prompts for values missing from the command line.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use album_dl_core::DEFAULT_CONCURRENCY;
use tracing::warn;

/// Output directory used when the prompt is left empty.
pub const DEFAULT_OUTPUT_DIR: &str = "downloaded_images";

const MAX_WORKERS: usize = 100;

/// Asks a question and returns the trimmed answer ("" on end of input).
pub fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> io::Result<String> {
    write!(output, "{question}")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Empty answer means the default directory.
pub fn parse_output_dir(answer: &str) -> PathBuf {
    if answer.is_empty() {
        PathBuf::from(DEFAULT_OUTPUT_DIR)
    } else {
        PathBuf::from(answer)
    }
}

/// Digits-only answers in 1-100 are taken as-is; anything else falls back to the default.
pub fn parse_workers(answer: &str) -> usize {
    if answer.is_empty() || !answer.chars().all(|c| c.is_ascii_digit()) {
        return DEFAULT_CONCURRENCY;
    }
    match answer.parse::<usize>() {
        Ok(n) if (1..=MAX_WORKERS).contains(&n) => n,
        _ => {
            warn!(
                answer,
                default = DEFAULT_CONCURRENCY,
                "worker count out of range, using default"
            );
            DEFAULT_CONCURRENCY
        }
    }
}

/// Values collected from an interactive session.
#[derive(Debug, PartialEq, Eq)]
pub struct Answers {
    pub url: String,
    pub output_dir: PathBuf,
    pub workers: usize,
}

/// Runs the three start-up prompts, skipping any value already known.
///
/// Reads answers line by line, so they may come from a terminal or a pipe.
pub fn collect<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    url: Option<String>,
    output_dir: Option<PathBuf>,
    workers: Option<usize>,
) -> io::Result<Answers> {
    let url = match url {
        Some(url) => url,
        None => ask(input, output, "Enter the album URL: ")?,
    };
    let output_dir = match output_dir {
        Some(dir) => dir,
        None => parse_output_dir(&ask(
            input,
            output,
            &format!("Enter output folder name (default: {DEFAULT_OUTPUT_DIR}): "),
        )?),
    };
    let workers = match workers {
        Some(n) => n,
        None => parse_workers(&ask(
            input,
            output,
            &format!("Enter maximum number of download threads (default: {DEFAULT_CONCURRENCY}): "),
        )?),
    };
    Ok(Answers {
        url,
        output_dir,
        workers,
    })
}
