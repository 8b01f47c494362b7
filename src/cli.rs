//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use album_dl_core::DEFAULT_CONCURRENCY;
use album_dl_core::source::{DEFAULT_IMAGE_SELECTOR, DEFAULT_NEXT_SELECTOR, DEFAULT_PREFIX};
use clap::Parser;

/// Download every image from a public photo album.
///
/// Walks the album page by page and downloads each image with a bounded
/// worker pool, backing off when the server rate limits. Without a URL the
/// album URL, output folder and worker count are read from start-up prompts.
#[derive(Parser, Debug)]
#[command(name = "album-dl")]
#[command(author, version, about)]
pub struct Args {
    /// Album URL to start from (prompted for when omitted)
    pub url: Option<String>,

    /// Directory to write images into [default: downloaded_images]
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum concurrent downloads (1-100) [default: 10]
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub workers: Option<u8>,

    /// Download image URLs listed in this file instead of walking an album ("-" for stdin)
    #[arg(long, conflicts_with = "url")]
    pub urls_file: Option<PathBuf>,

    /// CSS selector matching album images
    #[arg(long, default_value = DEFAULT_IMAGE_SELECTOR)]
    pub image_selector: String,

    /// CSS selector matching the next-page link (or an element inside it)
    #[arg(long, default_value = DEFAULT_NEXT_SELECTOR)]
    pub next_selector: String,

    /// Prefix for sequential file names (<prefix>_<n>.jpg)
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub name_prefix: String,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error log output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Worker count from the flag, or the default.
    pub fn workers_or_default(&self) -> usize {
        self.workers.map_or(DEFAULT_CONCURRENCY, usize::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["album-dl"]).unwrap();
        assert!(args.url.is_none());
        assert!(args.output_dir.is_none());
        assert!(args.workers.is_none());
        assert_eq!(args.workers_or_default(), 10);
        assert_eq!(args.image_selector, "div.photo img");
        assert_eq!(args.name_prefix, "flickr_image");
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_positional_url() {
        let args = Args::try_parse_from(["album-dl", "https://example.com/album"]).unwrap();
        assert_eq!(args.url.as_deref(), Some("https://example.com/album"));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["album-dl", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_output_dir_short_and_long() {
        let args = Args::try_parse_from(["album-dl", "-o", "pics"]).unwrap();
        assert_eq!(args.output_dir, Some(PathBuf::from("pics")));
        let args = Args::try_parse_from(["album-dl", "--output-dir", "pics2"]).unwrap();
        assert_eq!(args.output_dir, Some(PathBuf::from("pics2")));
    }

    #[test]
    fn test_cli_workers_bounds() {
        let args = Args::try_parse_from(["album-dl", "-w", "1"]).unwrap();
        assert_eq!(args.workers_or_default(), 1);
        let args = Args::try_parse_from(["album-dl", "--workers", "100"]).unwrap();
        assert_eq!(args.workers_or_default(), 100);

        let err = Args::try_parse_from(["album-dl", "-w", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        let err = Args::try_parse_from(["album-dl", "-w", "101"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_urls_file_conflicts_with_url() {
        let err = Args::try_parse_from([
            "album-dl",
            "https://example.com/album",
            "--urls-file",
            "list.txt",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["album-dl", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["album-dl", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
