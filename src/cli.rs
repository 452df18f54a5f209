//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use picgrab::config::{DEFAULT_THREADS, MAX_THREADS};
use picgrab::download::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use picgrab::{ConfigError, Settings, parse_page_list};

/// Crawl a blog-style site and download the images on its pages.
///
/// Images are filtered by size and type, named from headers or the URL,
/// and never overwrite a different image already on disk.
#[derive(Parser, Debug)]
#[command(name = "picgrab")]
#[command(author, version, about)]
pub struct Args {
    /// Page (or paginated base) URL to crawl
    pub url: String,

    /// Crawl these pages of the target: comma-separated ids, `a-b` ranges (e.g. 1-3,7)
    #[arg(short, long, value_name = "LIST")]
    pub pages: Option<String>,

    /// Workers per phase (1-64)
    #[arg(short, long, default_value_t = DEFAULT_THREADS as u8, value_parser = clap::value_parser!(u8).range(1..=MAX_THREADS as i64))]
    pub threads: u8,

    /// Save images into one folder per page title
    #[arg(short, long)]
    pub organize: bool,

    /// Word to remove from page titles before naming folders (repeatable)
    #[arg(short, long, value_name = "WORD")]
    pub filter: Vec<String>,

    /// Resolve and print destination paths without writing anything (implies debug logging)
    #[arg(long)]
    pub debug: bool,

    /// Directory all files and folders are written under
    #[arg(short = 'd', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Connect timeout in seconds (1-3600)
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: u64,

    /// Whole-request timeout in seconds (1-3600)
    #[arg(long, default_value_t = READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: u64,

    /// Print the final report as JSON and suppress progress lines
    #[arg(long)]
    pub json: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Validated run settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a bad URL or page list.
    pub fn to_settings(&self) -> Result<Settings, ConfigError> {
        let settings = Settings::new(self.url.as_str())?
            .with_threads(usize::from(self.threads))?
            .with_timeouts(self.connect_timeout, self.timeout)?
            .with_title_filter_words(self.filter.clone())
            .with_dry_run(self.debug)
            .with_organize(self.organize)
            .with_output_dir(&self.output_dir)
            .with_print_progress(!self.json);

        match &self.pages {
            Some(list) => Ok(settings.with_pages(parse_page_list(list)?)),
            None => Ok(settings),
        }
    }

    /// Default log level when `RUST_LOG` is unset.
    ///
    /// Priority: quiet flag > debug flag > verbose count > info.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.debug {
            "debug"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}
