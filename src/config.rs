//! Run settings consumed by the pipeline.
//!
//! [`Settings`] is built once (by the CLI, or directly by library users),
//! validated, and then only read by the worker pools.

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::download::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::queue::PageId;

/// Default worker count for both pools.
pub const DEFAULT_THREADS: usize = 4;

/// Maximum worker count for either pool.
pub const MAX_THREADS: usize = 64;

/// Largest page list a single `--pages` value may expand to.
pub const MAX_PAGES: usize = 10_000;

/// Longest accepted timeout, in seconds.
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Invalid settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Target URL does not parse or is not http(s).
    #[error("invalid target URL {url:?}: must be an absolute http(s) URL")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// A `--pages` value could not be expanded.
    #[error("invalid page list {list:?}: {reason}")]
    InvalidPageList {
        /// The rejected list.
        list: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Worker count out of range.
    #[error("invalid thread count {value}: must be between 1 and {MAX_THREADS}")]
    InvalidThreads {
        /// The rejected count.
        value: usize,
    },

    /// The output path exists but is not a directory.
    #[error("output path {path} is not a directory")]
    OutputNotDirectory {
        /// The rejected path.
        path: PathBuf,
    },

    /// Timeout out of range.
    #[error("invalid {field} {value}: must be between 1 and {MAX_TIMEOUT_SECS} seconds")]
    InvalidTimeout {
        /// Which timeout.
        field: &'static str,
        /// The rejected value.
        value: u64,
    },
}

/// Everything a run needs to know.
#[derive(Debug, Clone)]
pub struct Settings {
    target_url: String,
    title_filter_words: Vec<String>,
    dry_run: bool,
    organize: bool,
    pages: Option<Vec<PageId>>,
    threads: usize,
    output_dir: PathBuf,
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
    print_progress: bool,
}

impl Settings {
    /// Creates settings for a single, non-paginated page with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] unless `target_url` is absolute http(s).
    pub fn new(target_url: impl Into<String>) -> Result<Self, ConfigError> {
        let target_url = target_url.into();
        let valid = Url::parse(&target_url)
            .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host());
        if !valid {
            return Err(ConfigError::InvalidUrl { url: target_url });
        }

        Ok(Self {
            target_url,
            title_filter_words: Vec::new(),
            dry_run: false,
            organize: false,
            pages: None,
            threads: DEFAULT_THREADS,
            output_dir: PathBuf::from("."),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            print_progress: true,
        })
    }

    /// Enables pagination over the given page identifiers.
    #[must_use]
    pub fn with_pages(mut self, pages: Vec<PageId>) -> Self {
        self.pages = Some(pages);
        self
    }

    /// Sets the pool size for both phases.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidThreads`] outside `1..=MAX_THREADS`.
    pub fn with_threads(mut self, threads: usize) -> Result<Self, ConfigError> {
        if !(1..=MAX_THREADS).contains(&threads) {
            return Err(ConfigError::InvalidThreads { value: threads });
        }
        self.threads = threads;
        Ok(self)
    }

    /// Sets the connect and whole-request timeouts, in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeout`] for values outside `1..=3600`.
    pub fn with_timeouts(mut self, connect_secs: u64, read_secs: u64) -> Result<Self, ConfigError> {
        validate_timeout("connect timeout", connect_secs)?;
        validate_timeout("timeout", read_secs)?;
        self.connect_timeout_secs = connect_secs;
        self.read_timeout_secs = read_secs;
        Ok(self)
    }

    /// Words removed from page titles before they name folders.
    #[must_use]
    pub fn with_title_filter_words(mut self, words: Vec<String>) -> Self {
        self.title_filter_words = words;
        self
    }

    /// Diagnostic mode: resolve paths but write nothing.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Group images into one folder per page title.
    #[must_use]
    pub fn with_organize(mut self, organize: bool) -> Self {
        self.organize = organize;
        self
    }

    /// Root directory for every written path.
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Whether page and image URLs are echoed to stdout as they are fetched.
    #[must_use]
    pub fn with_print_progress(mut self, print_progress: bool) -> Self {
        self.print_progress = print_progress;
        self
    }

    /// The URL given by the user.
    #[must_use]
    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    /// Title filter words.
    #[must_use]
    pub fn title_filter_words(&self) -> &[String] {
        &self.title_filter_words
    }

    /// Diagnostic (dry-run) mode.
    #[must_use]
    pub fn debug_enabled(&self) -> bool {
        self.dry_run
    }

    /// Organizing mode.
    #[must_use]
    pub fn organize_enabled(&self) -> bool {
        self.organize
    }

    /// Whether pages are crawled through the page queue.
    #[must_use]
    pub fn pagination_enabled(&self) -> bool {
        self.pages.is_some()
    }

    /// Page identifiers to crawl; empty when pagination is off.
    #[must_use]
    pub fn page_list(&self) -> &[PageId] {
        self.pages.as_deref().unwrap_or_default()
    }

    /// Pool size.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.threads
    }

    /// Output root.
    #[must_use]
    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    /// Connect timeout in seconds.
    #[must_use]
    pub fn connect_timeout_secs(&self) -> u64 {
        self.connect_timeout_secs
    }

    /// Whole-request timeout in seconds.
    #[must_use]
    pub fn read_timeout_secs(&self) -> u64 {
        self.read_timeout_secs
    }

    /// Whether progress lines go to stdout.
    #[must_use]
    pub fn print_progress(&self) -> bool {
        self.print_progress
    }

    /// Checks that the output root is a directory or does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutputNotDirectory`] when a file is in the way.
    pub fn check_output_dir(&self) -> Result<(), ConfigError> {
        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(ConfigError::OutputNotDirectory {
                path: self.output_dir.clone(),
            });
        }
        Ok(())
    }

    /// URL of one page: the target with a trailing slash, then the page token.
    #[must_use]
    pub fn page_url(&self, page: &PageId) -> String {
        if self.target_url.ends_with('/') {
            format!("{}{page}", self.target_url)
        } else {
            format!("{}/{page}", self.target_url)
        }
    }
}

fn validate_timeout(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if !(1..=MAX_TIMEOUT_SECS).contains(&value) {
        return Err(ConfigError::InvalidTimeout { field, value });
    }
    Ok(())
}

/// Expands a page list such as `1-3,7,archive` into page identifiers.
///
/// Entries are comma-separated. `a-b` with numeric bounds expands to the
/// inclusive range; anything else is kept as an opaque token.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPageList`] for empty lists, descending
/// ranges, or lists longer than [`MAX_PAGES`].
pub fn parse_page_list(list: &str) -> Result<Vec<PageId>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidPageList {
        list: list.to_string(),
        reason,
    };

    let mut pages = Vec::new();
    for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match numeric_range(entry) {
            Some((start, end)) => {
                if start > end {
                    return Err(invalid(format!("range {entry} is descending")));
                }
                let count = usize::try_from(end - start).unwrap_or(usize::MAX).saturating_add(1);
                if pages.len().saturating_add(count) > MAX_PAGES {
                    return Err(invalid(format!("more than {MAX_PAGES} pages")));
                }
                pages.extend((start..=end).map(PageId::from));
            }
            None => pages.push(PageId::new(entry)),
        }

        if pages.len() > MAX_PAGES {
            return Err(invalid(format!("more than {MAX_PAGES} pages")));
        }
    }

    if pages.is_empty() {
        return Err(invalid("no pages given".to_string()));
    }
    Ok(pages)
}

fn numeric_range(entry: &str) -> Option<(u32, u32)> {
    let (start, end) = entry.split_once('-')?;
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}
