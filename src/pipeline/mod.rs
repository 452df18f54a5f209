//! Two-phase crawl/download pipeline.
//!
//! A run has two strictly sequential phases, each driven by a fixed pool of
//! tokio tasks pulling from a [`WorkQueue`]:
//!
//! 1. **Pages**: fetch every page and push the images the [`PageParser`]
//!    finds onto the download queue. Without pagination the single target
//!    page is fetched directly, and failing to fetch it aborts the run.
//! 2. **Downloads**: screen, name and persist every queued image.
//!
//! Both queues are fully populated before their pool starts, so a worker
//! exits as soon as its queue is empty. All shared state lives in one
//! [`RunContext`] behind an `Arc`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use picgrab::{HtmlImageExtractor, Settings, parse_page_list};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::new("https://blog.example/")?
//!     .with_pages(parse_page_list("1-5")?)
//!     .with_organize(true);
//! let report = picgrab::run(settings, Arc::new(HtmlImageExtractor::default())).await?;
//! print!("{report}");
//! # Ok(())
//! # }
//! ```

mod downloads;
mod pages;
mod report;
mod tally;

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

pub use downloads::{ImageOutcome, process_image, run_download_pool};
pub use pages::{crawl_page, run_page_pool};
pub use report::Report;
pub use tally::{FailedItem, FailureKind, Ledger};

use crate::config::{ConfigError, Settings};
use crate::download::{FetchError, FetchedResponse, HttpFetcher};
use crate::parser::PageParser;
use crate::queue::{ImageDescriptor, PageId, WorkQueue};

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The only page of a non-paginated run could not be fetched.
    #[error("could not fetch initial page {url}")]
    InitialPage {
        /// The target URL.
        url: String,
        /// Why the fetch failed.
        #[source]
        source: FetchError,
    },

    /// Settings rejected at start-up.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// State shared by every worker of a run.
pub struct RunContext {
    settings: Settings,
    fetcher: HttpFetcher,
    parser: Arc<dyn PageParser>,
    pages: WorkQueue<PageId>,
    downloads: WorkQueue<ImageDescriptor>,
    ledger: Ledger,
    /// Serializes destination resolution and file writes across workers.
    fs_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("settings", &self.settings)
            .field("pages", &self.pages.len())
            .field("downloads", &self.downloads.len())
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

impl RunContext {
    /// Builds the context, including the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the output path exists but is not
    /// a directory, and [`PipelineError::Client`] if the client cannot be built.
    pub fn new(settings: Settings, parser: Arc<dyn PageParser>) -> Result<Self, PipelineError> {
        settings.check_output_dir()?;
        let fetcher = HttpFetcher::new_with_timeouts(
            settings.connect_timeout_secs(),
            settings.read_timeout_secs(),
        )?;

        Ok(Self {
            settings,
            fetcher,
            parser,
            pages: WorkQueue::new(),
            downloads: WorkQueue::new(),
            ledger: Ledger::new(),
            fs_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Run settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Page identifiers still to crawl.
    #[must_use]
    pub fn pages(&self) -> &WorkQueue<PageId> {
        &self.pages
    }

    /// Images still to download.
    #[must_use]
    pub fn downloads(&self) -> &WorkQueue<ImageDescriptor> {
        &self.downloads
    }

    /// Counters and error log.
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Fetches `url`, logging any failure to the error log with `context`.
    pub(crate) async fn fetch_or_record(
        &self,
        url: &str,
        context: Option<String>,
    ) -> Option<FetchedResponse> {
        match self.fetcher.fetch(url).await {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(url = %url, error = %e, "fetch failed");
                self.ledger.record_failure(FailedItem::transport(url, context, &e));
                None
            }
        }
    }

    /// Echoes a progress line to stdout unless progress output is off.
    pub(crate) fn announce(&self, line: &str) {
        if self.settings.print_progress() {
            println!("{line}");
        }
    }
}

/// Runs both phases and returns the final report.
///
/// # Errors
///
/// Returns [`PipelineError::InitialPage`] when a non-paginated run cannot
/// fetch its page; nothing is downloaded in that case. Per-image and
/// per-page failures never abort a run; they are listed in the report.
#[instrument(skip_all, fields(url = %settings.target_url()))]
pub async fn run(settings: Settings, parser: Arc<dyn PageParser>) -> Result<Report, PipelineError> {
    let ctx = Arc::new(RunContext::new(settings, parser)?);

    if ctx.settings.pagination_enabled() {
        ctx.pages.extend(ctx.settings.page_list().iter().cloned());
        ctx.announce("Fetching source for:");
        run_page_pool(&ctx).await;
    } else {
        ctx.announce("Fetching page source...");
        let url = ctx.settings.target_url().to_string();
        crawl_page(&ctx, &url, None)
            .await
            .map_err(|source| PipelineError::InitialPage { url, source })?;
    }

    let discovered = ctx.downloads.len();
    ctx.ledger.set_found(discovered);
    info!(discovered, "page phase complete");

    ctx.announce("\nStarting download:");
    run_download_pool(&ctx).await;

    let report = ctx.ledger.report();
    info!(
        found = report.found,
        saved = report.saved,
        already_saved = report.already_saved,
        errors = report.errors.len(),
        "run complete"
    );
    Ok(report)
}

/// Spawns `count` workers running `worker` on a shared context.
fn spawn_workers<F, Fut>(ctx: &Arc<RunContext>, count: usize, worker: F) -> Vec<JoinHandle<()>>
where
    F: Fn(Arc<RunContext>, usize) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    (0..count)
        .map(|id| tokio::spawn(worker(Arc::clone(ctx), id)))
        .collect()
}

/// Waits for every worker; a panicked worker is logged, not propagated.
async fn join_workers(handles: Vec<JoinHandle<()>>, phase: &'static str) {
    for handle in handles {
        if let Err(e) = handle.await {
            warn!(phase, error = %e, "worker task panicked");
        }
    }
}
