//! Page phase: fetch pages and queue the images they contain.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::{FailedItem, RunContext, join_workers, spawn_workers};
use crate::download::FetchError;
use crate::queue::PageId;

/// Drains the page queue with the configured number of workers.
///
/// Returns once every worker has exited. Failed pages are logged to the
/// error log and skipped.
#[instrument(skip(ctx), fields(workers = ctx.settings().thread_count(), pages = ctx.pages().len()))]
pub async fn run_page_pool(ctx: &Arc<RunContext>) {
    let handles = spawn_workers(ctx, ctx.settings().thread_count(), |ctx, id| async move {
        page_worker(&ctx, id).await;
    });
    join_workers(handles, "pages").await;
    info!(queued = ctx.downloads().len(), "all pages processed");
}

async fn page_worker(ctx: &RunContext, id: usize) {
    let mut crawled = 0usize;
    while let Some(page) = ctx.pages().try_pop() {
        let url = ctx.settings().page_url(&page);
        ctx.announce(&url);
        match crawl_page(ctx, &url, Some(page)).await {
            Ok(_) => crawled += 1,
            Err(e) => {
                warn!(url = %url, error = %e, "page skipped");
                ctx.ledger().record_failure(FailedItem::transport(url.as_str(), None, &e));
            }
        }
    }
    debug!(worker = id, crawled, "page worker finished");
}

/// Fetches one page and pushes every extracted image onto the download queue.
///
/// Returns the number of images queued.
///
/// # Errors
///
/// Returns the [`FetchError`] if the page or its body could not be fetched.
/// Nothing is recorded in the error log; the caller decides whether the
/// failure is fatal.
#[instrument(skip(ctx, page), fields(url = %url))]
pub async fn crawl_page(
    ctx: &RunContext,
    url: &str,
    page: Option<PageId>,
) -> Result<usize, FetchError> {
    let html = ctx.fetcher.fetch(url).await?.text().await?;
    let images = ctx.parser.extract(url, &html, page.as_ref());
    let count = images.len();
    ctx.downloads().extend(images);
    debug!(count, "queued images from page");
    Ok(count)
}
