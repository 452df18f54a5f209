//! Download phase: screen, name and persist every queued image.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::{FailedItem, RunContext, join_workers, spawn_workers};
use crate::config::Settings;
use crate::download::{
    Candidate, ContentDescriptor, DiskSizes, Rejection, derive_filename, resolve_destination,
    sanitize_folder_name,
};
use crate::queue::ImageDescriptor;

/// What happened to one queued image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    /// Written to a new file.
    Saved(PathBuf),
    /// Identical content already on disk; nothing written.
    AlreadySaved,
    /// Skipped by the size/type screen.
    Rejected(Rejection),
    /// Diagnostic mode: the path it would have been written to, or `None`
    /// when the content is already saved.
    DryRun(Option<PathBuf>),
    /// Logged to the error log.
    Failed,
}

/// Drains the download queue with the configured number of workers.
#[instrument(skip(ctx), fields(workers = ctx.settings().thread_count(), images = ctx.downloads().len()))]
pub async fn run_download_pool(ctx: &Arc<RunContext>) {
    let handles = spawn_workers(ctx, ctx.settings().thread_count(), |ctx, id| async move {
        download_worker(&ctx, id).await;
    });
    join_workers(handles, "downloads").await;
    info!(failures = ctx.ledger().failure_count(), "all downloads processed");
}

async fn download_worker(ctx: &RunContext, id: usize) {
    let mut processed = 0usize;
    while let Some(image) = ctx.downloads().try_pop() {
        process_image(ctx, image).await;
        processed += 1;
    }
    debug!(worker = id, processed, "download worker finished");
}

/// Fetches, screens and persists one image, updating the run ledger.
///
/// The body is only read once the image has passed the screen and a fresh
/// destination has been resolved. Resolution and the write happen under the
/// context's filesystem lock, so concurrent workers never pick the same path.
#[instrument(skip(ctx, image), fields(url = %image.url))]
pub async fn process_image(ctx: &RunContext, image: ImageDescriptor) -> ImageOutcome {
    let context = image.fetch_context();
    let Some(response) = ctx.fetch_or_record(&image.url, context.clone()).await else {
        return ImageOutcome::Failed;
    };

    if let Err(rejection) = response.content().screen() {
        debug!(%rejection, "image skipped");
        ctx.ledger().mark_rejected();
        return ImageOutcome::Rejected(rejection);
    }

    ctx.announce(&image.url);
    let candidate = destination_candidate(ctx.settings(), &image, response.content());
    let expected_size = response.content().content_length;

    let _fs_guard = ctx.fs_lock.lock().await;
    let destination = match resolve_destination(candidate, expected_size, &DiskSizes) {
        Ok(destination) => destination,
        Err(e) => {
            warn!(error = %e, "no usable destination");
            ctx.ledger()
                .record_failure(FailedItem::persist(image.url.as_str(), context, &e));
            return ImageOutcome::Failed;
        }
    };

    if ctx.settings().debug_enabled() {
        match &destination {
            Some(path) => {
                debug!(path = %path.display(), "dry run, not writing");
                ctx.announce(&format!("  -> {}", path.display()));
            }
            None => debug!("dry run, content already saved"),
        }
        return ImageOutcome::DryRun(destination);
    }

    let Some(path) = destination else {
        debug!("content already saved");
        ctx.ledger().mark_already_saved();
        return ImageOutcome::AlreadySaved;
    };

    match response.save_to(&path).await {
        Ok(bytes) => {
            debug!(path = %path.display(), bytes, "image saved");
            ctx.ledger().mark_saved();
            ImageOutcome::Saved(path)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "image not saved");
            ctx.ledger()
                .record_failure(FailedItem::persist(image.url.as_str(), context, &e));
            ImageOutcome::Failed
        }
    }
}

/// First candidate path: the title folder in organizing mode, then the derived name.
fn destination_candidate(
    settings: &Settings,
    image: &ImageDescriptor,
    content: &ContentDescriptor,
) -> Candidate {
    let dir = if settings.organize_enabled() {
        settings
            .output_dir()
            .join(sanitize_folder_name(image.page_title.as_deref()))
    } else {
        settings.output_dir().to_path_buf()
    };
    Candidate::new(dir, derive_filename(&image.url, image.filename.as_deref(), content))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn jpeg(length: u64) -> ContentDescriptor {
        ContentDescriptor {
            content_type: Some("image/jpeg".to_string()),
            content_length: Some(length),
            content_disposition: None,
        }
    }

    #[test]
    fn test_candidate_flat_layout() {
        let settings = Settings::new("https://blog.example")
            .unwrap()
            .with_output_dir("out");
        let image = ImageDescriptor::new("https://cdn.example/img/cat.jpg")
            .with_page_title(Some("Trip".to_string()));
        let candidate = destination_candidate(&settings, &image, &jpeg(20_000));
        assert_eq!(candidate.path(), PathBuf::from("out/cat.jpg"));
    }

    #[test]
    fn test_candidate_organized_by_title() {
        let settings = Settings::new("https://blog.example")
            .unwrap()
            .with_output_dir("out")
            .with_organize(true);
        let image = ImageDescriptor::new("https://cdn.example/img/cat.jpg")
            .with_page_title(Some("Trip: Day/1".to_string()));
        let candidate = destination_candidate(&settings, &image, &jpeg(20_000));
        assert_eq!(candidate.path(), PathBuf::from("out/Trip Day1/cat.jpg"));
    }

    #[test]
    fn test_candidate_untitled_folder() {
        let settings = Settings::new("https://blog.example")
            .unwrap()
            .with_output_dir("out")
            .with_organize(true);
        let image = ImageDescriptor::new("https://cdn.example/img/cat.jpg");
        let candidate = destination_candidate(&settings, &image, &jpeg(20_000));
        assert_eq!(candidate.path(), PathBuf::from("out/Untitled/cat.jpg"));
    }

    #[test]
    fn test_candidate_prefers_explicit_filename() {
        let settings = Settings::new("https://blog.example").unwrap();
        let image = ImageDescriptor::new("https://cdn.example/img/123")
            .with_filename(Some("sunset".to_string()));
        let candidate = destination_candidate(&settings, &image, &jpeg(20_000));
        assert_eq!(candidate.name(), "sunset.jpg");
    }
}
