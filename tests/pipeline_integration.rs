//! End-to-end tests for the crawl/download pipeline against mock servers.

use std::path::Path;
use std::sync::Arc;

use picgrab::download::Rejection;
use picgrab::pipeline::{ImageOutcome, process_image};
use picgrab::{
    FailureKind, HtmlImageExtractor, ImageDescriptor, PageId, PipelineError, Report, RunContext,
    Settings, parse_page_list,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(html),
        )
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, route: &str, content_type: &str, size: usize) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", content_type)
                .set_body_bytes(vec![0xAB; size]),
        )
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

fn settings_for(url: &str, output: &Path) -> Settings {
    Settings::new(url)
        .expect("valid url")
        .with_output_dir(output)
        .with_threads(2)
        .expect("valid thread count")
        .with_print_progress(false)
}

async fn run(settings: Settings) -> Result<Report, PipelineError> {
    picgrab::run(settings, Arc::new(HtmlImageExtractor::default())).await
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("readable dir")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_single_page_filters_small_and_dedupes_repeats() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    mount_page(
        &server,
        "/gallery",
        r#"<html><body>
            <img src="/img/icon.png">
            <img src="/img/photo.jpg">
            <img src="/img/photo.jpg">
        </body></html>"#,
    )
    .await;
    mount_image(&server, "/img/icon.png", "image/png", 5_000).await;
    mount_image(&server, "/img/photo.jpg", "image/jpeg", 50_000).await;

    let url = format!("{}/gallery", server.uri());
    let report = run(settings_for(&url, temp_dir.path())).await.expect("run succeeds");

    assert_eq!(report.found, 2, "small image excluded from found");
    assert_eq!(report.saved, 1);
    assert_eq!(report.already_saved, 1);
    assert!(report.errors.is_empty(), "unexpected errors: {:?}", report.errors);

    assert_eq!(file_names(temp_dir.path()), ["photo.jpg"]);
    let saved = std::fs::metadata(temp_dir.path().join("photo.jpg")).expect("saved file");
    assert_eq!(saved.len(), 50_000);
}

#[tokio::test]
async fn test_initial_page_failure_aborts_without_writes() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    mount_status(&server, "/gallery", 404).await;

    let url = format!("{}/gallery", server.uri());
    let result = run(settings_for(&url, temp_dir.path())).await;

    match result {
        Err(PipelineError::InitialPage { url: failed, .. }) => assert_eq!(failed, url),
        other => panic!("Expected InitialPage error, got: {other:?}"),
    }
    assert!(file_names(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_paginated_organized_run() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    mount_page(
        &server,
        "/blog/1",
        r#"<html><head><meta property="og:title" content="Day One: Arrival"></head>
        <body><img src="/img/a.jpg"><img src="/img/broken.jpg"></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/blog/2",
        r#"<html><head><title>Day Two</title></head>
        <body><a href="/img/b.png">full size</a></body></html>"#,
    )
    .await;
    mount_status(&server, "/blog/missing", 404).await;
    mount_image(&server, "/img/a.jpg", "image/jpeg", 20_000).await;
    mount_image(&server, "/img/b.png", "image/png", 30_000).await;
    mount_status(&server, "/img/broken.jpg", 500).await;

    let url = format!("{}/blog", server.uri());
    let settings = settings_for(&url, temp_dir.path())
        .with_pages(parse_page_list("1-2,missing").expect("valid list"))
        .with_organize(true);
    let report = run(settings).await.expect("run succeeds");

    assert_eq!(report.found, 3);
    assert_eq!(report.saved, 2);
    assert_eq!(report.already_saved, 0);
    assert_eq!(report.errors.len(), 2, "errors: {:?}", report.errors);

    assert!(temp_dir.path().join("Day One Arrival").join("a.jpg").is_file());
    assert!(temp_dir.path().join("Day Two").join("b.png").is_file());

    let broken = format!("{}/img/broken.jpg (page 1)", server.uri());
    let missing = format!("{}/blog/missing", server.uri());
    let listed: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
    assert!(listed.contains(&broken), "errors: {listed:?}");
    assert!(listed.contains(&missing), "errors: {listed:?}");
    assert!(report.errors.iter().all(|item| item.kind == FailureKind::Transport));

    let text = report.to_string();
    assert!(text.contains("Could not download:"));
    assert!(text.contains(&broken));
}

#[tokio::test]
async fn test_name_collision_with_different_content_gets_suffix() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    std::fs::write(temp_dir.path().join("photo.jpg"), b"someone else's photo").unwrap();

    mount_page(&server, "/post", r#"<img src="/img/photo.jpg">"#).await;
    mount_image(&server, "/img/photo.jpg", "image/jpeg", 40_000).await;

    let url = format!("{}/post", server.uri());
    let report = run(settings_for(&url, temp_dir.path())).await.expect("run succeeds");

    assert_eq!(report.saved, 1);
    assert_eq!(file_names(temp_dir.path()), ["photo (2).jpg", "photo.jpg"]);
    assert_eq!(
        std::fs::read(temp_dir.path().join("photo.jpg")).unwrap(),
        b"someone else's photo",
        "existing file must not be overwritten"
    );
}

#[tokio::test]
async fn test_second_run_reports_everything_already_saved() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    mount_page(&server, "/post", r#"<img src="/img/a.jpg"><img src="/img/b.webp">"#).await;
    mount_image(&server, "/img/a.jpg", "image/jpeg", 20_000).await;
    mount_image(&server, "/img/b.webp", "image/webp", 25_000).await;

    let url = format!("{}/post", server.uri());
    let first = run(settings_for(&url, temp_dir.path())).await.expect("first run");
    assert_eq!((first.saved, first.already_saved), (2, 0));

    let second = run(settings_for(&url, temp_dir.path())).await.expect("second run");
    assert_eq!((second.saved, second.already_saved), (0, 2));
    assert_eq!(file_names(temp_dir.path()), ["a.jpg", "b.webp"]);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    mount_page(&server, "/post", r#"<title>Trip</title><img src="/img/a.jpg">"#).await;
    mount_image(&server, "/img/a.jpg", "image/jpeg", 20_000).await;

    let url = format!("{}/post", server.uri());
    let settings = settings_for(&url, temp_dir.path())
        .with_organize(true)
        .with_dry_run(true);
    let report = run(settings).await.expect("run succeeds");

    assert_eq!(report.found, 1);
    assert_eq!(report.saved, 0);
    assert!(file_names(temp_dir.path()).is_empty(), "no folders or files created");
}

#[tokio::test]
async fn test_filename_from_content_disposition() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    mount_page(&server, "/post", r#"<img src="/download?id=7"><img src="/download/8">"#).await;
    Mock::given(method("GET"))
        .and(path("/download"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .insert_header("content-disposition", r#"attachment; filename="sunset.jpg""#)
                .set_body_bytes(vec![1u8; 15_000]),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/8"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .insert_header("content-disposition", "attachment; filename*=UTF-8''caf%C3%A9.jpeg")
                .set_body_bytes(vec![2u8; 15_000]),
        )
        .mount(&server)
        .await;

    let url = format!("{}/post", server.uri());
    let report = run(settings_for(&url, temp_dir.path())).await.expect("run succeeds");

    assert_eq!(report.saved, 2, "errors: {:?}", report.errors);
    assert_eq!(file_names(temp_dir.path()), ["café.jpg", "sunset.jpg"]);
}

#[tokio::test]
async fn test_process_image_outcomes() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    mount_image(&server, "/img/tiny.gif", "image/gif", 9_999).await;
    mount_image(&server, "/img/page.html", "text/html", 20_000).await;
    mount_image(&server, "/img/cat.png", "image/png", 10_000).await;

    let settings = settings_for(&server.uri(), temp_dir.path());
    let ctx = RunContext::new(settings, Arc::new(HtmlImageExtractor::default()))
        .expect("context builds");
    let image = |route: &str| {
        ImageDescriptor::new(format!("{}{route}", server.uri())).with_page(Some(PageId::from(4)))
    };

    assert_eq!(
        process_image(&ctx, image("/img/tiny.gif")).await,
        ImageOutcome::Rejected(Rejection::TooSmall { bytes: 9_999 })
    );
    assert_eq!(
        process_image(&ctx, image("/img/page.html")).await,
        ImageOutcome::Rejected(Rejection::NotAnImage {
            content_type: Some("text/html".to_string())
        })
    );
    assert_eq!(
        process_image(&ctx, image("/img/cat.png")).await,
        ImageOutcome::Saved(temp_dir.path().join("cat.png"))
    );
    assert_eq!(
        process_image(&ctx, image("/img/cat.png")).await,
        ImageOutcome::AlreadySaved
    );
    assert_eq!(process_image(&ctx, image("/img/gone.png")).await, ImageOutcome::Failed);

    let report = ctx.ledger().report();
    assert_eq!(report.saved, 1);
    assert_eq!(report.already_saved, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].context.as_deref(), Some("page 4"));
}

#[tokio::test]
async fn test_unwritable_destination_is_logged_not_fatal() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    mount_page(&server, "/post", r#"<title>Blocked</title><img src="/img/a.jpg">"#).await;
    mount_image(&server, "/img/a.jpg", "image/jpeg", 20_000).await;
    // A file where the title folder should go makes create_dir_all fail.
    std::fs::write(temp_dir.path().join("Blocked"), b"not a folder").unwrap();

    let url = format!("{}/post", server.uri());
    let settings = settings_for(&url, temp_dir.path()).with_organize(true);
    let report = run(settings).await.expect("run still succeeds");

    assert_eq!(report.saved, 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, FailureKind::Filesystem);
}

#[tokio::test]
async fn test_encoded_images_keep_size_screen_and_dedupe() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    mount_page(&server, "/post", r#"<img src="/img/tiny.png"><img src="/img/big.jpg">"#).await;
    for (route, content_type, size) in [
        ("/img/tiny.png", "image/png", 5_000),
        ("/img/big.jpg", "image/jpeg", 50_000),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", content_type)
                    .insert_header("content-encoding", "gzip")
                    .set_body_bytes(vec![0x1F; size]),
            )
            .mount(&server)
            .await;
    }

    let url = format!("{}/post", server.uri());
    let first = run(settings_for(&url, temp_dir.path())).await.expect("first run");
    assert_eq!((first.found, first.saved, first.already_saved), (1, 1, 0));

    let second = run(settings_for(&url, temp_dir.path())).await.expect("second run");
    assert_eq!((second.found, second.saved, second.already_saved), (1, 0, 1));
    assert_eq!(file_names(temp_dir.path()), ["big.jpg"]);
}
