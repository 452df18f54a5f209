//! Default HTML image extractor built on `scraper`.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

use super::PageParser;
use crate::download::IMAGE_EXTENSIONS;
use crate::queue::{ImageDescriptor, PageId};

#[allow(clippy::expect_used)]
static IMAGE_OR_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img, a[href]").expect("valid selector"));

#[allow(clippy::expect_used)]
static NESTED_IMAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid selector"));

#[allow(clippy::expect_used)]
static OG_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("valid selector"));

#[allow(clippy::expect_used)]
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));

/// `img` attributes holding the image URL, in order of preference.
const IMAGE_SOURCE_ATTRS: [&str; 3] = ["src", "data-src", "data-original"];

/// Attributes a page may use to name the saved file.
const FILENAME_ATTRS: [&str; 2] = ["data-filename", "filename"];

/// Extracts `img` sources and direct image links from HTML pages.
///
/// Every occurrence is reported, so an image embedded twice yields two
/// descriptors. An anchor wrapping an `img` that points at the same URL is
/// not reported a second time.
#[derive(Debug, Clone, Default)]
pub struct HtmlImageExtractor {
    title_filter_words: Vec<String>,
}

impl HtmlImageExtractor {
    /// Creates an extractor that removes `title_filter_words` from page titles.
    #[must_use]
    pub fn new(title_filter_words: Vec<String>) -> Self {
        Self { title_filter_words }
    }

    /// `og:title`, else `<title>`, with filter words removed and whitespace collapsed.
    fn page_title(&self, document: &Html) -> Option<String> {
        let raw = document
            .select(&OG_TITLE)
            .find_map(|meta| meta.value().attr("content"))
            .map(str::to_string)
            .filter(|title| !title.trim().is_empty())
            .or_else(|| {
                document
                    .select(&TITLE)
                    .next()
                    .map(|title| title.text().collect::<String>())
            })?;

        let filtered = self
            .title_filter_words
            .iter()
            .filter(|word| !word.is_empty())
            .fold(raw, |title, word| title.replace(word.as_str(), " "));

        let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
        (!collapsed.is_empty()).then_some(collapsed)
    }
}

impl PageParser for HtmlImageExtractor {
    #[instrument(level = "debug", skip(self, html), fields(page_url = %page_url))]
    fn extract(&self, page_url: &str, html: &str, page: Option<&PageId>) -> Vec<ImageDescriptor> {
        let Ok(base) = Url::parse(page_url) else {
            warn!("page URL does not parse; no images extracted");
            return Vec::new();
        };

        let document = Html::parse_document(html);
        let title = self.page_title(&document);

        let images: Vec<ImageDescriptor> = document
            .select(&IMAGE_OR_LINK)
            .filter_map(|element| {
                let url = if element.value().name() == "img" {
                    image_source(element, &base)?
                } else {
                    direct_image_link(element, &base)?
                };
                Some(
                    ImageDescriptor::new(url)
                        .with_page_title(title.clone())
                        .with_page(page.cloned())
                        .with_filename(explicit_filename(element)),
                )
            })
            .collect();

        debug!(count = images.len(), title = title.as_deref().unwrap_or("-"), "extracted images");
        images
    }
}

fn image_source(element: ElementRef<'_>, base: &Url) -> Option<String> {
    IMAGE_SOURCE_ATTRS
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .find(|value| !value.trim().is_empty())
        .and_then(|value| resolve_link(base, value))
}

fn direct_image_link(element: ElementRef<'_>, base: &Url) -> Option<String> {
    let href = element.value().attr("href")?;
    let url = resolve_link(base, href)?;
    if !has_image_extension(&url) {
        return None;
    }

    let wraps_same_image = element
        .select(&NESTED_IMAGE)
        .any(|img| image_source(img, base).as_deref() == Some(url.as_str()));
    (!wraps_same_image).then_some(url)
}

/// Resolves `raw` against the page URL, keeping only http(s) results.
fn resolve_link(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:")) {
        return None;
    }
    let url = base.join(raw).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

fn has_image_extension(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|segment| segment.rsplit_once('.'))
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

fn explicit_filename(element: ElementRef<'_>) -> Option<String> {
    FILENAME_ATTRS
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
