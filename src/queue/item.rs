//! Work item types carried by the queues.

use std::fmt;

use serde::Serialize;

/// Opaque token addressing one crawled page, usually a page number.
///
/// The page URL is the paginated base URL followed by this token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PageId(String);

impl PageId {
    /// Wraps a page token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<u32> for PageId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

/// An image discovered on a page and waiting to be downloaded.
///
/// Built by a page parser, never mutated after being queued, and consumed
/// by exactly one download worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDescriptor {
    /// Absolute image URL.
    pub url: String,
    /// Title of the page the image was found on (organizing-mode folder).
    pub page_title: Option<String>,
    /// Page the image was found on, when crawling paginated.
    pub page: Option<PageId>,
    /// Filename supplied by the page markup, overriding header/URL naming.
    pub filename: Option<String>,
}

impl ImageDescriptor {
    /// Creates a descriptor with only a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            page_title: None,
            page: None,
            filename: None,
        }
    }

    /// Sets the containing page title.
    #[must_use]
    pub fn with_page_title(mut self, title: Option<String>) -> Self {
        self.page_title = title;
        self
    }

    /// Sets the containing page identifier.
    #[must_use]
    pub fn with_page(mut self, page: Option<PageId>) -> Self {
        self.page = page;
        self
    }

    /// Sets the explicit filename override.
    #[must_use]
    pub fn with_filename(mut self, filename: Option<String>) -> Self {
        self.filename = filename;
        self
    }

    /// Diagnostic context recorded with a failed fetch of this image.
    #[must_use]
    pub fn fetch_context(&self) -> Option<String> {
        self.page.as_ref().map(|page| format!("page {page}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_display_is_raw_token() {
        assert_eq!(PageId::from(12).to_string(), "12");
        assert_eq!(PageId::from("archive").as_str(), "archive");
    }

    #[test]
    fn test_descriptor_builder_sets_fields() {
        let descriptor = ImageDescriptor::new("https://blog.example/a.jpg")
            .with_page_title(Some("Trip".to_string()))
            .with_page(Some(PageId::from(3)))
            .with_filename(Some("a.jpg".to_string()));

        assert_eq!(descriptor.url, "https://blog.example/a.jpg");
        assert_eq!(descriptor.page_title.as_deref(), Some("Trip"));
        assert_eq!(descriptor.page, Some(PageId::from(3)));
        assert_eq!(descriptor.filename.as_deref(), Some("a.jpg"));
    }

    #[test]
    fn test_fetch_context_names_page() {
        let descriptor = ImageDescriptor::new("https://x/a.png").with_page(Some(PageId::from(7)));
        assert_eq!(descriptor.fetch_context().as_deref(), Some("page 7"));
    }

    #[test]
    fn test_fetch_context_absent_without_page() {
        assert_eq!(ImageDescriptor::new("https://x/a.png").fetch_context(), None);
    }
}
