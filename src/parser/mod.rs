//! Page parsing: turning page markup into image descriptors.
//!
//! The pipeline only knows the [`PageParser`] trait, so site-specific
//! extractors can be plugged in. [`HtmlImageExtractor`] is the general
//! purpose default.
//!
//! # Example
//!
//! ```
//! use picgrab::parser::{HtmlImageExtractor, PageParser};
//!
//! let html = r#"<html><head><title>Holiday</title></head>
//!     <body><img src="/photos/beach.jpg"></body></html>"#;
//! let images = HtmlImageExtractor::default().extract("https://blog.example/7", html, None);
//! assert_eq!(images.len(), 1);
//! assert_eq!(images[0].url, "https://blog.example/photos/beach.jpg");
//! assert_eq!(images[0].page_title.as_deref(), Some("Holiday"));
//! ```

mod html;

pub use html::HtmlImageExtractor;

use crate::queue::{ImageDescriptor, PageId};

/// Extracts image descriptors from one fetched page.
///
/// Implementations are called concurrently from every page worker and must
/// not block on I/O.
pub trait PageParser: Send + Sync {
    /// Returns every image found in `html`, in document order.
    ///
    /// `page` is the page identifier when crawling paginated, and should be
    /// carried into each descriptor.
    fn extract(&self, page_url: &str, html: &str, page: Option<&PageId>) -> Vec<ImageDescriptor>;
}
