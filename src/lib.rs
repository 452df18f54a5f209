//! picgrab core library
//!
//! Crawls blog-style pages, extracts the images they reference and
//! downloads them, skipping content that is already on disk and never
//! overwriting a different image that happens to share a name.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Validated run settings and page-list parsing
//! - [`download`] - HTTP fetching, header screening, naming and collision-free persistence
//! - [`parser`] - Page parsers turning markup into image descriptors
//! - [`pipeline`] - The page and download worker pools and the final report
//! - [`queue`] - Thread-safe work queues and the items they carry

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod parser;
pub mod pipeline;
pub mod queue;
mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, Settings, parse_page_list};
pub use download::{
    ContentDescriptor, FetchError, FetchedResponse, HttpFetcher, PersistError, Rejection,
};
pub use parser::{HtmlImageExtractor, PageParser};
pub use pipeline::{FailedItem, FailureKind, PipelineError, Report, RunContext, run};
pub use queue::{ImageDescriptor, PageId, WorkQueue};
pub use user_agent::BROWSER_USER_AGENT;
