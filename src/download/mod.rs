//! HTTP fetching and on-disk persistence of images.
//!
//! This module holds everything between "an image URL" and "a file on
//! disk": the fetcher, the header screen, filename derivation and the
//! collision loop that keeps distinct images from overwriting each other.
//! The worker pools that drive it live in [`crate::pipeline`].
//!
//! # Example
//!
//! ```no_run
//! use picgrab::download::{Candidate, DiskSizes, HttpFetcher, derive_filename, resolve_destination};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpFetcher::new()?;
//! let response = fetcher.fetch("https://cdn.example/photos/cat.jpg").await?;
//! response.content().screen()?;
//!
//! let name = derive_filename(response.url(), None, response.content());
//! let expected = response.content().content_length;
//! if let Some(path) = resolve_destination(Candidate::new("./downloads", name), expected, &DiskSizes)? {
//!     response.save_to(&path).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod content;
mod error;
mod filename;
mod resolve;

pub use client::{FetchedResponse, HttpFetcher};
pub use constants::{
    CONNECT_TIMEOUT_SECS, IMAGE_CONTENT_TYPES, IMAGE_EXTENSIONS, MAX_RESOLVE_ATTEMPTS,
    MIN_IMAGE_BYTES, READ_TIMEOUT_SECS, UNTITLED_FOLDER,
};
pub use content::{ContentDescriptor, Rejection};
pub use error::{FetchError, PersistError};
pub use filename::{derive_filename, next_candidate_name, repair_extension, sanitize_folder_name};
pub use resolve::{Candidate, DiskSizes, FileSizes, Resolution, resolve, resolve_destination};
