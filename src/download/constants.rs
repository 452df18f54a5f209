//! Constants for the download module (timeouts, filters, collision bound).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default whole-request timeout (5 minutes for large images).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Images advertising fewer bytes than this are skipped (icons, spacers).
pub const MIN_IMAGE_BYTES: u64 = 10_000;

/// Upper bound on collision-resolution attempts for one download.
pub const MAX_RESOLVE_ATTEMPTS: usize = 999;

/// MIME types accepted by the type filter.
pub const IMAGE_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Filename extensions that need no repair.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Folder used in organizing mode when a page has no usable title.
pub const UNTITLED_FOLDER: &str = "Untitled";
