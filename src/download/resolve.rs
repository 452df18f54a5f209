//! Collision-free destination paths for downloaded images.
//!
//! [`resolve`] is one step of the collision loop and touches the filesystem
//! only through a [`FileSizes`], so the algorithm can be exercised without
//! real files. [`resolve_destination`] iterates it up to
//! [`MAX_RESOLVE_ATTEMPTS`] times.
//!
//! Callers must hold the pipeline's filesystem lock from resolution until
//! the returned path has been written; otherwise two workers can both see
//! the same path as fresh.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::constants::MAX_RESOLVE_ATTEMPTS;
use super::error::PersistError;
use super::filename::next_candidate_name;

/// Read-only view of the filesystem used by the collision loop.
pub trait FileSizes {
    /// Size of the file at `path`, or `None` when nothing exists there.
    fn existing_size(&self, path: &Path) -> Option<u64>;
}

/// [`FileSizes`] backed by the real filesystem.
///
/// Uses blocking `std::fs::metadata`; one stat per candidate is cheap enough
/// to run on the async worker while the pipeline's filesystem lock is held.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSizes;

impl FileSizes for DiskSizes {
    fn existing_size(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(path).ok().map(|meta| meta.len())
    }
}

/// A candidate destination: a directory plus a filename inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    dir: PathBuf,
    name: String,
}

impl Candidate {
    /// Creates a candidate for `name` inside `dir`.
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    /// Full path of the candidate.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Filename of the candidate.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn renamed(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            name: next_candidate_name(&self.name),
        }
    }
}

/// Outcome of one collision-loop step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing exists at the path; write here.
    Fresh(PathBuf),
    /// A file of the expected size is already there; skip the download.
    Duplicate,
    /// Different content owns the name; try this candidate next.
    Renamed(Candidate),
}

/// Decides what to do with a single candidate.
///
/// An existing file counts as a duplicate only when its size equals the
/// advertised `Content-Length`. With no advertised length the existing file
/// is assumed to differ, so nothing is ever overwritten.
pub fn resolve(
    candidate: &Candidate,
    expected_size: Option<u64>,
    sizes: &dyn FileSizes,
) -> Resolution {
    let path = candidate.path();
    match sizes.existing_size(&path) {
        None => Resolution::Fresh(path),
        Some(size) if expected_size == Some(size) => Resolution::Duplicate,
        Some(_) => Resolution::Renamed(candidate.renamed()),
    }
}

/// Runs the collision loop from `candidate`.
///
/// Returns `Some(path)` for a fresh write target, or `None` when the content
/// is already saved under one of the tried names.
///
/// # Errors
///
/// Returns [`PersistError::ResolutionExhausted`] when every one of the
/// [`MAX_RESOLVE_ATTEMPTS`] candidates holds different content.
pub fn resolve_destination(
    candidate: Candidate,
    expected_size: Option<u64>,
    sizes: &dyn FileSizes,
) -> Result<Option<PathBuf>, PersistError> {
    let first = candidate.path();
    let mut current = candidate;

    for attempt in 1..=MAX_RESOLVE_ATTEMPTS {
        match resolve(&current, expected_size, sizes) {
            Resolution::Fresh(path) => {
                debug!(path = %path.display(), attempt, "resolved fresh destination");
                return Ok(Some(path));
            }
            Resolution::Duplicate => {
                debug!(path = %current.path().display(), "content already saved");
                return Ok(None);
            }
            Resolution::Renamed(next) => {
                debug!(from = current.name(), to = next.name(), "filename taken by other content");
                current = next;
            }
        }
    }

    Err(PersistError::ResolutionExhausted {
        path: first,
        attempts: MAX_RESOLVE_ATTEMPTS,
    })
}
