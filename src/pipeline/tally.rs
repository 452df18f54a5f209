//! Run counters and the error log, shared by every worker.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use super::report::Report;
use crate::download::{FetchError, PersistError};

/// What went wrong with a failed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Fetch failed, or the body stream broke off.
    Transport,
    /// Creating a folder or writing the file failed, or no free name was left.
    Filesystem,
}

/// One entry in the error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    /// URL that could not be fetched or saved.
    pub url: String,
    /// Diagnostic context, such as the page the image came from.
    pub context: Option<String>,
    /// Failure category.
    pub kind: FailureKind,
    /// Human-readable cause.
    pub reason: String,
}

impl FailedItem {
    /// Records a failed fetch.
    pub fn transport(url: impl Into<String>, context: Option<String>, error: &FetchError) -> Self {
        Self {
            url: url.into(),
            context,
            kind: FailureKind::Transport,
            reason: error.to_string(),
        }
    }

    /// Records a failed write, classifying broken body streams as transport.
    pub fn persist(url: impl Into<String>, context: Option<String>, error: &PersistError) -> Self {
        let kind = if error.is_transport() {
            FailureKind::Transport
        } else {
            FailureKind::Filesystem
        };
        Self {
            url: url.into(),
            context,
            kind,
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for FailedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{} ({context})", self.url),
            None => f.write_str(&self.url),
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    found: usize,
    saved: usize,
    already_saved: usize,
    failures: Vec<FailedItem>,
}

/// Mutex-guarded run counters; the guard is never held across an await.
#[derive(Debug, Default)]
pub struct Ledger {
    tally: Mutex<Tally>,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Tally> {
        self.tally.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the discovered-image count before downloads start.
    pub fn set_found(&self, found: usize) {
        self.guard().found = found;
    }

    /// A discovered image was filtered out by size or type.
    pub fn mark_rejected(&self) {
        let mut tally = self.guard();
        tally.found = tally.found.saturating_sub(1);
    }

    /// A new file was written.
    pub fn mark_saved(&self) {
        self.guard().saved += 1;
    }

    /// The content was already on disk.
    pub fn mark_already_saved(&self) {
        self.guard().already_saved += 1;
    }

    /// Appends to the error log.
    pub fn record_failure(&self, item: FailedItem) {
        self.guard().failures.push(item);
    }

    /// Number of logged failures so far.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.guard().failures.len()
    }

    /// Snapshot of the counters; call after the download pool has joined.
    #[must_use]
    pub fn report(&self) -> Report {
        let tally = self.guard();
        Report {
            found: tally.found,
            saved: tally.saved,
            already_saved: tally.already_saved,
            errors: tally.failures.clone(),
        }
    }
}
