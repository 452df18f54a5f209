//! Final run summary.

use std::fmt;

use serde::Serialize;

use super::tally::FailedItem;

/// Totals for one run, produced after both pools have joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Discovered images minus those rejected by the size/type screen.
    pub found: usize,
    /// Newly written files.
    pub saved: usize,
    /// Images whose content was already on disk.
    pub already_saved: usize,
    /// Every fetch or write failure.
    pub errors: Vec<FailedItem>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Done!")?;
        writeln!(f, "Found: {}", self.found)?;
        writeln!(f, "Saved: {}", self.saved)?;
        writeln!(f, "Already saved: {}", self.already_saved)?;
        writeln!(f, "Errors: {}", self.errors.len())?;

        if !self.errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "Could not download:")?;
            for item in &self.errors {
                writeln!(f, "{item}")?;
            }
        }
        Ok(())
    }
}
