//! Bulk roster import.
//!
//! Planners maintain the roster in spreadsheets; exports land here as
//! `user,date,shift` CSV. Rows upsert through the same shift store the swap
//! exchange writes to, with merge semantics: a blank shift cell leaves
//! whatever is already on the roster untouched.

mod parser;

use std::io::Read;
use std::path::Path;

use crate::workflows::requests::domain::Shift;
use crate::workflows::requests::repository::{ShiftStore, StoreError};

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Store(StoreError),
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster export: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterImportError::Store(err) => {
                write!(f, "could not apply roster rows to the shift store: {}", err)
            }
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::Store(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<StoreError> for RosterImportError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Outcome counters for one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportSummary {
    /// Rows written to the shift store.
    pub applied: usize,
    /// Blank shift cells left in place (the merge half of upsert-or-merge).
    pub merged: usize,
    /// Rows dropped for a blank user, bad date, or unknown shift token.
    pub skipped: usize,
}

pub struct RosterCsvImporter;

impl RosterCsvImporter {
    pub fn from_path<P: AsRef<Path>, S: ShiftStore>(
        path: P,
        store: &S,
    ) -> Result<ImportSummary, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, store)
    }

    pub fn from_reader<R: Read, S: ShiftStore>(
        reader: R,
        store: &S,
    ) -> Result<ImportSummary, RosterImportError> {
        let (records, issues) = parser::parse_records(reader)?;

        let mut summary = ImportSummary {
            skipped: issues.len(),
            ..ImportSummary::default()
        };
        for issue in &issues {
            tracing::warn!(?issue, "roster row skipped");
        }

        for record in records {
            match record.shift {
                None => summary.merged += 1,
                Some(shift_type) => {
                    store.upsert(Shift {
                        user: record.user,
                        date: record.date,
                        shift_type,
                        // A fresh planner assignment supersedes any stale
                        // swap back-reference on the slot.
                        swapped_with: None,
                    })?;
                    summary.applied += 1;
                }
            }
        }

        Ok(summary)
    }
}
