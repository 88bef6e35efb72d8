//! Progressive document numbering.
//!
//! Numbers render as `YYYY/NNN` — year zero-padded to four digits, ordinal
//! zero-padded to at least three. The ordinal is a single global sequence
//! that keeps incrementing across year boundaries (numbering has not reset
//! at year end since the 2013 regime change); only the printed year
//! component follows the issue date.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{FatturaError, ValidationError};
use crate::store::DocumentStore;

/// A progressive document number: issue year plus global ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentNumber {
    pub year: i32,
    pub ordinal: u64,
}

impl DocumentNumber {
    pub fn new(year: i32, ordinal: u64) -> Self {
        Self { year, ordinal }
    }

    /// The number following `last`, for a document issued in `year`.
    ///
    /// The ordinal continues the global sequence; it never restarts at a
    /// year boundary. With no predecessor the sequence starts at 1.
    pub fn successor(last: Option<&DocumentNumber>, year: i32) -> Self {
        let ordinal = last.map_or(1, |n| n.ordinal + 1);
        Self { year, ordinal }
    }
}

/// Ordering follows the sequence: by ordinal, year as a tiebreaker.
impl Ord for DocumentNumber {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ordinal
            .cmp(&other.ordinal)
            .then(self.year.cmp(&other.year))
    }
}

impl PartialOrd for DocumentNumber {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:03}", self.year, self.ordinal)
    }
}

impl FromStr for DocumentNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| ValidationError::new("number", message);

        let (year_part, ordinal_part) = s
            .split_once('/')
            .ok_or_else(|| invalid("expected YYYY/NNN"))?;
        if year_part.len() != 4 || !year_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("year must be exactly 4 digits"));
        }
        if ordinal_part.len() < 3 || !ordinal_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("ordinal must be at least 3 digits"));
        }
        let year: i32 = year_part
            .parse()
            .map_err(|_| invalid("year out of range"))?;
        let ordinal: u64 = ordinal_part
            .parse()
            .map_err(|_| invalid("ordinal out of range"))?;
        if ordinal == 0 {
            return Err(invalid("ordinal must be positive"));
        }
        Ok(Self { year, ordinal })
    }
}

/// Issues progressive numbers against the shared sequence state.
///
/// The sequence counter (the store's last assigned number) is the one
/// shared mutable resource in the engine. `allocate` serializes
/// read-last → compute-next → persist behind a single mutex, so two
/// racing issuances can never be handed the same number.
pub struct NumberAllocator<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    issuance: Mutex<()>,
}

impl<S: DocumentStore + ?Sized> NumberAllocator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            issuance: Mutex::new(()),
        }
    }

    /// Allocate the next number for a document issued in `year`.
    ///
    /// `commit` must persist the issued document (carrying the number) and
    /// runs inside the critical section: the store's last number has
    /// advanced past this one before the lock is released. If `commit`
    /// fails the number is not considered assigned.
    pub fn allocate<F>(&self, year: i32, commit: F) -> Result<DocumentNumber, FatturaError>
    where
        F: FnOnce(&DocumentNumber) -> Result<(), FatturaError>,
    {
        // The guarded state lives in the store, so a poisoned lock holds
        // nothing worth discarding.
        let _issuing = self.issuance.lock().unwrap_or_else(PoisonError::into_inner);

        let last = self.store.last_document_number()?;
        let next = DocumentNumber::successor(last.as_ref(), year);
        commit(&next)?;
        debug!(number = %next, "allocated document number");
        Ok(next)
    }

    /// Preview the next number without assigning it.
    pub fn peek(&self, year: i32) -> Result<DocumentNumber, FatturaError> {
        let last = self.store.last_document_number()?;
        Ok(DocumentNumber::successor(last.as_ref(), year))
    }
}
