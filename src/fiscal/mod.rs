//! Italian fiscal identifier validation.
//!
//! Pure checksum validators for the partita IVA (VAT number) and the
//! codice fiscale (national tax code). No I/O, no registry lookups.

use std::fmt;

mod codice_fiscale;
mod partita_iva;

pub use codice_fiscale::validate_codice_fiscale;
pub use partita_iva::validate_partita_iva;

/// Error returned when a fiscal identifier fails validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiscalIdError {
    /// The invalid input value.
    pub value: String,
    /// Why the value failed validation.
    pub reason: String,
}

impl FiscalIdError {
    fn new(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FiscalIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid fiscal identifier '{}': {}", self.value, self.reason)
    }
}

impl std::error::Error for FiscalIdError {}
