//! Document lifecycle transitions.
//!
//! Legality is a closed table, not scattered conditionals: the nine legal
//! pairs below are the whole story, and anything else — including
//! self-transitions and transitions out of terminal states — is rejected.

use super::error::FatturaError;
use super::types::DocumentStatus::{self, Cancelled, Draft, Issued, Overdue, Paid, Sent};

/// The complete set of legal status transitions.
const LEGAL_TRANSITIONS: &[(DocumentStatus, DocumentStatus)] = &[
    (Draft, Issued),
    (Draft, Cancelled),
    (Issued, Sent),
    (Issued, Cancelled),
    (Sent, Paid),
    (Sent, Overdue),
    (Sent, Cancelled),
    (Overdue, Paid),
    (Overdue, Cancelled),
];

/// Whether `from → to` is a legal transition.
pub fn can_transition(from: DocumentStatus, to: DocumentStatus) -> bool {
    LEGAL_TRANSITIONS.contains(&(from, to))
}

/// Check a transition, mapping illegal pairs to [`FatturaError::Forbidden`].
pub fn ensure_transition(from: DocumentStatus, to: DocumentStatus) -> Result<(), FatturaError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(FatturaError::Forbidden(format!(
            "illegal status transition {from} -> {to}"
        )))
    }
}
