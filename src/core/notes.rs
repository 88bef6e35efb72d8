//! Credit and debit note derivation.
//!
//! Notes are counter-documents: new drafts linked to an already-finalized
//! original. A credit note negates the original's amounts; a debit note
//! appends caller-supplied charges. Both flow through the same aggregator
//! as invoices.

use chrono::NaiveDate;
use uuid::Uuid;

use super::error::{FatturaError, ValidationError};
use super::types::{Document, DocumentStatus, DocumentType, LineItem, OriginalRef};

/// Derive a credit note from a finalized document.
///
/// Every item is copied with quantity (and any fixed discount) negated, so
/// the derived totals mirror the original with the sign flipped. The note
/// starts as an unnumbered draft linked to the original.
pub fn derive_credit_note(
    original: &Document,
    issue_date: NaiveDate,
    reason: impl Into<String>,
) -> Result<Document, FatturaError> {
    let linkage = linkage_for(original)?;
    let items = original
        .items
        .iter()
        .map(|item| LineItem {
            quantity: -item.quantity,
            discount_amount: item.discount_amount.map(|a| -a),
            taxable_base: None,
            tax_amount: None,
            total: None,
            ..item.clone()
        })
        .collect();

    Ok(Document {
        id: Uuid::new_v4(),
        number: None,
        doc_type: DocumentType::CreditNote,
        status: DocumentStatus::Draft,
        issue_date,
        due_date: None,
        client_id: original.client_id,
        items,
        discount_percent: original.discount_percent,
        discount_amount: original.discount_amount.map(|a| -a),
        original: Some(linkage),
        reason: Some(reason.into()),
        totals: None,
    })
}

/// Derive a debit note charging additional items against a finalized
/// document. The original's items are not copied.
pub fn derive_debit_note(
    original: &Document,
    issue_date: NaiveDate,
    items: Vec<LineItem>,
    reason: impl Into<String>,
) -> Result<Document, FatturaError> {
    let linkage = linkage_for(original)?;

    Ok(Document {
        id: Uuid::new_v4(),
        number: None,
        doc_type: DocumentType::DebitNote,
        status: DocumentStatus::Draft,
        issue_date,
        due_date: None,
        client_id: original.client_id,
        items,
        discount_percent: None,
        discount_amount: None,
        original: Some(linkage),
        reason: Some(reason.into()),
        totals: None,
    })
}

fn linkage_for(original: &Document) -> Result<OriginalRef, FatturaError> {
    // A draft was never finalized; amend the draft directly instead.
    if original.status == DocumentStatus::Draft {
        return Err(FatturaError::Validation(vec![ValidationError::new(
            "original",
            "cannot derive a note from a draft — edit the draft instead",
        )]));
    }
    let number = original.number.clone().ok_or_else(|| {
        FatturaError::Validation(vec![ValidationError::new(
            "original.number",
            "the original document has no assigned number",
        )])
    })?;
    Ok(OriginalRef {
        id: original.id,
        number,
    })
}

/// Validate a note against its resolved original.
///
/// Pass `None` for the original only when it could not be resolved; the
/// missing-document case itself is reported by the engine as `NotFound`.
/// Returns every violated rule.
pub fn validate_note(note: &Document, original: Option<&Document>) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !note.doc_type.is_note() {
        errors.push(ValidationError::new(
            "doc_type",
            "document type must be credit note or debit note",
        ));
    }

    let Some(linkage) = &note.original else {
        errors.push(ValidationError::new(
            "original",
            "a note must reference the original document (id and number)",
        ));
        return errors;
    };

    let Some(original) = original else {
        return errors;
    };

    if linkage.id != original.id {
        errors.push(ValidationError::new(
            "original.id",
            "linkage does not match the resolved original document",
        ));
    }
    if original.status == DocumentStatus::Draft {
        errors.push(ValidationError::new(
            "original",
            "the original document is still a draft",
        ));
    }

    if note.doc_type == DocumentType::CreditNote {
        // A credit note cannot refund more than was charged.
        let note_total = note.totals.as_ref().map(|t| t.document_total.abs());
        let original_total = original.totals.as_ref().map(|t| t.document_total.abs());
        match (note_total, original_total) {
            (Some(note_total), Some(original_total)) => {
                if note_total > original_total {
                    errors.push(ValidationError::new(
                        "totals.document_total",
                        format!(
                            "credit note total {note_total} exceeds the original total {original_total}"
                        ),
                    ));
                }
            }
            _ => {
                errors.push(ValidationError::new(
                    "totals",
                    "totals must be computed before note validation",
                ));
            }
        }
    }

    errors
}
