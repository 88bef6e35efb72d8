//! Structural and business validation.
//!
//! Every check pushes into one violation list so the caller always sees
//! the complete picture, never just the first failure. Computation only
//! runs on input that has passed these checks.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::ValidationError;
use super::types::{Client, Document, DocumentType, LineItem};
use crate::fiscal;

/// Validate a document's structure and business rules.
///
/// Returns all violations found. Does not touch persistence: linkage
/// checks that need the original document live in
/// [`super::validate_note`].
pub fn validate_document(document: &Document) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if document.items.is_empty() {
        errors.push(ValidationError::new(
            "items",
            "at least one line item is required",
        ));
    }

    for (i, item) in document.items.iter().enumerate() {
        validate_item(item, i, document.doc_type, &mut errors);
    }

    if let Some(p) = document.discount_percent {
        if p < Decimal::ZERO || p > dec!(100) {
            errors.push(ValidationError::new(
                "discount_percent",
                "document discount percentage must be between 0 and 100",
            ));
        }
    }
    if let Some(a) = document.discount_amount {
        if a < Decimal::ZERO {
            errors.push(ValidationError::new(
                "discount_amount",
                "document discount amount must not be negative",
            ));
        }
    }

    if let (Some(due), issue) = (document.due_date, document.issue_date) {
        if due < issue {
            errors.push(ValidationError::new(
                "due_date",
                "due date must not precede the issue date",
            ));
        }
    }

    match document.doc_type {
        DocumentType::Invoice => {
            if document.original.is_some() {
                errors.push(ValidationError::new(
                    "original",
                    "an invoice must not reference an original document",
                ));
            }
        }
        DocumentType::CreditNote | DocumentType::DebitNote => {
            if document.original.is_none() {
                errors.push(ValidationError::new(
                    "original",
                    "a note must reference the original document (id and number)",
                ));
            }
            if document.reason.as_deref().is_none_or(|r| r.trim().is_empty()) {
                errors.push(ValidationError::new(
                    "reason",
                    "a note must carry a reason text",
                ));
            }
        }
    }

    errors
}

fn validate_item(
    item: &LineItem,
    index: usize,
    doc_type: DocumentType,
    errors: &mut Vec<ValidationError>,
) {
    let prefix = format!("items[{index}]");

    if item.description.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.description"),
            "description must not be empty",
        ));
    }

    if item.quantity.is_zero() {
        errors.push(ValidationError::new(
            format!("{prefix}.quantity"),
            "quantity must not be zero",
        ));
    } else {
        // Credit notes carry negated lines; everything else bills forward.
        match doc_type {
            DocumentType::CreditNote => {
                if item.quantity > Decimal::ZERO {
                    errors.push(ValidationError::new(
                        format!("{prefix}.quantity"),
                        "credit note quantities must be negative",
                    ));
                }
            }
            DocumentType::Invoice | DocumentType::DebitNote => {
                if item.quantity < Decimal::ZERO {
                    errors.push(ValidationError::new(
                        format!("{prefix}.quantity"),
                        "quantity must be positive",
                    ));
                }
            }
        }
    }

    if item.unit_price < Decimal::ZERO {
        errors.push(ValidationError::new(
            format!("{prefix}.unit_price"),
            "unit price must not be negative",
        ));
    }

    if let Some(p) = item.discount_percent {
        if p < Decimal::ZERO || p > dec!(100) {
            errors.push(ValidationError::new(
                format!("{prefix}.discount_percent"),
                "discount percentage must be between 0 and 100",
            ));
        }
    }

    if let Some(a) = item.discount_amount {
        let line_amount = item.quantity * item.unit_price;
        // Sign must follow the line; a discount cannot flip or exceed it.
        if a.abs() > line_amount.abs() {
            errors.push(ValidationError::new(
                format!("{prefix}.discount_amount"),
                "discount amount must not exceed the line amount",
            ));
        }
        if doc_type == DocumentType::CreditNote {
            if a > Decimal::ZERO {
                errors.push(ValidationError::new(
                    format!("{prefix}.discount_amount"),
                    "credit note discount amounts must be negative",
                ));
            }
        } else if a < Decimal::ZERO {
            errors.push(ValidationError::new(
                format!("{prefix}.discount_amount"),
                "discount amount must not be negative",
            ));
        }
    }
}

/// Validate a client's fiscal attributes, including identifier checksums.
pub fn validate_client(client: &Client) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if client.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "client name must not be empty"));
    }

    if let Some(vat) = &client.vat_number {
        if let Err(e) = fiscal::validate_partita_iva(vat) {
            errors.push(ValidationError::new("vat_number", e.to_string()));
        }
    }
    if let Some(code) = &client.tax_code {
        if let Err(e) = fiscal::validate_codice_fiscale(code) {
            errors.push(ValidationError::new("tax_code", e.to_string()));
        }
    }

    let percent = |v: Decimal| v >= Decimal::ZERO && v <= dec!(100);
    if !percent(client.withholding_rate) {
        errors.push(ValidationError::new(
            "withholding_rate",
            "withholding rate must be between 0 and 100",
        ));
    }
    if !percent(client.withholding_base_portion) {
        errors.push(ValidationError::new(
            "withholding_base_portion",
            "withholding base portion must be between 0 and 100",
        ));
    }
    if client.subject_to_withholding && client.withholding_rate.is_zero() {
        errors.push(ValidationError::new(
            "withholding_rate",
            "a client subject to withholding needs a non-zero rate",
        ));
    }

    errors
}
