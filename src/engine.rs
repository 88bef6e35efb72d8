//! Workflow orchestration over the stores.
//!
//! The engine wires the pure pieces together: validation, totals,
//! lifecycle checks, numbering and note derivation. Every operation is a
//! bounded synchronous request/response; the only serialized section is
//! the numbering allocation inside [`InvoiceEngine::issue`].

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::core::{
    Actor, Client, Document, DocumentNumber, DocumentStatus, FatturaError, FiscalPolicies,
    LineItem, NumberAllocator, calculate_totals, derive_credit_note, derive_debit_note,
    ensure_transition, validate_client, validate_document, validate_note,
};
use crate::store::{ClientStore, DocumentStore};

/// The fiscal engine: draft management, issuance, lifecycle transitions
/// and note derivation against abstract stores.
pub struct InvoiceEngine<D: DocumentStore + ?Sized, C: ClientStore + ?Sized> {
    documents: Arc<D>,
    clients: Arc<C>,
    allocator: NumberAllocator<D>,
    policies: FiscalPolicies,
}

impl<D: DocumentStore + ?Sized, C: ClientStore + ?Sized> InvoiceEngine<D, C> {
    pub fn new(documents: Arc<D>, clients: Arc<C>) -> Self {
        Self::with_policies(documents, clients, FiscalPolicies::default())
    }

    pub fn with_policies(documents: Arc<D>, clients: Arc<C>, policies: FiscalPolicies) -> Self {
        Self {
            allocator: NumberAllocator::new(documents.clone()),
            documents,
            clients,
            policies,
        }
    }

    /// Validate a draft, compute its totals and persist it.
    #[instrument(skip(self, document), fields(document = %document.id, actor = %actor))]
    pub fn create_draft(&self, document: Document, actor: &Actor) -> Result<Document, FatturaError> {
        if document.status != DocumentStatus::Draft || document.number.is_some() {
            return Err(FatturaError::Forbidden(
                "only unnumbered drafts can be created".into(),
            ));
        }
        let client = self.client_for(&document)?;

        let mut document = document;
        calculate_totals(&mut document, &client, &self.policies);

        let mut violations = validate_document(&document);
        violations.extend(validate_client(&client));
        violations.extend(self.note_violations(&document)?);
        FatturaError::from_violations(violations)?;

        let stored = self.documents.create(document)?;
        debug!(doc_type = stored.doc_type.sdi_code(), "created draft");
        Ok(stored)
    }

    /// Replace a draft's substantive fields, revalidating and recomputing.
    ///
    /// Non-draft documents are immutable: amend them through a credit or
    /// debit note instead.
    #[instrument(skip(self, document), fields(document = %document.id, actor = %actor))]
    pub fn update_draft(&self, document: Document, actor: &Actor) -> Result<Document, FatturaError> {
        let current = self.load(document.id)?;
        if !current.status.allows_edit() {
            return Err(FatturaError::Forbidden(format!(
                "a {} document cannot be modified",
                current.status
            )));
        }
        if document.status != DocumentStatus::Draft || document.number.is_some() {
            return Err(FatturaError::Forbidden(
                "a draft update cannot change status or number".into(),
            ));
        }
        let client = self.client_for(&document)?;

        let mut document = document;
        calculate_totals(&mut document, &client, &self.policies);

        let mut violations = validate_document(&document);
        violations.extend(validate_client(&client));
        violations.extend(self.note_violations(&document)?);
        FatturaError::from_violations(violations)?;

        self.persist(document)
    }

    /// Issue a draft: allocate the next progressive number, recompute
    /// totals one final time and flip the status to Issued.
    ///
    /// Numbering and persistence happen inside the allocator's critical
    /// section, so concurrent issuances always receive distinct,
    /// monotonically increasing numbers.
    #[instrument(skip(self), fields(document = %id, actor = %actor))]
    pub fn issue(&self, id: Uuid, actor: &Actor) -> Result<Document, FatturaError> {
        let mut document = self.load(id)?;
        ensure_transition(document.status, DocumentStatus::Issued)?;
        let client = self.client_for(&document)?;

        let year = document.issue_date.year();
        let documents = &self.documents;
        let policies = &self.policies;
        self.allocator.allocate(year, |number| {
            document.number = Some(number.clone());
            document.status = DocumentStatus::Issued;
            // Guards against totals gone stale since the last draft edit.
            calculate_totals(&mut document, &client, policies);
            documents
                .update(document.clone())?
                .ok_or_else(|| FatturaError::NotFound(format!("document {id}")))?;
            Ok(())
        })?;

        info!(number = %display_number(&document), "issued document");
        Ok(document)
    }

    /// Mark an issued document as sent.
    pub fn mark_sent(&self, id: Uuid, actor: &Actor) -> Result<Document, FatturaError> {
        self.transition(id, DocumentStatus::Sent, actor)
    }

    /// Mark a sent or overdue document as paid.
    pub fn mark_paid(&self, id: Uuid, actor: &Actor) -> Result<Document, FatturaError> {
        self.transition(id, DocumentStatus::Paid, actor)
    }

    /// Mark a sent document as overdue. Detection is the caller's job; the
    /// engine runs no clock.
    pub fn mark_overdue(&self, id: Uuid, actor: &Actor) -> Result<Document, FatturaError> {
        self.transition(id, DocumentStatus::Overdue, actor)
    }

    /// Cancel a document. Cancellation never deletes: the record stays,
    /// and for finalized documents the calling workflow is expected to
    /// pair it with a credit note.
    pub fn cancel(&self, id: Uuid, actor: &Actor) -> Result<Document, FatturaError> {
        self.transition(id, DocumentStatus::Cancelled, actor)
    }

    /// Delete a draft. Finalized documents cannot be deleted, only
    /// cancelled.
    #[instrument(skip(self), fields(document = %id, actor = %actor))]
    pub fn delete_draft(&self, id: Uuid, actor: &Actor) -> Result<bool, FatturaError> {
        let document = self.load(id)?;
        if document.status != DocumentStatus::Draft {
            return Err(FatturaError::Forbidden(format!(
                "a {} document cannot be deleted; cancel it instead",
                document.status
            )));
        }
        self.documents.delete(id)
    }

    /// Derive, validate and persist a credit note against a finalized
    /// document.
    #[instrument(skip(self, reason), fields(original = %original_id, actor = %actor))]
    pub fn create_credit_note(
        &self,
        original_id: Uuid,
        issue_date: NaiveDate,
        reason: &str,
        actor: &Actor,
    ) -> Result<Document, FatturaError> {
        let original = self.load(original_id)?;
        let note = derive_credit_note(&original, issue_date, reason)?;
        self.persist_note(note, &original)
    }

    /// Derive, validate and persist a debit note charging additional items
    /// against a finalized document.
    #[instrument(skip(self, items, reason), fields(original = %original_id, actor = %actor))]
    pub fn create_debit_note(
        &self,
        original_id: Uuid,
        issue_date: NaiveDate,
        items: Vec<LineItem>,
        reason: &str,
        actor: &Actor,
    ) -> Result<Document, FatturaError> {
        let original = self.load(original_id)?;
        let note = derive_debit_note(&original, issue_date, items, reason)?;
        self.persist_note(note, &original)
    }

    /// Fetch a document by id.
    pub fn get(&self, id: Uuid) -> Result<Document, FatturaError> {
        self.load(id)
    }

    /// Preview the number the next issuance would be assigned.
    pub fn peek_next_number(&self, year: i32) -> Result<DocumentNumber, FatturaError> {
        self.allocator.peek(year)
    }

    /// Resolve a note's linked original and collect the note-specific
    /// violations. Non-notes produce nothing; a dangling linkage is
    /// `NotFound`.
    fn note_violations(
        &self,
        document: &Document,
    ) -> Result<Vec<crate::core::ValidationError>, FatturaError> {
        if !document.doc_type.is_note() {
            return Ok(Vec::new());
        }
        let original = match &document.original {
            Some(linkage) => Some(self.documents.get(linkage.id)?.ok_or_else(|| {
                FatturaError::NotFound(format!("original document {}", linkage.id))
            })?),
            None => None,
        };
        Ok(validate_note(document, original.as_ref()))
    }

    fn persist_note(&self, mut note: Document, original: &Document) -> Result<Document, FatturaError> {
        let client = self.client_for(&note)?;
        calculate_totals(&mut note, &client, &self.policies);

        let mut violations = validate_document(&note);
        violations.extend(validate_note(&note, Some(original)));
        FatturaError::from_violations(violations)?;

        let stored = self.documents.create(note)?;
        info!(
            note = %stored.id,
            doc_type = stored.doc_type.sdi_code(),
            "created note draft"
        );
        Ok(stored)
    }

    fn transition(
        &self,
        id: Uuid,
        to: DocumentStatus,
        actor: &Actor,
    ) -> Result<Document, FatturaError> {
        let mut document = self.load(id)?;
        ensure_transition(document.status, to)?;
        let from = document.status;
        document.status = to;
        let stored = self.persist(document)?;
        info!(document = %id, %from, %to, actor = %actor, "status transition");
        Ok(stored)
    }

    fn load(&self, id: Uuid) -> Result<Document, FatturaError> {
        self.documents
            .get(id)?
            .ok_or_else(|| FatturaError::NotFound(format!("document {id}")))
    }

    fn client_for(&self, document: &Document) -> Result<Client, FatturaError> {
        self.clients
            .get(document.client_id)?
            .ok_or_else(|| FatturaError::NotFound(format!("client {}", document.client_id)))
    }

    fn persist(&self, document: Document) -> Result<Document, FatturaError> {
        let id = document.id;
        self.documents
            .update(document)?
            .ok_or_else(|| FatturaError::NotFound(format!("document {id}")))
    }
}

fn display_number(document: &Document) -> String {
    document
        .number
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string)
}
