//! Abstract persistence contracts and in-memory backends.
//!
//! The engine only ever touches storage through these traits; how
//! documents live on disk belongs to the embedding application. The
//! in-memory backends back the test suite and small embedders.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::core::{Client, Document, DocumentNumber, FatturaError};

/// Document persistence contract.
pub trait DocumentStore: Send + Sync {
    fn get(&self, id: Uuid) -> Result<Option<Document>, FatturaError>;

    /// Persist a new document. Fails with [`FatturaError::Conflict`] on a
    /// duplicate id.
    fn create(&self, document: Document) -> Result<Document, FatturaError>;

    /// Replace a stored document. Returns `None` when the id is unknown.
    fn update(&self, document: Document) -> Result<Option<Document>, FatturaError>;

    fn delete(&self, id: Uuid) -> Result<bool, FatturaError>;

    /// The highest document number ever persisted — the shared sequence
    /// state read by the numbering allocator.
    fn last_document_number(&self) -> Result<Option<DocumentNumber>, FatturaError>;
}

/// Client lookup contract. Clients are owned elsewhere; the engine only
/// reads them.
pub trait ClientStore: Send + Sync {
    fn get(&self, id: Uuid) -> Result<Option<Client>, FatturaError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: HashMap<Uuid, Document>,
    last_number: Option<DocumentNumber>,
}

/// Mutex-guarded in-memory document store.
///
/// Tracks the last persisted number separately, the way a database
/// sequence row would, so allocator reads stay O(1).
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    state: Mutex<MemoryState>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn track_number(state: &mut MemoryState, document: &Document) {
        if let Some(number) = &document.number {
            if state.last_number.as_ref().is_none_or(|last| number > last) {
                state.last_number = Some(number.clone());
            }
        }
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, id: Uuid) -> Result<Option<Document>, FatturaError> {
        Ok(self.state().documents.get(&id).cloned())
    }

    fn create(&self, document: Document) -> Result<Document, FatturaError> {
        let mut state = self.state();
        if state.documents.contains_key(&document.id) {
            return Err(FatturaError::Conflict(format!(
                "document {} already exists",
                document.id
            )));
        }
        Self::track_number(&mut state, &document);
        state.documents.insert(document.id, document.clone());
        Ok(document)
    }

    fn update(&self, document: Document) -> Result<Option<Document>, FatturaError> {
        let mut state = self.state();
        if !state.documents.contains_key(&document.id) {
            return Ok(None);
        }
        Self::track_number(&mut state, &document);
        state.documents.insert(document.id, document.clone());
        Ok(Some(document))
    }

    fn delete(&self, id: Uuid) -> Result<bool, FatturaError> {
        Ok(self.state().documents.remove(&id).is_some())
    }

    fn last_document_number(&self) -> Result<Option<DocumentNumber>, FatturaError> {
        Ok(self.state().last_number.clone())
    }
}

/// Mutex-guarded in-memory client store.
#[derive(Debug, Default)]
pub struct MemoryClientStore {
    clients: Mutex<HashMap<Uuid, Client>>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, client: Client) {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(client.id, client);
    }
}

impl ClientStore for MemoryClientStore {
    fn get(&self, id: Uuid) -> Result<Option<Client>, FatturaError> {
        Ok(self
            .clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }
}
