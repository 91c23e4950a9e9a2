//! SDK client implementation

use chairside_core::{
    api::medical_notes::{notes_key, MedicalNotesApi},
    api::ApiClient,
    cache::{ResourceCache, ResourceMutation, ResourceQuery},
    config::ClientConfig,
    error::ChairsideResult,
    session::{FileStateStorage, SessionStore, StateStorage},
    types::{MedicalNote, NoteDraft, PatientId},
};
use std::sync::Arc;

/// One wired instance of the Chairside data layer.
///
/// Owns the shared cache and the session store, so every query and
/// mutation created through this client observes the same state. The
/// embedding application keeps a single client per backend and hands
/// clones of the inner handles to its views.
pub struct ChairsideClient {
    config: ClientConfig,
    api: Arc<ApiClient>,
    notes: MedicalNotesApi,
    cache: ResourceCache,
    session: Arc<SessionStore>,
}

impl ChairsideClient {
    /// Create a client with file-backed session persistence in the
    /// configured storage directory.
    pub fn new(config: ClientConfig) -> ChairsideResult<Self> {
        let storage = FileStateStorage::new(config.storage_dir()?)?;
        Self::with_storage(config, Box::new(storage))
    }

    /// Create a client with a custom session-storage backend.
    ///
    /// Tests inject an in-memory backend here to stay hermetic.
    pub fn with_storage(
        config: ClientConfig,
        storage: Box<dyn StateStorage>,
    ) -> ChairsideResult<Self> {
        let api = Arc::new(ApiClient::new(&config)?);
        let notes = MedicalNotesApi::new(api.clone());
        let session = Arc::new(SessionStore::open(storage));
        tracing::debug!(base_url = %config.base_url, "chairside client ready");
        Ok(Self {
            config,
            api,
            notes,
            cache: ResourceCache::new(),
            session,
        })
    }

    /// The configuration this client was built from
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying HTTP client
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// The shared resource cache
    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// The session store consulted by route guards
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Read handle for a patient's medical notes.
    ///
    /// The query is enabled only when a positive patient id is supplied;
    /// with `None` (or an id of zero) it stays idle and issues no request,
    /// matching a view that renders before its route params resolve.
    pub fn medical_notes(
        &self,
        patient_id: Option<PatientId>,
    ) -> ResourceQuery<Vec<MedicalNote>> {
        let enabled = patient_id.is_some_and(|id| id > 0);
        let id = patient_id.unwrap_or(0);
        ResourceQuery::new(
            self.cache.clone(),
            notes_key(id),
            self.notes.fetcher(id),
            enabled,
        )
    }

    /// Create a medical note and invalidate the patient's note collection
    /// once the backend confirms the write. Concurrent creates are
    /// independent; a failed create leaves the cache untouched.
    pub async fn create_medical_note(&self, draft: NoteDraft) -> ChairsideResult<MedicalNote> {
        let mutation = ResourceMutation::new(self.cache.clone(), notes_key(draft.patient_id));
        mutation.run(self.notes.create(&draft)).await
    }
}
