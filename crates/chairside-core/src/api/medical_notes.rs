//! Medical notes endpoints
//!
//! Read contract: `GET /api/patients/{patientId}/medical-notes` returns a
//! JSON array of notes. Write contract: `POST` to the same path with
//! `{title, content, noteType}` returns the created note. Failure bodies
//! are opaque.

use super::ApiClient;
use crate::cache::{from_fn, CacheKey, ResourceFetcher};
use crate::error::{ChairsideError, ChairsideResult};
use crate::types::{MedicalNote, NoteDraft, PatientId};
use std::sync::Arc;

/// Endpoint path for a patient's medical-note collection
pub fn notes_path(patient_id: PatientId) -> String {
    format!("/api/patients/{patient_id}/medical-notes")
}

/// Cache key for a patient's medical-note collection:
/// `patients/{id}/medical-notes`
pub fn notes_key(patient_id: PatientId) -> CacheKey {
    CacheKey::root("patients")
        .push(patient_id)
        .push("medical-notes")
}

/// Typed wrapper over the medical-notes endpoints
#[derive(Debug, Clone)]
pub struct MedicalNotesApi {
    client: Arc<ApiClient>,
}

impl MedicalNotesApi {
    /// Create the endpoint wrapper
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Fetch all medical notes for a patient
    pub async fn list(&self, patient_id: PatientId) -> ChairsideResult<Vec<MedicalNote>> {
        if patient_id == 0 {
            return Err(ChairsideError::invalid_input(
                "patient id must be a positive integer",
            ));
        }
        self.client.get_json(&notes_path(patient_id)).await
    }

    /// Create a medical note for the draft's patient
    pub async fn create(&self, draft: &NoteDraft) -> ChairsideResult<MedicalNote> {
        if draft.patient_id == 0 {
            return Err(ChairsideError::invalid_input(
                "patient id must be a positive integer",
            ));
        }
        self.client
            .post_json(&notes_path(draft.patient_id), draft)
            .await
    }

    /// Cache fetcher for a patient's note collection.
    ///
    /// The response is decoded into `Vec<MedicalNote>` before it reaches
    /// the cache, so shape validation happens here at the boundary.
    pub fn fetcher(&self, patient_id: PatientId) -> Arc<dyn ResourceFetcher> {
        let api = self.clone();
        from_fn(move || {
            let api = api.clone();
            async move {
                let notes = api.list(patient_id).await?;
                Ok(serde_json::to_value(notes)?)
            }
        })
    }
}
