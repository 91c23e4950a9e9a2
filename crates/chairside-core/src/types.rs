//! Shared domain types for the Chairside client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend-issued patient identifier
pub type PatientId = u64;

/// Backend-issued medical note identifier
pub type NoteId = u64;

/// Backend-issued employee identifier
pub type EmployeeId = u64;

/// Backend-issued role identifier
pub type RoleId = u64;

/// A medical note attached to a patient record.
///
/// Notes are owned by the backend; the client only ever holds read-only
/// projections of them inside cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalNote {
    pub id: NoteId,
    pub patient_id: PatientId,
    pub title: String,
    pub content: String,
    /// Free-form note category, e.g. "exam", "treatment", "followup"
    pub note_type: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a medical note.
///
/// The patient id rides in the endpoint URL, not the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    #[serde(skip)]
    pub patient_id: PatientId,
    pub title: String,
    pub content: String,
    pub note_type: String,
}

impl NoteDraft {
    /// Create a draft for the given patient
    pub fn new(
        patient_id: PatientId,
        title: impl Into<String>,
        content: impl Into<String>,
        note_type: impl Into<String>,
    ) -> Self {
        Self {
            patient_id,
            title: title.into(),
            content: content.into(),
            note_type: note_type.into(),
        }
    }
}

/// An employee of the practice, as returned by the backend after a
/// successful credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role_id: RoleId,
    pub is_active: bool,
}

impl Employee {
    /// Display name used in avatars and headers
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Initials used as the avatar fallback when no photo exists
    pub fn initials(&self) -> String {
        let first = self.first_name.chars().next();
        let last = self.last_name.chars().next();
        first
            .into_iter()
            .chain(last)
            .flat_map(|c| c.to_uppercase())
            .collect()
    }
}
