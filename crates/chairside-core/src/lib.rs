//! Chairside core library
//!
//! Client-side data layer for the Chairside dental practice management
//! app: a key-addressed remote resource cache with request deduplication
//! and explicit invalidation, a file-persisted session store, and the
//! typed HTTP client both build on.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use api::{ApiClient, MedicalNotesApi};
pub use cache::{
    CacheEntry, CacheKey, ResourceCache, ResourceMutation, ResourceQuery, ResourceState,
    ResourceStatus, Segment,
};
pub use config::{ClientConfig, TimeoutConfig};
pub use error::{ChairsideError, ChairsideResult};
pub use session::{SessionState, SessionStore, StateStorage};
pub use types::{Employee, EmployeeId, MedicalNote, NoteDraft, NoteId, PatientId, RoleId};
