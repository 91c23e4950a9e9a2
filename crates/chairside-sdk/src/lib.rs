//! Chairside SDK
//!
//! High-level entry point for the Chairside client data layer: build a
//! [`ChairsideClient`] from a [`ClientConfig`] and hand out resource
//! queries, mutations and the session store from one place.

mod client;
mod version;

pub use client::ChairsideClient;
pub use version::{user_agent, VERSION};

// Re-export the core surface embedders work with
pub use chairside_core::{
    CacheKey, ChairsideError, ChairsideResult, ClientConfig, Employee, MedicalNote, NoteDraft,
    PatientId, ResourceQuery, ResourceState, ResourceStatus, SessionState, SessionStore,
    TimeoutConfig,
};
