//! Persisted session store
//!
//! Process-wide authentication state with two observable states:
//! anonymous and authenticated. Every transition is mirrored to durable
//! storage under a fixed key, and the store rehydrates from that blob at
//! startup so a session survives a process restart. Credential
//! verification is not this layer's job: `login` trusts its caller.

pub mod storage;

pub use storage::{FileStateStorage, MemoryStateStorage, StateStorage};

use crate::error::ChairsideResult;
use crate::types::Employee;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Fixed durable-storage key for the session blob
pub const SESSION_STORAGE_KEY: &str = "chairside-auth";

/// Observable authentication state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// The signed-in employee, if any
    pub employee: Option<Employee>,
    /// Derived flag kept in the blob so rehydration needs no recomputation
    pub is_authenticated: bool,
}

impl SessionState {
    /// The signed-out state
    pub fn anonymous() -> Self {
        Self {
            employee: None,
            is_authenticated: false,
        }
    }

    /// The signed-in state for `employee`
    pub fn authenticated(employee: Employee) -> Self {
        Self {
            employee: Some(employee),
            is_authenticated: true,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Process-wide session store.
///
/// One instance exists per client; every reader observes the same state
/// and mutation only happens through [`SessionStore::login`] and
/// [`SessionStore::logout`]. Route guards consult
/// [`SessionStore::is_authenticated`] to gate protected views.
pub struct SessionStore {
    state: RwLock<SessionState>,
    storage: Box<dyn StateStorage>,
}

impl SessionStore {
    /// Open the store, rehydrating from durable storage.
    ///
    /// An absent or malformed blob starts the store anonymous; no error
    /// escapes initialization. A blob claiming authentication without an
    /// employee record is treated as malformed.
    pub fn open(storage: Box<dyn StateStorage>) -> Self {
        let state = match storage.retrieve(SESSION_STORAGE_KEY) {
            Some(state) if state.is_authenticated && state.employee.is_none() => {
                warn!("session blob authenticated without employee, starting anonymous");
                SessionState::anonymous()
            }
            Some(state) => {
                debug!(
                    is_authenticated = state.is_authenticated,
                    "session rehydrated"
                );
                state
            }
            None => SessionState::anonymous(),
        };
        Self {
            state: RwLock::new(state),
            storage,
        }
    }

    /// Transition to authenticated, unconditionally.
    ///
    /// The caller is trusted to have verified credentials already. The
    /// new state takes effect immediately; a failure to persist it is
    /// reported but does not roll the transition back.
    pub fn login(&self, employee: Employee) -> ChairsideResult<()> {
        let next = SessionState::authenticated(employee);
        *self.state.write() = next.clone();
        self.storage.store(SESSION_STORAGE_KEY, &next)
    }

    /// Transition to anonymous. Idempotent: logging out while anonymous
    /// persists the same cleared state again.
    pub fn logout(&self) -> ChairsideResult<()> {
        let next = SessionState::anonymous();
        *self.state.write() = next.clone();
        self.storage.store(SESSION_STORAGE_KEY, &next)
    }

    /// Snapshot of the current state
    pub fn current(&self) -> SessionState {
        self.state.read().clone()
    }

    /// The signed-in employee, if any
    pub fn employee(&self) -> Option<Employee> {
        self.state.read().employee.clone()
    }

    /// Whether a session is active
    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated
    }
}
