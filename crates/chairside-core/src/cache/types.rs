//! Cache types and data structures

use crate::error::ChairsideError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One segment of a [`CacheKey`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// Literal path segment, e.g. `"patients"`
    Text(String),
    /// Numeric identifier segment, e.g. a patient id
    Id(u64),
}

impl From<&str> for Segment {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Segment {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for Segment {
    fn from(value: u64) -> Self {
        Self::Id(value)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Id(n) => write!(f, "{n}"),
        }
    }
}

/// Structural identifier for a cached remote resource collection.
///
/// Equality is structural: same segments, same values, same order. A key
/// like `patients/7/medical-notes` identifies the medical-note collection
/// of patient 7, and invalidating `patients/7` reaches every key it
/// prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(Vec<Segment>);

impl CacheKey {
    /// Create a key from an ordered list of segments
    pub fn new(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self(segments.into_iter().collect())
    }

    /// Create a single-segment key
    pub fn root(segment: impl Into<Segment>) -> Self {
        Self(vec![segment.into()])
    }

    /// Append a segment, returning the extended key
    pub fn push(mut self, segment: impl Into<Segment>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// The key's segments in order
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key has no segments
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `prefix` equals this key or is a strict prefix of it.
    ///
    /// `patients/7/medical-notes` starts with `patients/7` and with
    /// itself, but not with `patients/8` or `patients/7/medical-notes/1`.
    pub fn starts_with(&self, prefix: &CacheKey) -> bool {
        prefix.0.len() <= self.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                write!(f, "/")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}

/// Observable status of a cached resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    /// The read is disabled; no request has been issued
    Idle,
    /// A request is in flight
    Pending,
    /// The last fetch succeeded and the cached data is usable
    Success,
    /// The last fetch failed; the error is retained for display and retry
    Error,
}

/// A single slot in the resource cache.
///
/// Exactly one entry exists per distinct key. The entry is created on the
/// first read, transitions status in place, and is only ever refreshed
/// through explicit invalidation; there is no TTL and no eviction.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Current status of the entry
    pub status: ResourceStatus,
    /// Decoded payload of the last successful fetch
    pub data: Option<serde_json::Value>,
    /// Error of the last failed fetch
    pub error: Option<ChairsideError>,
    /// When the last successful fetch completed
    pub fetched_at: Option<DateTime<Utc>>,
    /// Set by invalidation; a stale entry keeps serving its data but the
    /// next read (or a subscribed background refetch) replaces it
    pub stale: bool,
}

impl CacheEntry {
    /// A fresh entry that has never been fetched
    pub fn pending() -> Self {
        Self {
            status: ResourceStatus::Pending,
            data: None,
            error: None,
            fetched_at: None,
            stale: false,
        }
    }

    /// Transition to pending ahead of a fetch, keeping any previously
    /// fetched data around so stale values stay displayable while the
    /// refetch is in flight
    pub fn begin(&mut self) {
        self.status = ResourceStatus::Pending;
    }

    /// Record a successful fetch
    pub fn complete(&mut self, data: serde_json::Value) {
        self.status = ResourceStatus::Success;
        self.data = Some(data);
        self.error = None;
        self.fetched_at = Some(Utc::now());
        self.stale = false;
    }

    /// Record a failed fetch, keeping the entry around so the UI can show
    /// the error and offer a manual retry
    pub fn fail(&mut self, error: ChairsideError) {
        self.status = ResourceStatus::Error;
        self.error = Some(error);
        self.stale = false;
    }

    /// Whether the entry can serve reads without a network round trip
    pub fn is_fresh(&self) -> bool {
        self.status == ResourceStatus::Success && !self.stale
    }
}

/// Decoded, caller-facing snapshot of a cached resource
#[derive(Debug, Clone)]
pub struct ResourceState<T> {
    /// Current status
    pub status: ResourceStatus,
    /// Decoded payload, present once a fetch has succeeded
    pub data: Option<T>,
    /// Error of the last failed fetch
    pub error: Option<ChairsideError>,
    /// When the data was fetched
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> ResourceState<T> {
    /// Snapshot for a disabled read
    pub fn idle() -> Self {
        Self {
            status: ResourceStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
        }
    }

    /// Whether the snapshot holds successfully fetched data
    pub fn is_success(&self) -> bool {
        self.status == ResourceStatus::Success
    }

    /// Whether a request is currently in flight
    pub fn is_loading(&self) -> bool {
        self.status == ResourceStatus::Pending
    }
}
