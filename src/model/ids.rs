//! Newtype IDs for type-safe identification of annotation elements.
//!
//! Using newtypes prevents accidentally mixing up different kinds of IDs
//! (e.g., passing a region ID where an annotation ID is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

const GUID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const GUID_LEN: usize = 10;

/// Generates a fresh opaque identifier (10 lower-case base-36 characters).
///
/// Identifiers are only ever compared against each other for identity, never
/// parsed, so randomness is all that matters here.
pub fn guid() -> String {
    let mut bits: u64 = rand::random();
    let mut out = String::with_capacity(GUID_LEN);
    for _ in 0..GUID_LEN {
        out.push(GUID_ALPHABET[(bits % 36) as usize] as char);
        bits /= 36;
    }
    out
}

/// A unique identifier for an annotation (or prediction) within a store.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub String);

impl AnnotationId {
    /// Creates a new AnnotationId.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a fresh, randomly generated AnnotationId.
    pub fn generate() -> Self {
        Self(guid())
    }

    /// Returns the underlying string value.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnnotationId({})", self.0)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AnnotationId {
    fn from(id: &str) -> Self {
        AnnotationId::new(id)
    }
}

/// The exported identifier of a region; shared by every result on it.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
    /// Creates a new RegionId.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a fresh, randomly generated RegionId.
    pub fn generate() -> Self {
        Self(guid())
    }

    /// Returns the underlying string value.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionId({})", self.0)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RegionId {
    fn from(id: &str) -> Self {
        RegionId::new(id)
    }
}

/// An internal identifier for a single result; never exported.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResultId(pub String);

impl ResultId {
    /// Creates a fresh, randomly generated ResultId.
    pub fn generate() -> Self {
        Self(guid())
    }
}

impl fmt::Debug for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResultId({})", self.0)
    }
}

/// Index of a live tag instance inside a [`crate::tags::TagTree`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagId(pub usize);

impl fmt::Debug for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagId({})", self.0)
    }
}
