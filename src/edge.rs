//! Edge types - Typed relationships between entities
//!
//! Two relationships are recorded:
//! - `Calls`: method → method
//! - `Instantiates`: method → class
//!
//! Every edge also carries a [`Confidence`]. Low confidence means the target was
//! identified by name and argument count only, without knowing its declaring type.

use crate::identity::EntityKey;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// A method invokes another method
    Calls,
    /// A method constructs an instance of a class
    Instantiates,
}

impl EdgeKind {
    /// Get the string representation of the edge kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Calls => "calls",
            EdgeKind::Instantiates => "instantiates",
        }
    }
}

impl FromStr for EdgeKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "calls" | "call" => Ok(EdgeKind::Calls),
            "instantiates" | "instantiate" | "new" => Ok(EdgeKind::Instantiates),
            _ => Err(crate::Error::InvalidKey(format!("Unknown edge kind: {}", s))),
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How reliably an edge's target was identified.
///
/// Ordered so that `High > Low`; merging observations keeps the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::High => "high",
        }
    }

    pub fn is_low(&self) -> bool {
        matches!(self, Confidence::Low)
    }
}

impl FromStr for Confidence {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Confidence::Low),
            "high" => Ok(Confidence::High),
            _ => Err(crate::Error::InvalidKey(format!("Unknown confidence: {}", s))),
        }
    }
}

/// An edge of a model snapshot, with both endpoints spelled out as keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: EntityKey,
    pub kind: EdgeKind,
    pub target: EntityKey,
    pub confidence: Confidence,
}

impl Edge {
    /// Create a new fully resolved edge
    pub fn new(source: EntityKey, target: EntityKey, kind: EdgeKind) -> Self {
        Self::with_confidence(source, target, kind, Confidence::High)
    }

    pub fn with_confidence(
        source: EntityKey,
        target: EntityKey,
        kind: EdgeKind,
        confidence: Confidence,
    ) -> Self {
        Self {
            source,
            kind,
            target,
            confidence,
        }
    }

    /// Check if the edge starts at the unscoped root
    pub fn is_unscoped(&self) -> bool {
        self.source.is_unscoped_root()
    }
}
