use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::{AttributeKind, Domain, Geometry, TopologyMatch};

/// Result type for per-element transfer routines.
pub type TransferResult<T> = Result<T, TransferError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Failure of one transfer routine on one element (channel, morph target, pair).
///
/// Never aborts a merge: the task layer records it and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransferError {
    #[error("cannot compare {source_kind} geometry with {target_kind} geometry")]
    IncomparableTopology {
        source_kind: &'static str,
        target_kind: &'static str,
    },
    #[error("'{item}' refers to missing '{reference}'")]
    DanglingReference { item: String, reference: String },
    #[error("relative key of '{item}' closes a cycle: {}", .chain.join(" -> "))]
    CyclicReference { item: String, chain: Vec<String> },
    #[error("attribute '{channel}' ({} on {}) cannot be transferred by proximity", .kind.label(), .domain.label())]
    UnsupportedProximityDomain {
        channel: String,
        domain: Domain,
        kind: AttributeKind,
    },
    #[error("{0} has no geometry to transfer onto")]
    EmptyGeometry(String),
    #[error("'{channel}' has {found} elements, expected {expected}")]
    LengthMismatch {
        channel: String,
        expected: usize,
        found: usize,
    },
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("missing entity '{0}'")]
    MissingEntity(String),
}

impl TransferError {
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::UnsupportedProximityDomain { .. } | Self::EmptyGeometry(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Name of the channel or morph target the error is about, if any.
    #[must_use]
    pub fn channel(&self) -> Option<&str> {
        match self {
            Self::UnsupportedProximityDomain { channel, .. } | Self::LengthMismatch { channel, .. } => Some(channel),
            Self::DanglingReference { item, .. } | Self::CyclicReference { item, .. } => Some(item),
            _ => None,
        }
    }

    #[must_use]
    pub fn incomparable(source: &Geometry, target: &Geometry) -> Self {
        Self::IncomparableTopology {
            source_kind: source.kind().label(),
            target_kind: target.kind().label(),
        }
    }
}

impl TopologyMatch {
    /// `Incomparable` becomes an error; `Match`/`Mismatch` map to `true`/`false`.
    pub fn require_comparable(self, source: &Geometry, target: &Geometry) -> TransferResult<bool> {
        match self {
            Self::Match => Ok(true),
            Self::Mismatch => Ok(false),
            Self::Incomparable => Err(TransferError::incomparable(source, target)),
        }
    }
}
