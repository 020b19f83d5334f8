//! Record of everything a merge skipped, warned about or failed on.
//!
//! The log stream carries the same events as they happen; the report collects them
//! so callers can inspect a merge after the fact:
//!
//! ```ignore
//! let report = merge(&source, &mut target, &mapping, &registry)?;
//! if !report.is_clean() {
//!     for note in report.errors() {
//!         eprintln!("{note}");
//!     }
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geom::SpatialIndexCacheStats;
use crate::transfer::{Severity, TransferError};

/// One event of a merge, located by layer, entity and channel where known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeNote {
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Attribute channel, morph target or stack entry the note is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub message: String,
}

impl MergeNote {
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            layer: None,
            entity: None,
            channel: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn from_transfer_error(err: &TransferError) -> Self {
        let mut note = Self::new(err.severity(), err.to_string());
        note.channel = err.channel().map(str::to_string);
        note
    }

    #[must_use]
    pub fn in_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    #[must_use]
    pub fn on_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl fmt::Display for MergeNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "[{level}]")?;
        if let Some(layer) = &self.layer {
            write!(f, " {layer}")?;
        }
        if let Some(entity) = &self.entity {
            write!(f, " {entity}")?;
        }
        if let Some(channel) = &self.channel {
            write!(f, " ({channel})")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Outcome of one merge invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Layers in the order they ran.
    pub layers_run: Vec<String>,
    /// Source entities copied into the target.
    pub new_objects: Vec<String>,
    /// `(layer, source entity)` pairs whose transfer failed and was rolled back.
    pub failed_pairs: Vec<(String, String)>,
    pub notes: Vec<MergeNote>,
    /// Spatial index cache usage of this merge.
    #[serde(default)]
    pub cache: SpatialIndexCacheStats,
}

impl MergeReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, note: MergeNote) {
        match note.severity {
            Severity::Error => log::error!("{note}"),
            Severity::Warning => log::warn!("{note}"),
            Severity::Info => log::debug!("{note}"),
        }
        self.notes.push(note);
    }

    pub fn errors(&self) -> impl Iterator<Item = &MergeNote> {
        self.notes.iter().filter(|n| n.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &MergeNote> {
        self.notes.iter().filter(|n| n.severity == Severity::Warning)
    }

    /// No warnings and no errors.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.notes.iter().all(|n| n.severity == Severity::Info)
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Merge Report:")?;
        writeln!(f, "  Layers: {}", self.layers_run.join(", "))?;
        if !self.new_objects.is_empty() {
            writeln!(f, "  New objects: {}", self.new_objects.join(", "))?;
        }
        if !self.failed_pairs.is_empty() {
            writeln!(f, "  Failed pairs:")?;
            for (layer, entity) in &self.failed_pairs {
                writeln!(f, "    - {layer}: {entity}")?;
            }
        }
        writeln!(
            f,
            "  Index cache: {} face, {} point, {:.0}% hits",
            self.cache.face_index_entries,
            self.cache.point_index_entries,
            self.cache.hit_rate() * 100.0
        )?;
        if !self.notes.is_empty() {
            writeln!(f, "  Notes:")?;
            for note in &self.notes {
                writeln!(f, "    - {note}")?;
            }
        }
        Ok(())
    }
}
