//! Task layers: who owns which data, and the routines that move it.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geom::{Mesh, PointIndex, SpatialIndex, SpatialIndexCache};
use crate::transfer::{Severity, TransferError, TransferResult};

use super::asset::Entity;
use super::config::{MergeOptions, suggest_layer_name};
use super::error::{ConfigError, MergeError};
use super::layers;
use super::mapping::TransferMapping;
use super::naming::{APPLY_AFTER_PUSH, NAME_DELIMITER};
use super::report::MergeNote;

/// Runs once per new entity; `owned` tells whether the entity lies in the layer's collections.
pub type NewObjectFn = fn(&mut LayerContext<'_>, &mut Entity, bool);
/// Moves the layer's data from a source entity onto its mapped target entity.
pub type TransferDataFn = fn(&mut LayerContext<'_>, &Entity, &mut Entity) -> TransferResult<()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskLayerKind {
    Rigging,
    Modeling,
    Grooming,
    Shading,
}

impl TaskLayerKind {
    pub const ALL: [Self; 4] = [Self::Rigging, Self::Modeling, Self::Grooming, Self::Shading];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rigging => "Rigging",
            Self::Modeling => "Modeling",
            Self::Grooming => "Grooming",
            Self::Shading => "Shading",
        }
    }

    #[must_use]
    pub const fn default_prefix(self) -> &'static str {
        match self {
            Self::Rigging => "RIG",
            Self::Modeling => "GEO",
            Self::Grooming => "GRM",
            Self::Shading => "SH",
        }
    }

    #[must_use]
    pub const fn default_filter(self) -> &'static str {
        match self {
            Self::Rigging => "*.rig",
            Self::Modeling => "*.geometry",
            Self::Grooming => "*.hair",
            Self::Shading => "*.shading",
        }
    }

    #[must_use]
    pub const fn default_order(self) -> u32 {
        match self {
            Self::Rigging => 0,
            Self::Modeling => 1,
            Self::Grooming => 2,
            Self::Shading => 3,
        }
    }

    /// Case-insensitive lookup of a built-in layer.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// Like [`Self::from_name`], failing with the closest known name as a hint.
    pub fn resolve(name: &str) -> Result<Self, MergeError> {
        Self::from_name(name).ok_or_else(|| MergeError::UnknownTaskLayer {
            name: name.to_string(),
            suggestion: suggest_layer_name(name).map(str::to_string),
        })
    }

    #[must_use]
    pub fn handle_new_object(self) -> NewObjectFn {
        match self {
            Self::Rigging => layers::rigging::handle_new_object,
            Self::Modeling => layers::modeling::handle_new_object,
            Self::Grooming => layers::grooming::handle_new_object,
            Self::Shading => layers::shading::handle_new_object,
        }
    }

    #[must_use]
    pub fn transfer_data(self) -> TransferDataFn {
        match self {
            Self::Rigging => layers::rigging::transfer_data,
            Self::Modeling => layers::modeling::transfer_data,
            Self::Grooming => layers::grooming::transfer_data,
            Self::Shading => layers::shading::transfer_data,
        }
    }
}

/// A configured layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLayer {
    pub kind: TaskLayerKind,
    pub order: u32,
    pub prefix: String,
    /// Glob over collection names selecting the entities this layer transfers.
    pub collection_filter: String,
}

impl TaskLayer {
    #[must_use]
    pub fn builtin(kind: TaskLayerKind) -> Self {
        Self {
            kind,
            order: kind.default_order(),
            prefix: kind.default_prefix().to_string(),
            collection_filter: kind.default_filter().to_string(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Layers in the order they run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLayerRegistry {
    layers: Vec<TaskLayer>,
}

impl Default for TaskLayerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TaskLayerRegistry {
    /// Rigging, Modeling, Grooming, Shading with their default prefixes and filters.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            layers: TaskLayerKind::ALL.into_iter().map(TaskLayer::builtin).collect(),
        }
    }

    /// Sorts by `order`; each kind and each prefix may appear only once.
    pub fn new(mut layers: Vec<TaskLayer>) -> Result<Self, MergeError> {
        let mut kinds = HashSet::new();
        let mut prefixes = HashSet::new();
        for layer in &layers {
            if !kinds.insert(layer.kind) {
                return Err(MergeError::DuplicateTaskLayer(layer.name().to_string()));
            }
            if layer.prefix.is_empty() || layer.prefix.contains(NAME_DELIMITER) {
                return Err(ConfigError::Invalid(format!("invalid prefix '{}' for {}", layer.prefix, layer.name())).into());
            }
            if layer.prefix == APPLY_AFTER_PUSH || !prefixes.insert(layer.prefix.clone()) {
                return Err(ConfigError::Invalid(format!("prefix '{}' of {} is already taken", layer.prefix, layer.name())).into());
            }
        }
        layers.sort_by_key(|layer| (layer.order, layer.kind.default_order()));
        Ok(Self { layers })
    }

    #[must_use]
    pub fn layers(&self) -> &[TaskLayer] {
        &self.layers
    }

    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&TaskLayer> {
        let kind = TaskLayerKind::from_name(name)?;
        self.layers.iter().find(|layer| layer.kind == kind)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(TaskLayer::name).collect()
    }

    /// Every layer prefix plus the apply-after-push prefix.
    #[must_use]
    pub fn known_prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self.layers.iter().map(|layer| layer.prefix.clone()).collect();
        prefixes.push(APPLY_AFTER_PUSH.to_string());
        prefixes
    }
}

/// Everything a layer routine may touch besides the entities themselves.
pub struct LayerContext<'a> {
    pub layer: &'a TaskLayer,
    pub mapping: &'a TransferMapping,
    pub known_prefixes: &'a [String],
    pub options: &'a MergeOptions,
    cache: &'a mut SpatialIndexCache,
    notes: Vec<MergeNote>,
}

impl<'a> LayerContext<'a> {
    pub fn new(
        layer: &'a TaskLayer,
        mapping: &'a TransferMapping,
        known_prefixes: &'a [String],
        options: &'a MergeOptions,
        cache: &'a mut SpatialIndexCache,
    ) -> Self {
        Self {
            layer,
            mapping,
            known_prefixes,
            options,
            cache,
            notes: Vec::new(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.layer.prefix
    }

    /// The layer's own prefix plus the apply-after-push prefix.
    #[must_use]
    pub fn stack_prefixes(&self) -> [&str; 2] {
        [self.layer.prefix.as_str(), APPLY_AFTER_PUSH]
    }

    /// Target-side name of a source entity reference.
    #[must_use]
    pub fn remap_name(&self, name: &str) -> String {
        self.mapping.object_map.get(name).cloned().unwrap_or_else(|| name.to_string())
    }

    /// Face index of the mesh of source entity `key`, built once per merge.
    pub fn face_index(&mut self, key: &str, mesh: &Mesh) -> Option<Arc<SpatialIndex>> {
        self.cache.face_index(key, mesh)
    }

    pub fn point_index(&mut self, key: &str, mesh: &Mesh) -> Option<Arc<PointIndex>> {
        self.cache.point_index(key, mesh)
    }

    pub fn note(&mut self, severity: Severity, message: impl Into<String>) {
        self.notes.push(MergeNote::new(severity, message));
    }

    /// Records a problem that did not stop the current pair.
    pub fn note_error(&mut self, err: &TransferError) {
        self.notes.push(MergeNote::from_transfer_error(err));
    }

    pub fn take_notes(&mut self) -> Vec<MergeNote> {
        std::mem::take(&mut self.notes)
    }
}
