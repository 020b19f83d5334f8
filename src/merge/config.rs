//! XML configuration of the task layer registry.
//!
//! ```xml
//! <taskLayers>
//!   <options positionOffsetWarning="0.1" vertexGroupExpand="2"/>
//!   <layer name="Rigging" order="0" collection="*.rig"/>
//!   <layer name="Modeling" order="1" collection="*.geometry" prefix="GEO"/>
//! </taskLayers>
//! ```
//!
//! Attributes other than `name` fall back to the built-in values of the layer.

use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};

use crate::transfer::DEFAULT_EXPAND;

use super::error::{ConfigError, MergeError};
use super::task_layer::{TaskLayer, TaskLayerKind, TaskLayerRegistry};

/// Tolerances and tuning of one merge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergeOptions {
    /// Mean point movement above which a position transfer is reported as a warning.
    pub position_offset_warning: f64,
    /// Edge rings around the nearest source point used for vertex-group weights.
    pub vertex_group_expand: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            position_offset_warning: 0.1,
            vertex_group_expand: DEFAULT_EXPAND,
        }
    }
}

/// Parsed registry document.
#[derive(Debug, Clone)]
pub struct TaskLayerConfig {
    pub registry: TaskLayerRegistry,
    pub options: MergeOptions,
}

#[derive(Debug, Deserialize)]
struct TaskLayersDocument {
    #[serde(default)]
    options: Option<OptionsElement>,
    #[serde(default, rename = "layer")]
    layers: Vec<LayerElement>,
}

#[derive(Debug, Deserialize)]
struct OptionsElement {
    #[serde(default, rename = "@positionOffsetWarning")]
    position_offset_warning: Option<f64>,
    #[serde(default, rename = "@vertexGroupExpand")]
    vertex_group_expand: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct LayerElement {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "@order")]
    order: Option<u32>,
    #[serde(default, rename = "@collection")]
    collection: Option<String>,
    #[serde(default, rename = "@prefix")]
    prefix: Option<String>,
}

/// Reads a `<taskLayers>` document.
pub fn parse_config(xml: &str) -> Result<TaskLayerConfig, MergeError> {
    let document: TaskLayersDocument = from_str(xml)?;
    log::debug!("task layer document with {} layers", document.layers.len());
    if document.layers.is_empty() {
        return Err(ConfigError::Invalid("no task layers configured".to_string()).into());
    }

    let mut layers = Vec::with_capacity(document.layers.len());
    for element in document.layers {
        let kind = TaskLayerKind::resolve(&element.name)?;
        let mut layer = TaskLayer::builtin(kind);
        if let Some(order) = element.order {
            layer.order = order;
        }
        if let Some(collection) = element.collection {
            layer.collection_filter = collection;
        }
        if let Some(prefix) = element.prefix {
            layer.prefix = prefix.trim().to_string();
        }
        layers.push(layer);
    }

    let mut options = MergeOptions::default();
    if let Some(element) = document.options {
        if let Some(threshold) = element.position_offset_warning {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(ConfigError::Invalid(format!("positionOffsetWarning must be a non-negative number, got {threshold}")).into());
            }
            options.position_offset_warning = threshold;
        }
        if let Some(expand) = element.vertex_group_expand {
            options.vertex_group_expand = expand;
        }
    }

    Ok(TaskLayerConfig {
        registry: TaskLayerRegistry::new(layers)?,
        options,
    })
}

impl TaskLayerRegistry {
    /// Registry of a `<taskLayers>` document; options in the document are ignored.
    pub fn from_xml(xml: &str) -> Result<Self, MergeError> {
        Ok(parse_config(xml)?.registry)
    }
}

/// Closest built-in layer name to `name`, if any is reasonably close.
#[must_use]
pub fn suggest_layer_name(name: &str) -> Option<&'static str> {
    let needle = name.trim().to_lowercase();
    TaskLayerKind::ALL
        .iter()
        .map(|kind| (kind.name(), levenshtein::levenshtein(&needle, &kind.name().to_lowercase())))
        .filter(|(candidate, distance)| *distance <= (candidate.len() / 3).max(2))
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}
