//! Asset graphs, task layers and the merge that reconciles them.

pub mod asset;
pub mod config;
pub mod error;
pub mod layers;
pub mod mapping;
pub mod naming;
pub mod orchestrator;
pub mod report;
pub mod task_layer;

pub use asset::{AssetGraph, Collection, Entity, Transform};
pub use config::{MergeOptions, TaskLayerConfig, parse_config};
pub use error::{ConfigError, MergeError};
pub use mapping::TransferMapping;
pub use orchestrator::{MergeState, Merger, merge};
pub use report::{MergeNote, MergeReport};
pub use task_layer::{LayerContext, TaskLayer, TaskLayerKind, TaskLayerRegistry};
