//! Runs the task layers over a source/target pair of asset graphs.

use crate::geom::SpatialIndexCache;
use crate::transfer::Severity;

use super::asset::AssetGraph;
use super::config::MergeOptions;
use super::error::MergeError;
use super::mapping::TransferMapping;
use super::report::{MergeNote, MergeReport};
use super::task_layer::{LayerContext, TaskLayer, TaskLayerRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    Idle,
    /// Index into the registry's layer list.
    Running { layer: usize },
    Done,
}

/// Sequential merge driver. One instance may run several merges one after another.
#[derive(Debug)]
pub struct Merger<'a> {
    registry: &'a TaskLayerRegistry,
    options: MergeOptions,
    state: MergeState,
}

impl<'a> Merger<'a> {
    #[must_use]
    pub fn new(registry: &'a TaskLayerRegistry, options: MergeOptions) -> Self {
        Self {
            registry,
            options,
            state: MergeState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> MergeState {
        self.state
    }

    /// Pulls the data of every layer from `source` into `target`.
    ///
    /// Fails only when `mapping` does not resolve against the two graphs, in which
    /// case `target` is untouched. Problems with single entities are recorded in the
    /// returned report and leave that entity as it was before the failing layer.
    pub fn merge(&mut self, source: &AssetGraph, target: &mut AssetGraph, mapping: &TransferMapping) -> Result<MergeReport, MergeError> {
        self.state = MergeState::Idle;
        mapping.validate(source, target)?;

        let mut report = MergeReport::new();
        let mut cache = SpatialIndexCache::new();
        let known_prefixes = self.registry.known_prefixes();

        copy_new_objects(source, target, mapping, &mut report)?;

        for (idx, layer) in self.registry.layers().iter().enumerate() {
            self.state = MergeState::Running { layer: idx };
            log::debug!("running task layer {} ({})", layer.name(), layer.prefix);
            let mut ctx = LayerContext::new(layer, mapping, &known_prefixes, &self.options, &mut cache);
            handle_new_objects(&mut ctx, source, target, &mut report);
            transfer_pairs(&mut ctx, source, target, &mut report);
            report.layers_run.push(layer.name().to_string());
        }

        report.cache = cache.stats();
        self.state = MergeState::Done;
        log::debug!(
            "merge done: {} layers, {} failed pairs, {} notes",
            report.layers_run.len(),
            report.failed_pairs.len(),
            report.notes.len()
        );
        Ok(report)
    }
}

/// Merge with the default options.
pub fn merge(
    source: &AssetGraph,
    target: &mut AssetGraph,
    mapping: &TransferMapping,
    registry: &TaskLayerRegistry,
) -> Result<MergeReport, MergeError> {
    Merger::new(registry, MergeOptions::default()).merge(source, target, mapping)
}

fn copy_new_objects(source: &AssetGraph, target: &mut AssetGraph, mapping: &TransferMapping, report: &mut MergeReport) -> Result<(), MergeError> {
    for name in &mapping.new_objects {
        let Some(entity) = source.entity(name) else {
            continue;
        };
        target.add_entity(entity.clone())?;

        let mut linked = false;
        for collection in source.direct_collections(name) {
            if let Some(target_collection) = mapping.collection_map.get(collection) {
                linked |= target.link(target_collection, name);
            }
        }
        if !linked {
            report.push(MergeNote::new(Severity::Warning, "new object has no mapped collection").on_entity(name.clone()));
        }
        log::debug!("copied new object {name}");
        report.new_objects.push(name.clone());
    }
    Ok(())
}

fn handle_new_objects(ctx: &mut LayerContext<'_>, source: &AssetGraph, target: &mut AssetGraph, report: &mut MergeReport) {
    let (layer, mapping) = (ctx.layer, ctx.mapping);
    let handle = layer.kind.handle_new_object();
    for name in &mapping.new_objects {
        let owned = source.in_collection_matching(name, &layer.collection_filter);
        let Some(entity) = target.entity_mut(name) else {
            continue;
        };
        handle(ctx, entity, owned);
        drain_notes(ctx, layer, name, report);
    }
}

fn transfer_pairs(ctx: &mut LayerContext<'_>, source: &AssetGraph, target: &mut AssetGraph, report: &mut MergeReport) {
    let (layer, mapping) = (ctx.layer, ctx.mapping);
    let transfer = layer.kind.transfer_data();
    for (source_name, target_name) in mapping.pairs() {
        if !source.in_collection_matching(source_name, &layer.collection_filter) {
            continue;
        }
        let (Some(src), Some(tgt)) = (source.entity(source_name), target.entity_mut(target_name)) else {
            continue;
        };

        // Work on a copy so a failing layer leaves the entity as it was.
        let mut working = tgt.clone();
        match transfer(ctx, src, &mut working) {
            Ok(()) => *tgt = working,
            Err(err) => {
                report.failed_pairs.push((layer.name().to_string(), source_name.to_string()));
                report.push(MergeNote::from_transfer_error(&err).in_layer(layer.name()).on_entity(source_name));
            }
        }
        drain_notes(ctx, layer, source_name, report);
    }
}

fn drain_notes(ctx: &mut LayerContext<'_>, layer: &TaskLayer, entity: &str, report: &mut MergeReport) {
    for note in ctx.take_notes() {
        report.push(note.in_layer(layer.name()).on_entity(entity));
    }
}
