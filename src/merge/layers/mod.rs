//! Built-in task layer routines.

pub mod grooming;
pub mod modeling;
pub mod rigging;
pub mod shading;

use crate::transfer::{Severity, StackEntry, StackSyncReport, claim_unprefixed, remap_references, sync_stack};

use super::asset::Entity;
use super::naming::{APPLY_AFTER_PUSH, is_owned_by};
use super::task_layer::LayerContext;

/// Claims unprefixed stack entries for the layer (only when it owns the entity) and
/// points the references of its entries and the apply-after-push entries at target names.
pub(crate) fn claim_and_remap_stack(ctx: &mut LayerContext<'_>, entity: &mut Entity, owned: bool) {
    if owned {
        claim(ctx, &mut entity.stack, "stack entries");
    }
    let remapped = remap_owned(ctx, &mut entity.stack, &ctx.stack_prefixes());
    if remapped > 0 {
        log::debug!("{}: remapped references of {remapped} stack entries", entity.name);
    }
}

/// Same as [`claim_and_remap_stack`] for constraints, which have no apply-after-push entries.
pub(crate) fn claim_and_remap_constraints(ctx: &mut LayerContext<'_>, entity: &mut Entity, owned: bool) {
    if owned {
        claim(ctx, &mut entity.constraints, "constraints");
    }
    let remapped = remap_owned(ctx, &mut entity.constraints, &[ctx.prefix()]);
    if remapped > 0 {
        log::debug!("{}: remapped targets of {remapped} constraints", entity.name);
    }
}

fn claim(ctx: &mut LayerContext<'_>, entries: &mut [StackEntry], what: &str) {
    let claimed = claim_unprefixed(entries, ctx.prefix(), ctx.known_prefixes);
    if claimed > 0 {
        ctx.note(Severity::Info, format!("claimed {claimed} {what}"));
    }
}

fn remap_owned(ctx: &LayerContext<'_>, entries: &mut [StackEntry], prefixes: &[&str]) -> usize {
    entries
        .iter_mut()
        .filter(|e| is_owned_by(&e.name, prefixes))
        .map(|e| remap_references(e, ctx.mapping))
        .filter(|&changed| changed)
        .count()
}

/// Syncs the layer's stack entries, plus the apply-after-push ones if asked, and notes what changed.
pub(crate) fn sync_owned_stack(ctx: &mut LayerContext<'_>, source: &Entity, target: &mut Entity, with_apply_after_push: bool) {
    let layer = ctx.layer;
    let mut prefixes = vec![layer.prefix.as_str()];
    if with_apply_after_push {
        prefixes.push(APPLY_AFTER_PUSH);
    }
    let report = sync_stack(&source.stack, &mut target.stack, &prefixes, ctx.mapping);
    note_sync(ctx, "stack", &report);
}

/// Syncs the layer's constraints; their targets are remapped like stack references.
pub(crate) fn sync_owned_constraints(ctx: &mut LayerContext<'_>, source: &Entity, target: &mut Entity) {
    let layer = ctx.layer;
    let report = sync_stack(&source.constraints, &mut target.constraints, &[layer.prefix.as_str()], ctx.mapping);
    note_sync(ctx, "constraints", &report);
}

fn note_sync(ctx: &mut LayerContext<'_>, what: &str, report: &StackSyncReport) {
    if report.is_empty() {
        return;
    }
    ctx.note(
        Severity::Info,
        format!(
            "{what}: {} added, {} removed, {} settings updated",
            report.added.len(),
            report.removed.len(),
            report.updated.len()
        ),
    );
}
