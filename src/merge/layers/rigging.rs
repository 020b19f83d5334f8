//! Rigging: deformation stack entries, constraints and vertex-group weights.

use crate::geom::mesh_topology_match;
use crate::merge::asset::Entity;
use crate::merge::task_layer::LayerContext;
use crate::transfer::{Severity, TransferResult, transfer_vertex_groups};

use super::{claim_and_remap_constraints, claim_and_remap_stack, sync_owned_constraints, sync_owned_stack};

pub(crate) fn handle_new_object(ctx: &mut LayerContext<'_>, entity: &mut Entity, owned: bool) {
    claim_and_remap_stack(ctx, entity, owned);
    claim_and_remap_constraints(ctx, entity, owned);
}

pub(crate) fn transfer_data(ctx: &mut LayerContext<'_>, source: &Entity, target: &mut Entity) -> TransferResult<()> {
    sync_owned_stack(ctx, source, target, false);
    sync_owned_constraints(ctx, source, target);

    let (Some(src), Some(tgt)) = (source.geometry.as_mesh(), target.geometry.as_mesh_mut()) else {
        return Ok(());
    };
    if src.vertex_groups.is_empty() {
        return Ok(());
    }
    let topo_match = mesh_topology_match(src, tgt).is_match();
    let index = if topo_match { None } else { ctx.point_index(&source.name, src) };
    let names = transfer_vertex_groups(src, tgt, topo_match, index.as_deref(), ctx.options.vertex_group_expand)?;
    if !topo_match {
        ctx.note(Severity::Info, format!("{} vertex groups transferred by proximity", names.len()));
    }
    Ok(())
}
