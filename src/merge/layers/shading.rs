//! Shading: material slots, `SH`/`APL` stack entries and mesh attributes.

use crate::geom::{Geometry, mesh_topology_match};
use crate::merge::asset::Entity;
use crate::merge::task_layer::LayerContext;
use crate::transfer::{TransferError, TransferResult, transfer_all_attributes};

use super::{claim_and_remap_stack, sync_owned_stack};

pub(crate) fn handle_new_object(ctx: &mut LayerContext<'_>, entity: &mut Entity, owned: bool) {
    claim_and_remap_stack(ctx, entity, owned);
}

pub(crate) fn transfer_data(ctx: &mut LayerContext<'_>, source: &Entity, target: &mut Entity) -> TransferResult<()> {
    // Extra target slots go, the rest take the source's materials in order.
    target.material_slots.truncate(source.material_slots.len());
    for (idx, slot) in source.material_slots.iter().enumerate() {
        match target.material_slots.get_mut(idx) {
            Some(existing) => existing.clone_from(slot),
            None => target.material_slots.push(slot.clone()),
        }
    }

    sync_owned_stack(ctx, source, target, true);

    match (&source.geometry, &mut target.geometry) {
        (Geometry::Mesh(src), Geometry::Mesh(tgt)) => {
            if tgt.is_empty() {
                ctx.note_error(&TransferError::EmptyGeometry(format!("mesh of '{}'", target.name)));
                return Ok(());
            }
            let topo_match = mesh_topology_match(src, tgt).is_match();
            let index = if topo_match { None } else { ctx.face_index(&source.name, src) };
            let outcome = transfer_all_attributes(src, tgt, topo_match, index.as_deref())?;
            for err in &outcome.skipped {
                ctx.note_error(err);
            }
        }
        (src, tgt) if src.kind() != tgt.kind() => return Err(TransferError::incomparable(src, tgt)),
        _ => {}
    }
    Ok(())
}
