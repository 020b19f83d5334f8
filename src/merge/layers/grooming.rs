//! Grooming: hair curves and their surface reference.

use crate::geom::Geometry;
use crate::merge::asset::Entity;
use crate::merge::task_layer::LayerContext;
use crate::transfer::{TransferError, TransferResult};

use super::{claim_and_remap_stack, sync_owned_stack};

pub(crate) fn handle_new_object(ctx: &mut LayerContext<'_>, entity: &mut Entity, owned: bool) {
    claim_and_remap_stack(ctx, entity, owned);
    if let Geometry::Curve(curve) = &mut entity.geometry {
        if let Some(surface) = curve.surface.as_deref() {
            curve.surface = Some(ctx.remap_name(surface));
        }
    }
}

pub(crate) fn transfer_data(ctx: &mut LayerContext<'_>, source: &Entity, target: &mut Entity) -> TransferResult<()> {
    target.transform = source.transform;
    match (&source.geometry, &mut target.geometry) {
        (Geometry::Curve(src), Geometry::Curve(tgt)) => {
            src.validate().map_err(TransferError::InvalidGeometry)?;
            tgt.splines.clone_from(&src.splines);
            tgt.surface = src.surface.as_deref().map(|s| ctx.remap_name(s));
        }
        (src, tgt) if src.kind() != tgt.kind() => return Err(TransferError::incomparable(src, tgt)),
        _ => {}
    }
    sync_owned_stack(ctx, source, target, true);
    Ok(())
}
