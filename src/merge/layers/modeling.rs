//! Modeling: transform, parent, point positions or the whole geometry buffer,
//! `GEO` morph targets and `GEO`/`APL` stack entries.
//!
//! When the topology changed, the target takes the source's buffer and whatever
//! other layers had stored on the old buffer (attributes, their morph targets,
//! vertex groups) is re-projected onto it by proximity.

use crate::geom::{Curve, Geometry, Mesh, PointIndex, SpatialIndex, topology_match};
use crate::merge::asset::Entity;
use crate::merge::task_layer::LayerContext;
use crate::transfer::{
    Severity, TransferError, TransferResult, clear_dangling_relative_keys, transfer_all_attributes, transfer_foreign_morph_targets,
    transfer_morph_targets, transfer_positions, transfer_vertex_groups,
};

use super::{claim_and_remap_stack, sync_owned_stack};

pub(crate) fn handle_new_object(ctx: &mut LayerContext<'_>, entity: &mut Entity, owned: bool) {
    claim_and_remap_stack(ctx, entity, owned);
    if let Some(parent) = entity.parent.as_deref() {
        let remapped = ctx.remap_name(parent);
        if remapped != parent {
            entity.parent = Some(remapped);
        }
    }
}

pub(crate) fn transfer_data(ctx: &mut LayerContext<'_>, source: &Entity, target: &mut Entity) -> TransferResult<()> {
    target.transform = source.transform;
    target.parent = source.parent.as_deref().map(|p| ctx.remap_name(p));

    let both_empty = matches!((&source.geometry, &target.geometry), (Geometry::Empty, Geometry::Empty));
    if !both_empty {
        source.geometry.validate().map_err(TransferError::InvalidGeometry)?;
        let topo_match = topology_match(&source.geometry, &target.geometry).require_comparable(&source.geometry, &target.geometry)?;
        match (&source.geometry, &mut target.geometry) {
            (Geometry::Mesh(src), Geometry::Mesh(tgt)) => transfer_mesh(ctx, src, tgt, topo_match)?,
            (Geometry::Curve(src), Geometry::Curve(tgt)) => transfer_curve(src, tgt, topo_match),
            _ => {}
        }
    }

    sync_owned_stack(ctx, source, target, true);
    Ok(())
}

fn transfer_mesh(ctx: &mut LayerContext<'_>, src: &Mesh, tgt: &mut Mesh, topo_match: bool) -> TransferResult<()> {
    if topo_match {
        let moved = transfer_positions(src, tgt)?;
        if moved.mean_offset > ctx.options.position_offset_warning {
            ctx.note(
                Severity::Warning,
                format!("points moved {:.3} on average (max {:.3})", moved.mean_offset, moved.max_offset),
            );
        }
    } else {
        replace_mesh(ctx, src, tgt)?;
    }

    // The target now has the source's topology either way.
    let prefix = ctx.prefix().to_string();
    let report = transfer_morph_targets(src, tgt, &prefix, true, None)?;
    if report.basis_created {
        ctx.note(Severity::Info, "created base morph target");
    }
    // Other layers' morph targets may be relative to one that was not recreated.
    let dangling = clear_dangling_relative_keys(tgt);
    for err in report.errors.iter().chain(&dangling) {
        ctx.note_error(err);
    }
    Ok(())
}

/// Swaps in the source buffer and re-projects data owned by other layers from the old one.
fn replace_mesh(ctx: &mut LayerContext<'_>, src: &Mesh, tgt: &mut Mesh) -> TransferResult<()> {
    let fresh = Mesh::with_edges(src.positions.clone(), src.edges.clone(), src.faces.clone());
    let old = std::mem::replace(tgt, fresh);
    ctx.note(
        Severity::Info,
        format!("topology changed ({} -> {} points), geometry replaced", old.point_count(), tgt.point_count()),
    );

    let carries_data = !old.attributes.iter().all(|c| c.is_internal()) || !old.morph_targets.is_empty();
    let old_index = SpatialIndex::build(&old);
    match &old_index {
        Some(index) if !tgt.is_empty() => {
            let outcome = transfer_all_attributes(&old, tgt, false, Some(index))?;
            for err in &outcome.skipped {
                ctx.note_error(err);
            }
            let morphs = transfer_foreign_morph_targets(&old, tgt, &ctx.layer.prefix, index)?;
            for err in &morphs.errors {
                ctx.note_error(err);
            }
        }
        _ if carries_data => {
            ctx.note(Severity::Warning, "attributes and morph targets of the previous geometry could not be re-projected");
        }
        _ => {}
    }

    if !old.vertex_groups.is_empty() {
        if let Some(points) = PointIndex::build(&old) {
            transfer_vertex_groups(&old, tgt, false, Some(&points), ctx.options.vertex_group_expand)?;
        }
    }
    Ok(())
}

fn transfer_curve(src: &Curve, tgt: &mut Curve, topo_match: bool) {
    if topo_match {
        tgt.replace_points(src);
    } else {
        tgt.splines.clone_from(&src.splines);
    }
}
