use serde::{Deserialize, Serialize};

use crate::geom::{Mesh, Point3};

use super::error::{TransferError, TransferResult};

/// How far the points moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub mean_offset: f64,
    pub max_offset: f64,
}

/// Move every target point onto its source counterpart.
///
/// Morph-target offsets are deltas from the base shape and are left as they are.
pub fn transfer_positions(source: &Mesh, target: &mut Mesh) -> TransferResult<PositionReport> {
    if source.point_count() != target.point_count() {
        return Err(TransferError::LengthMismatch {
            channel: "position".to_string(),
            expected: target.point_count(),
            found: source.point_count(),
        });
    }
    if source.has_invalid_positions() {
        return Err(TransferError::InvalidGeometry("source mesh has non-finite positions".to_string()));
    }

    let mut report = PositionReport::default();
    if source.point_count() == 0 {
        return Ok(report);
    }
    let mut total = 0.0;
    for (dst, src) in target.positions.iter_mut().zip(&source.positions) {
        let offset = Point3::from_array(*dst).distance_to(Point3::from_array(*src));
        total += offset;
        report.max_offset = report.max_offset.max(offset);
        *dst = *src;
    }
    report.mean_offset = total / source.point_count() as f64;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::MorphTarget;

    #[test]
    fn moves_points_and_keeps_morph_deltas() {
        let source = Mesh::new(vec![[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]], vec![vec![0, 1, 2]]);
        let mut target = Mesh::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], vec![vec![0, 1, 2]]);
        target.morph_targets.push(MorphTarget::new("RIG-Blink", vec![[0.0, 0.5, 0.0]; 3]));

        let report = transfer_positions(&source, &mut target).expect("transfer");
        assert_eq!(target.positions, source.positions);
        assert!((report.mean_offset - 1.0).abs() < 1e-12);
        assert!((report.max_offset - 1.0).abs() < 1e-12);
        assert_eq!(target.morph_targets[0].offsets, vec![[0.0, 0.5, 0.0]; 3]);
    }

    #[test]
    fn point_count_mismatch_leaves_target_alone() {
        let source = Mesh::new(vec![[0.0; 3]; 2], Vec::new());
        let mut target = Mesh::new(vec![[1.0; 3]; 3], Vec::new());
        assert!(matches!(
            transfer_positions(&source, &mut target),
            Err(TransferError::LengthMismatch { expected: 3, found: 2, .. })
        ));
        assert_eq!(target.positions, vec![[1.0; 3]; 3]);
    }
}
