use std::collections::BTreeMap;

use crate::geom::{Mesh, Point3, PointIndex, VertexGroup};

use super::error::{TransferError, TransferResult};

/// Rings of edge neighbours added around the nearest source point.
pub const DEFAULT_EXPAND: usize = 2;

/// Source points and their influence for every target point.
pub type InfluenceMap = Vec<Vec<(u32, f64)>>;

/// Replace the target's copies of every source vertex group.
///
/// Groups are copied point for point when topologies match, otherwise weights are
/// blended from the source points around each target point by inverse distance.
/// Target groups the source does not have stay untouched. Returns the names of
/// the transferred groups.
pub fn transfer_vertex_groups(
    source: &Mesh,
    target: &mut Mesh,
    topo_match: bool,
    index: Option<&PointIndex>,
    expand: usize,
) -> TransferResult<Vec<String>> {
    if source.vertex_groups.is_empty() {
        return Ok(Vec::new());
    }

    let groups: Vec<VertexGroup> = if topo_match {
        if source.point_count() != target.point_count() {
            return Err(TransferError::LengthMismatch {
                channel: "vertex groups".to_string(),
                expected: target.point_count(),
                found: source.point_count(),
            });
        }
        source.vertex_groups.clone()
    } else {
        let index = index.ok_or_else(|| TransferError::InvalidGeometry("source mesh has no points".to_string()))?;
        let influences = build_influence_map(source, target, index, expand)?;
        source
            .vertex_groups
            .iter()
            .map(|group| blend_group(group, &influences))
            .collect()
    };

    let names: Vec<String> = groups.iter().map(|g| g.name.clone()).collect();
    for group in groups {
        let name = group.name.clone();
        *target.vertex_group_mut(&name) = group;
    }
    log::debug!("transferred {} vertex groups", names.len());
    Ok(names)
}

fn blend_group(group: &VertexGroup, influences: &InfluenceMap) -> VertexGroup {
    let mut weights = BTreeMap::new();
    for (target_point, sources) in influences.iter().enumerate() {
        let mut total = 0.0;
        let mut member = false;
        for &(source_point, influence) in sources {
            if let Some(weight) = group.weights.get(&source_point) {
                total += weight * influence;
                member = true;
            }
        }
        if member {
            weights.insert(target_point as u32, total);
        }
    }
    VertexGroup {
        name: group.name.clone(),
        weights,
    }
}

/// For every target point: the nearest source point grown by `expand` edge rings,
/// weighted by inverse distance. A point that coincides with its nearest source
/// point takes that point alone.
pub fn build_influence_map(source: &Mesh, target: &Mesh, index: &PointIndex, expand: usize) -> TransferResult<InfluenceMap> {
    let neighbours = source.point_neighbours();
    let mut map = Vec::with_capacity(target.point_count());

    for &position in &target.positions {
        let point = Point3::from_array(position);
        let (nearest, distance) = index
            .nearest_point(point)
            .ok_or_else(|| TransferError::InvalidGeometry("source mesh has no points".to_string()))?;
        if distance == 0.0 {
            map.push(vec![(nearest as u32, 1.0)]);
            continue;
        }

        let mut ring = vec![nearest as u32];
        for _ in 0..expand {
            let mut grown = Vec::new();
            for &p in &ring {
                for &other in neighbours.get(p as usize).map_or(&[][..], Vec::as_slice) {
                    if !ring.contains(&other) && !grown.contains(&other) {
                        grown.push(other);
                    }
                }
            }
            ring.extend(grown);
        }

        let distances: Vec<(u32, f64)> = ring
            .into_iter()
            .filter_map(|p| source.point(p).map(|sp| (p, sp.distance_to(point))))
            .collect();
        if let Some(&(exact, _)) = distances.iter().find(|(_, d)| *d == 0.0) {
            map.push(vec![(exact, 1.0)]);
            continue;
        }
        let inverse_sum: f64 = distances.iter().map(|(_, d)| 1.0 / d).sum();
        map.push(distances.iter().map(|&(p, d)| (p, (1.0 / d) / inverse_sum)).collect());
    }
    Ok(map)
}
