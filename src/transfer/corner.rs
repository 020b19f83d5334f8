//! Seam-aware transfer of face-corner data (UV maps, corner colours).
//!
//! Each target corner is interpolated inside the source face closest to its point,
//! unless reaching that face from the face under the target face's centre means
//! crossing a seam in the channel. In that case the walk stops on the near side of
//! the seam, so values from separate islands are never blended together.

use std::collections::{HashMap, HashSet};

use crate::geom::{AttributeChannel, AttributeData, Domain, EdgeKey, Mesh, Point3, SpatialIndex, Tolerance, edge_key, loop_edges};

use super::error::{TransferError, TransferResult};

/// Build the complete target corner array for `channel` (a corner channel of `source`).
pub fn transfer_corner_data(
    source: &Mesh,
    target: &Mesh,
    channel: &AttributeChannel,
    index: &SpatialIndex,
) -> TransferResult<AttributeData> {
    if channel.domain != Domain::Corner || !channel.data.kind().is_interpolable() {
        return Err(TransferError::UnsupportedProximityDomain {
            channel: channel.name.clone(),
            domain: channel.domain,
            kind: channel.data.kind(),
        });
    }
    if channel.data.len() != source.corner_count() {
        return Err(TransferError::LengthMismatch {
            channel: channel.name.clone(),
            expected: source.corner_count(),
            found: channel.data.len(),
        });
    }

    let walker = SeamWalker::new(source, &channel.data);
    let mut blends = Vec::with_capacity(target.corner_count());
    for (face_idx, face) in target.faces.iter().enumerate() {
        let center = target
            .face_center(face_idx)
            .ok_or_else(|| TransferError::InvalidGeometry(format!("target face {face_idx} has no center")))?;
        let center_face = index.nearest_face(center).ok_or_else(no_source_faces)?;

        for &point_idx in face {
            let point = target
                .point(point_idx)
                .ok_or_else(|| TransferError::InvalidGeometry(format!("target corner point {point_idx} out of range")))?;
            let point_face = index.nearest_face(point).ok_or_else(no_source_faces)?;
            let resolved = if point_face == center_face {
                center_face
            } else {
                walker.walk(center_face, point_face, center, point)
            };
            let sample = index.closest_point_on_face(resolved, point).ok_or_else(no_source_faces)?;
            blends.push(sample.corner_blend());
        }
    }

    channel.data.blend(&blends).ok_or_else(|| TransferError::LengthMismatch {
        channel: channel.name.clone(),
        expected: source.corner_count(),
        found: channel.data.len(),
    })
}

fn no_source_faces() -> TransferError {
    TransferError::InvalidGeometry("source mesh has no faces".to_string())
}

/// Face-to-face walk over the source mesh that refuses to cross seams.
struct SeamWalker<'a> {
    mesh: &'a Mesh,
    data: &'a AttributeData,
    edge_faces: HashMap<EdgeKey, Vec<usize>>,
    corner_offsets: Vec<usize>,
}

impl<'a> SeamWalker<'a> {
    fn new(mesh: &'a Mesh, data: &'a AttributeData) -> Self {
        Self {
            mesh,
            data,
            edge_faces: mesh.edge_faces(),
            corner_offsets: mesh.corner_offsets(),
        }
    }

    /// Walk from `from` towards `to` along the segment `center -> point`.
    ///
    /// Returns the last face reached: `to` on success, otherwise the face where the
    /// walk had to stop.
    fn walk(&self, from: usize, to: usize, center: Point3, point: Point3) -> usize {
        let mut current = from;
        let mut visited = HashSet::from([from]);
        let mut crossed: HashSet<EdgeKey> = HashSet::new();

        for _ in 0..self.mesh.face_count() {
            if current == to {
                break;
            }
            let Some(edge) = self.crossing_edge(current, center, point, &crossed) else {
                break;
            };
            let Some(faces) = self.edge_faces.get(&edge) else {
                break;
            };
            if faces.len() != 2 {
                break;
            }
            crossed.insert(edge);
            if self.is_seam(edge, faces) {
                break;
            }
            let next = if faces[0] == current { faces[1] } else { faces[0] };
            if !visited.insert(next) {
                break;
            }
            current = next;
        }
        current
    }

    /// First edge of `face`, in loop order, crossed by the segment `p1 -> p2`.
    fn crossing_edge(&self, face: usize, p1: Point3, p2: Point3, skip: &HashSet<EdgeKey>) -> Option<EdgeKey> {
        let loop_points = self.mesh.faces.get(face)?;
        for (a, b) in loop_edges(loop_points) {
            let key = edge_key(a, b);
            if skip.contains(&key) {
                continue;
            }
            let (Some(pa), Some(pb)) = (self.mesh.point(a), self.mesh.point(b)) else {
                continue;
            };
            let Some((along_segment, along_edge)) = line_line_params(p1, p2, pa, pb) else {
                continue;
            };
            if (0.0..=1.0).contains(&along_segment) && (0.0..=1.0).contains(&along_edge) {
                return Some(key);
            }
        }
        None
    }

    /// An edge is a seam when, at either endpoint, the corners of its faces disagree.
    fn is_seam(&self, edge: EdgeKey, faces: &[usize]) -> bool {
        [edge.0, edge.1].into_iter().any(|vertex| {
            let mut corners = faces.iter().flat_map(|&f| {
                let offset = self.corner_offsets[f];
                self.mesh.faces[f]
                    .iter()
                    .enumerate()
                    .filter(move |(_, p)| **p == vertex)
                    .map(move |(k, _)| offset + k)
            });
            let Some(first) = corners.next() else {
                return false;
            };
            corners.any(|corner| !self.data.elements_equal(first, corner))
        })
    }
}

/// Parameters of the mutually closest points of the infinite lines `p1p2` and `ab`,
/// as fractions along each; `None` when the lines are parallel or degenerate.
fn line_line_params(p1: Point3, p2: Point3, a: Point3, b: Point3) -> Option<(f64, f64)> {
    let d1 = p2 - p1;
    let d2 = b - a;
    let r = p1 - a;
    let aa = d1.dot(d1);
    let ee = d2.dot(d2);
    if Tolerance::ZERO_LENGTH.is_zero_length(aa) || Tolerance::ZERO_LENGTH.is_zero_length(ee) {
        return None;
    }
    let bb = d1.dot(d2);
    let denom = aa * ee - bb * bb;
    if denom <= Tolerance::ZERO_LENGTH.eps * aa * ee {
        return None;
    }
    let c = d1.dot(r);
    let f = d2.dot(r);
    let s = (bb * f - c * ee) / denom;
    let t = (aa * f - bb * c) / denom;
    Some((s, t))
}
