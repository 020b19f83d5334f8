//! Cheap structural comparison between two geometry buffers.
//!
//! The mesh comparison is index-order sensitive: two meshes that are isomorphic
//! under a relabelling of their points still compare as a mismatch.

use super::curve::Curve;
use super::geometry::Geometry;
use super::mesh::{Mesh, edge_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyMatch {
    /// Same element counts and the same connectivity per index.
    Match,
    Mismatch,
    /// Different geometry kinds, or at least one side has no geometry.
    Incomparable,
}

impl TopologyMatch {
    #[must_use]
    pub const fn is_match(self) -> bool {
        matches!(self, Self::Match)
    }

    #[must_use]
    pub const fn is_comparable(self) -> bool {
        !matches!(self, Self::Incomparable)
    }
}

#[must_use]
pub fn topology_match(a: &Geometry, b: &Geometry) -> TopologyMatch {
    match (a, b) {
        (Geometry::Mesh(a), Geometry::Mesh(b)) => mesh_topology_match(a, b),
        (Geometry::Curve(a), Geometry::Curve(b)) => curve_topology_match(a, b),
        _ => TopologyMatch::Incomparable,
    }
}

/// Point, edge and face counts must agree, and edge `i` must join the same two
/// points on both sides.
#[must_use]
pub fn mesh_topology_match(a: &Mesh, b: &Mesh) -> TopologyMatch {
    if a.point_count() != b.point_count() || a.edge_count() != b.edge_count() || a.face_count() != b.face_count() {
        return TopologyMatch::Mismatch;
    }
    let same_edges = a
        .edges
        .iter()
        .zip(&b.edges)
        .all(|(ea, eb)| edge_key(ea[0], ea[1]) == edge_key(eb[0], eb[1]));
    if same_edges {
        TopologyMatch::Match
    } else {
        TopologyMatch::Mismatch
    }
}

#[must_use]
pub fn curve_topology_match(a: &Curve, b: &Curve) -> TopologyMatch {
    let same = a.spline_count() == b.spline_count()
        && a
            .splines
            .iter()
            .zip(&b.splines)
            .all(|(sa, sb)| sa.point_count() == sb.point_count());
    if same {
        TopologyMatch::Match
    } else {
        TopologyMatch::Mismatch
    }
}
