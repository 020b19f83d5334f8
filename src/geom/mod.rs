mod attribute;
mod bvh;
mod cache;
mod core;
mod curve;
mod geometry;
mod mesh;
mod proximity;
mod topology;

pub use attribute::{AttributeChannel, AttributeData, AttributeKind, Blend, Domain, is_internal_name};
pub use cache::{SpatialIndexCache, SpatialIndexCacheStats};
pub use self::core::{BBox, Point3, Tolerance, Vec3};
pub use curve::{Curve, Spline};
pub use geometry::{Geometry, GeometryKind};
pub use mesh::{EdgeKey, Mesh, MorphTarget, VertexGroup, edge_key, edges_from_faces, loop_edges};
pub use proximity::{FaceSample, PointIndex, SpatialIndex, closest_point_on_triangle};
pub use topology::{TopologyMatch, curve_topology_match, mesh_topology_match, topology_match};

#[cfg(test)]
mod tests;
