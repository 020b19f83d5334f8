//! Nearest-surface queries against a polygon mesh.
//!
//! Faces are fan-triangulated from their first corner. Every query resolves ties
//! towards the lowest face (then triangle) index so results are deterministic.

use super::attribute::Blend;
use super::bvh::Bvh;
use super::mesh::Mesh;
use super::{BBox, Point3, Tolerance, Vec3};

/// Closest point on a mesh face, with barycentric weights over one fan triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceSample {
    pub face: usize,
    /// Point indices of the chosen triangle's corners.
    pub points: [u32; 3],
    /// Corner indices of the chosen triangle's corners.
    pub corners: [usize; 3],
    pub weights: [f64; 3],
    pub location: Point3,
}

impl FaceSample {
    #[must_use]
    pub fn point_blend(&self) -> Blend {
        [
            (self.points[0] as usize, self.weights[0]),
            (self.points[1] as usize, self.weights[1]),
            (self.points[2] as usize, self.weights[2]),
        ]
    }

    #[must_use]
    pub fn corner_blend(&self) -> Blend {
        [
            (self.corners[0], self.weights[0]),
            (self.corners[1], self.weights[1]),
            (self.corners[2], self.weights[2]),
        ]
    }

    /// Weighted sum of per-point vectors at the sample.
    #[must_use]
    pub fn blend_vectors(&self, values: &[[f64; 3]]) -> Vec3 {
        self.point_blend().iter().fold(Vec3::ZERO, |acc, &(idx, w)| {
            acc + values.get(idx).copied().map_or(Vec3::ZERO, Vec3::from_array) * w
        })
    }
}

/// BVH over the faces of one mesh.
///
/// Owns a copy of the mesh's positions and face loops so it can outlive edits to
/// the mesh it was built from.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    bvh: Bvh,
    positions: Vec<Point3>,
    faces: Vec<Vec<u32>>,
    corner_offsets: Vec<usize>,
}

impl SpatialIndex {
    /// Returns `None` for a mesh without faces.
    #[must_use]
    pub fn build(mesh: &Mesh) -> Option<Self> {
        let positions: Vec<Point3> = mesh.positions.iter().copied().map(Point3::from_array).collect();
        let bboxes: Vec<BBox> = mesh
            .faces
            .iter()
            .map(|face| {
                let points: Vec<Point3> = face.iter().filter_map(|&p| positions.get(p as usize).copied()).collect();
                BBox::from_points(&points).unwrap_or(BBox::new(Point3::ORIGIN, Point3::ORIGIN))
            })
            .collect();
        let bvh = Bvh::build(&bboxes)?;
        log::debug!("spatial index built over {} faces", bboxes.len());
        Some(Self {
            bvh,
            positions,
            faces: mesh.faces.clone(),
            corner_offsets: mesh.corner_offsets(),
        })
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Face whose surface lies closest to `point`; ties go to the lowest index.
    #[must_use]
    pub fn nearest_face(&self, point: Point3) -> Option<usize> {
        self.bvh
            .nearest(point, |face| {
                self.closest_point_on_face(face, point)
                    .map(|s| s.location.distance_squared_to(point))
            })
            .map(|(face, _)| face)
    }

    /// Closest point over the fan triangles of `face`.
    #[must_use]
    pub fn closest_point_on_face(&self, face: usize, point: Point3) -> Option<FaceSample> {
        let loop_points = self.faces.get(face)?;
        let offset = *self.corner_offsets.get(face)?;
        if loop_points.len() < 3 {
            return None;
        }

        let mut best: Option<(f64, FaceSample)> = None;
        for k in 1..(loop_points.len() - 1) {
            let local = [0, k, k + 1];
            let points = local.map(|l| loop_points[l]);
            let [a, b, c] = points.map(|p| self.positions.get(p as usize).copied());
            let (Some(a), Some(b), Some(c)) = (a, b, c) else {
                continue;
            };
            let (weights, location) = closest_point_on_triangle(point, a, b, c);
            let d2 = location.distance_squared_to(point);
            if best.as_ref().is_none_or(|(best_d2, _)| d2 < *best_d2) {
                best = Some((
                    d2,
                    FaceSample {
                        face,
                        points,
                        corners: local.map(|l| offset + l),
                        weights,
                        location,
                    },
                ));
            }
        }
        best.map(|(_, sample)| sample)
    }

    #[must_use]
    pub fn sample(&self, point: Point3) -> Option<FaceSample> {
        let face = self.nearest_face(point)?;
        self.closest_point_on_face(face, point)
    }
}

/// Closest point to `p` on triangle `abc` with its barycentric weights.
///
/// Zero-area triangles return weights `(1, 0, 0)` at `a`.
#[must_use]
pub fn closest_point_on_triangle(p: Point3, a: Point3, b: Point3, c: Point3) -> ([f64; 3], Point3) {
    let ab = b - a;
    let ac = c - a;
    let normal2 = ab.cross(ac).length_squared();
    let scale = (ab.length_squared() * ac.length_squared()).max(f64::MIN_POSITIVE);
    if normal2 <= Tolerance::ZERO_LENGTH.eps * scale {
        return ([1.0, 0.0, 0.0], a);
    }

    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return ([1.0, 0.0, 0.0], a);
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return ([0.0, 1.0, 0.0], b);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return ([1.0 - v, v, 0.0], a + ab * v);
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return ([0.0, 0.0, 1.0], c);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return ([1.0 - w, 0.0, w], a + ac * w);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return ([0.0, 1.0 - w, w], b + (c - b) * w);
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    ([1.0 - v - w, v, w], a + ab * v + ac * w)
}

/// BVH over the points of one mesh.
#[derive(Debug, Clone)]
pub struct PointIndex {
    bvh: Bvh,
    positions: Vec<Point3>,
}

impl PointIndex {
    #[must_use]
    pub fn build(mesh: &Mesh) -> Option<Self> {
        let positions: Vec<Point3> = mesh.positions.iter().copied().map(Point3::from_array).collect();
        let bboxes: Vec<BBox> = positions.iter().map(|&p| BBox::around(p)).collect();
        let bvh = Bvh::build(&bboxes)?;
        Some(Self { bvh, positions })
    }

    /// Nearest point index and its distance; ties go to the lowest index.
    #[must_use]
    pub fn nearest_point(&self, point: Point3) -> Option<(usize, f64)> {
        self.bvh
            .nearest(point, |idx| self.positions.get(idx).map(|p| p.distance_squared_to(point)))
            .map(|(idx, d2)| (idx, d2.sqrt()))
    }
}
