use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::attribute::{AttributeChannel, Domain};
use super::{Point3, Vec3};

/// Unordered edge key: `(min, max)` point indices.
pub type EdgeKey = (u32, u32);

#[must_use]
pub const fn edge_key(a: u32, b: u32) -> EdgeKey {
    if a <= b { (a, b) } else { (b, a) }
}

/// Polygon mesh with per-element data channels.
///
/// Corners are numbered face by face in loop order: corner `offsets[f] + k` belongs
/// to face `f` and sits on point `faces[f][k]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<[f64; 3]>,
    #[serde(default)]
    pub edges: Vec<[u32; 2]>,
    #[serde(default)]
    pub faces: Vec<Vec<u32>>,
    #[serde(default)]
    pub attributes: Vec<AttributeChannel>,
    #[serde(default)]
    pub morph_targets: Vec<MorphTarget>,
    #[serde(default)]
    pub vertex_groups: Vec<VertexGroup>,
}

impl Mesh {
    /// Create a mesh from positions and face loops; edges are derived from the loops
    /// in order of first appearance.
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, faces: Vec<Vec<u32>>) -> Self {
        let edges = edges_from_faces(&faces);
        Self::with_edges(positions, edges, faces)
    }

    #[must_use]
    pub fn with_edges(positions: Vec<[f64; 3]>, edges: Vec<[u32; 2]>, faces: Vec<Vec<u32>>) -> Self {
        Self {
            positions,
            edges,
            faces,
            attributes: Vec::new(),
            morph_targets: Vec::new(),
            vertex_groups: Vec::new(),
        }
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn corner_count(&self) -> usize {
        self.faces.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[must_use]
    pub fn domain_len(&self, domain: Domain) -> usize {
        match domain {
            Domain::Point => self.point_count(),
            Domain::Edge => self.edge_count(),
            Domain::Face => self.face_count(),
            Domain::Corner => self.corner_count(),
        }
    }

    #[must_use]
    pub fn point(&self, index: u32) -> Option<Point3> {
        self.positions.get(index as usize).copied().map(Point3::from_array)
    }

    /// First corner index of every face.
    #[must_use]
    pub fn corner_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.faces.len());
        let mut next = 0usize;
        for face in &self.faces {
            offsets.push(next);
            next += face.len();
        }
        offsets
    }

    /// Point index of every corner.
    #[must_use]
    pub fn corner_points(&self) -> Vec<u32> {
        self.faces.iter().flatten().copied().collect()
    }

    /// Mean of the face's loop positions.
    #[must_use]
    pub fn face_center(&self, face: usize) -> Option<Point3> {
        let loop_points = self.faces.get(face)?;
        Point3::centroid(loop_points.iter().filter_map(|&p| self.point(p)))
    }

    /// Maps every loop edge to the faces using it, in face order.
    ///
    /// Keys come from face loops, not from `edges`, so loose edges never appear.
    #[must_use]
    pub fn edge_faces(&self) -> HashMap<EdgeKey, Vec<usize>> {
        let mut map: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
        map.reserve(self.corner_count());
        for (face_idx, face) in self.faces.iter().enumerate() {
            for (a, b) in loop_edges(face) {
                let entry = map.entry(edge_key(a, b)).or_default();
                if entry.last() != Some(&face_idx) {
                    entry.push(face_idx);
                }
            }
        }
        map
    }

    /// Neighbouring points of every point along `edges`.
    #[must_use]
    pub fn point_neighbours(&self) -> Vec<Vec<u32>> {
        let mut neighbours = vec![Vec::new(); self.point_count()];
        for &[a, b] in &self.edges {
            if let Some(list) = neighbours.get_mut(a as usize) {
                list.push(b);
            }
            if let Some(list) = neighbours.get_mut(b as usize) {
                list.push(a);
            }
        }
        neighbours
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeChannel> {
        self.attributes.iter().find(|c| c.name == name)
    }

    /// Attach a channel, replacing any channel of the same name.
    pub fn set_attribute(&mut self, channel: AttributeChannel) {
        match self.attributes.iter_mut().find(|c| c.name == channel.name) {
            Some(existing) => *existing = channel,
            None => self.attributes.push(channel),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<AttributeChannel> {
        let idx = self.attributes.iter().position(|c| c.name == name)?;
        Some(self.attributes.remove(idx))
    }

    #[must_use]
    pub fn morph_target(&self, name: &str) -> Option<&MorphTarget> {
        self.morph_targets.iter().find(|m| m.name == name)
    }

    #[must_use]
    pub fn vertex_group(&self, name: &str) -> Option<&VertexGroup> {
        self.vertex_groups.iter().find(|g| g.name == name)
    }

    pub fn vertex_group_mut(&mut self, name: &str) -> &mut VertexGroup {
        let idx = match self.vertex_groups.iter().position(|g| g.name == name) {
            Some(idx) => idx,
            None => {
                self.vertex_groups.push(VertexGroup::new(name));
                self.vertex_groups.len() - 1
            }
        };
        &mut self.vertex_groups[idx]
    }

    #[must_use]
    pub fn has_invalid_positions(&self) -> bool {
        self.positions.iter().any(|p| !p.iter().all(|c| c.is_finite()))
    }

    pub fn validate(&self) -> Result<(), String> {
        let n = self.point_count() as u32;
        if self.has_invalid_positions() {
            return Err("mesh has invalid point coordinates (NaN/Inf)".to_string());
        }
        if self.edges.iter().any(|e| e[0] >= n || e[1] >= n) {
            return Err("mesh has out-of-bounds edge endpoints".to_string());
        }
        if let Some(face) = self.faces.iter().position(|f| f.len() < 3) {
            return Err(format!("face {face} has fewer than 3 corners"));
        }
        if self.faces.iter().flatten().any(|&p| p >= n) {
            return Err("mesh has out-of-bounds face corners".to_string());
        }
        for channel in &self.attributes {
            let expected = self.domain_len(channel.domain);
            if channel.data.len() != expected {
                return Err(format!(
                    "attribute '{}' has {} elements, {} domain has {expected}",
                    channel.name,
                    channel.data.len(),
                    channel.domain.label()
                ));
            }
        }
        for morph in &self.morph_targets {
            if morph.offsets.len() != self.point_count() {
                return Err(format!("morph target '{}' offset count does not match point count", morph.name));
            }
        }
        Ok(())
    }
}

/// Consecutive loop pairs of a face, closing back to the first point.
pub fn loop_edges(face: &[u32]) -> impl Iterator<Item = (u32, u32)> + '_ {
    let n = face.len();
    (0..n).map(move |k| (face[k], face[(k + 1) % n]))
}

#[must_use]
pub fn edges_from_faces(faces: &[Vec<u32>]) -> Vec<[u32; 2]> {
    let mut seen: HashMap<EdgeKey, ()> = HashMap::new();
    let mut edges = Vec::new();
    for face in faces {
        for (a, b) in loop_edges(face) {
            let key = edge_key(a, b);
            if seen.insert(key, ()).is_none() {
                edges.push([key.0, key.1]);
            }
        }
    }
    edges
}

fn default_slider_max() -> f64 {
    1.0
}

/// Per-point offsets from the base shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphTarget {
    pub name: String,
    pub offsets: Vec<[f64; 3]>,
    /// Morph target this one is relative to; `None` means the base shape.
    #[serde(default)]
    pub relative_key: Option<String>,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub slider_min: f64,
    #[serde(default = "default_slider_max")]
    pub slider_max: f64,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub vertex_group: Option<String>,
}

impl MorphTarget {
    #[must_use]
    pub fn new(name: impl Into<String>, offsets: Vec<[f64; 3]>) -> Self {
        Self {
            name: name.into(),
            offsets,
            relative_key: None,
            weight: 0.0,
            slider_min: 0.0,
            slider_max: 1.0,
            mute: false,
            vertex_group: None,
        }
    }

    #[must_use]
    pub fn relative_to(mut self, key: impl Into<String>) -> Self {
        self.relative_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn offset(&self, point: usize) -> Vec3 {
        self.offsets.get(point).copied().map_or(Vec3::ZERO, Vec3::from_array)
    }

    /// Copy everything but the offsets from `other`.
    pub fn copy_settings_from(&mut self, other: &Self) {
        self.weight = other.weight;
        self.slider_min = other.slider_min;
        self.slider_max = other.slider_max;
        self.mute = other.mute;
        self.vertex_group.clone_from(&other.vertex_group);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VertexGroup {
    pub name: String,
    /// Sparse weights keyed by point index.
    #[serde(default)]
    pub weights: BTreeMap<u32, f64>,
}

impl VertexGroup {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weights: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn weight(&self, point: u32) -> f64 {
        self.weights.get(&point).copied().unwrap_or(0.0)
    }
}
