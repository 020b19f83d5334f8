use serde::{Deserialize, Serialize};

use super::curve::Curve;
use super::mesh::Mesh;

/// Geometry buffer carried by an entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Mesh(Mesh),
    Curve(Curve),
    /// Entities without a buffer (armatures, empties).
    #[default]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Mesh,
    Curve,
    Empty,
}

impl GeometryKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::Curve => "curve",
            Self::Empty => "empty",
        }
    }
}

impl Geometry {
    #[must_use]
    pub const fn kind(&self) -> GeometryKind {
        match self {
            Self::Mesh(_) => GeometryKind::Mesh,
            Self::Curve(_) => GeometryKind::Curve,
            Self::Empty => GeometryKind::Empty,
        }
    }

    #[must_use]
    pub const fn as_mesh(&self) -> Option<&Mesh> {
        match self {
            Self::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        match self {
            Self::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_curve(&self) -> Option<&Curve> {
        match self {
            Self::Curve(curve) => Some(curve),
            _ => None,
        }
    }

    pub fn as_curve_mut(&mut self) -> Option<&mut Curve> {
        match self {
            Self::Curve(curve) => Some(curve),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Mesh(mesh) => mesh.validate(),
            Self::Curve(curve) => curve.validate(),
            Self::Empty => Ok(()),
        }
    }
}

impl From<Mesh> for Geometry {
    fn from(mesh: Mesh) -> Self {
        Self::Mesh(mesh)
    }
}

impl From<Curve> for Geometry {
    fn from(curve: Curve) -> Self {
        Self::Curve(curve)
    }
}
