use serde::{Deserialize, Serialize};

use super::Point3;

/// One spline: an ordered list of control points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Spline {
    pub points: Vec<[f64; 3]>,
    #[serde(default)]
    pub cyclic: bool,
}

impl Spline {
    #[must_use]
    pub fn new(points: Vec<[f64; 3]>) -> Self {
        Self { points, cyclic: false }
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

/// Curve geometry; hair curves carry the name of the surface mesh they grow from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Curve {
    pub splines: Vec<Spline>,
    #[serde(default)]
    pub surface: Option<String>,
}

impl Curve {
    #[must_use]
    pub fn new(splines: Vec<Spline>) -> Self {
        Self { splines, surface: None }
    }

    #[must_use]
    pub fn spline_count(&self) -> usize {
        self.splines.len()
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.splines.iter().map(Spline::point_count).sum()
    }

    pub fn points(&self) -> impl Iterator<Item = Point3> + '_ {
        self.splines.iter().flat_map(|s| s.points.iter().copied().map(Point3::from_array))
    }

    /// Replace the control points with `other`'s, keeping the surface binding.
    pub fn replace_points(&mut self, other: &Self) {
        self.splines.clone_from(&other.splines);
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(idx) = self.splines.iter().position(|s| s.points.is_empty()) {
            return Err(format!("spline {idx} has no control points"));
        }
        if self.points().any(|p| !p.is_finite()) {
            return Err("curve has invalid control point coordinates (NaN/Inf)".to_string());
        }
        Ok(())
    }
}
