//! Named per-element data channels attached to a mesh.
//!
//! Channel data is a tagged union over the supported element kinds. Copying and
//! interpolating go through one explicit function per kind instead of any kind of
//! property reflection.

use serde::{Deserialize, Serialize};

/// Element domain a channel is parallel to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Domain {
    Point,
    Edge,
    Face,
    Corner,
}

impl Domain {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Edge => "edge",
            Self::Face => "face",
            Self::Corner => "corner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Float,
    Int,
    Bool,
    String,
    Vector2,
    Vector,
    Color,
}

impl AttributeKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Vector2 => "vector2",
            Self::Vector => "vector",
            Self::Color => "color",
        }
    }

    /// Whether values of this kind can be blended from weighted samples.
    #[must_use]
    pub const fn is_interpolable(self) -> bool {
        !matches!(self, Self::String)
    }
}

/// Three weighted source elements; weights sum to one.
pub type Blend = [(usize, f64); 3];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values")]
pub enum AttributeData {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
    String(Vec<String>),
    Vector2(Vec<[f64; 2]>),
    Vector(Vec<[f64; 3]>),
    Color(Vec<[f64; 4]>),
}

impl AttributeData {
    #[must_use]
    pub fn with_default(kind: AttributeKind, len: usize) -> Self {
        match kind {
            AttributeKind::Float => Self::Float(vec![0.0; len]),
            AttributeKind::Int => Self::Int(vec![0; len]),
            AttributeKind::Bool => Self::Bool(vec![false; len]),
            AttributeKind::String => Self::String(vec![String::new(); len]),
            AttributeKind::Vector2 => Self::Vector2(vec![[0.0; 2]; len]),
            AttributeKind::Vector => Self::Vector(vec![[0.0; 3]; len]),
            AttributeKind::Color => Self::Color(vec![[0.0; 4]; len]),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> AttributeKind {
        match self {
            Self::Float(_) => AttributeKind::Float,
            Self::Int(_) => AttributeKind::Int,
            Self::Bool(_) => AttributeKind::Bool,
            Self::String(_) => AttributeKind::String,
            Self::Vector2(_) => AttributeKind::Vector2,
            Self::Vector(_) => AttributeKind::Vector,
            Self::Color(_) => AttributeKind::Color,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::String(v) => v.len(),
            Self::Vector2(v) => v.len(),
            Self::Vector(v) => v.len(),
            Self::Color(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compares two elements of this channel for exact equality.
    ///
    /// Out-of-range indices compare unequal.
    #[must_use]
    pub fn elements_equal(&self, a: usize, b: usize) -> bool {
        fn eq<T: PartialEq>(values: &[T], a: usize, b: usize) -> bool {
            match (values.get(a), values.get(b)) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        match self {
            Self::Float(v) => eq(v, a, b),
            Self::Int(v) => eq(v, a, b),
            Self::Bool(v) => eq(v, a, b),
            Self::String(v) => eq(v, a, b),
            Self::Vector2(v) => eq(v, a, b),
            Self::Vector(v) => eq(v, a, b),
            Self::Color(v) => eq(v, a, b),
        }
    }

    /// New channel whose element `i` is element `indices[i]` of this one.
    ///
    /// Returns `None` if any index is out of range.
    #[must_use]
    pub fn gather(&self, indices: &[usize]) -> Option<Self> {
        fn pick<T: Clone>(values: &[T], indices: &[usize]) -> Option<Vec<T>> {
            indices.iter().map(|&i| values.get(i).cloned()).collect()
        }
        Some(match self {
            Self::Float(v) => Self::Float(pick(v, indices)?),
            Self::Int(v) => Self::Int(pick(v, indices)?),
            Self::Bool(v) => Self::Bool(pick(v, indices)?),
            Self::String(v) => Self::String(pick(v, indices)?),
            Self::Vector2(v) => Self::Vector2(pick(v, indices)?),
            Self::Vector(v) => Self::Vector(pick(v, indices)?),
            Self::Color(v) => Self::Color(pick(v, indices)?),
        })
    }

    /// New channel whose element `i` is blended from this one with `blends[i]`.
    ///
    /// Floating kinds use the weighted sum, `Int` rounds it, `Bool` takes the
    /// heaviest sample. Strings cannot be blended and yield `None`, as does any
    /// out-of-range sample index.
    #[must_use]
    pub fn blend(&self, blends: &[Blend]) -> Option<Self> {
        fn mix<const N: usize>(values: &[[f64; N]], blend: &Blend) -> Option<[f64; N]> {
            let mut out = [0.0; N];
            for &(idx, weight) in blend {
                let value = values.get(idx)?;
                for (acc, component) in out.iter_mut().zip(value) {
                    *acc += weight * component;
                }
            }
            Some(out)
        }
        fn heaviest(blend: &Blend) -> usize {
            let mut best = blend[0];
            for &sample in &blend[1..] {
                if sample.1 > best.1 {
                    best = sample;
                }
            }
            best.0
        }

        Some(match self {
            Self::Float(v) => Self::Float(
                blends
                    .iter()
                    .map(|b| b.iter().map(|&(i, w)| v.get(i).map(|x| w * x)).sum::<Option<f64>>())
                    .collect::<Option<_>>()?,
            ),
            Self::Int(v) => Self::Int(
                blends
                    .iter()
                    .map(|b| {
                        b.iter()
                            .map(|&(i, w)| v.get(i).map(|&x| w * x as f64))
                            .sum::<Option<f64>>()
                            .map(|sum| sum.round() as i64)
                    })
                    .collect::<Option<_>>()?,
            ),
            Self::Bool(v) => Self::Bool(
                blends
                    .iter()
                    .map(|b| v.get(heaviest(b)).copied())
                    .collect::<Option<_>>()?,
            ),
            Self::String(_) => return None,
            Self::Vector2(v) => Self::Vector2(blends.iter().map(|b| mix(v, b)).collect::<Option<_>>()?),
            Self::Vector(v) => Self::Vector(blends.iter().map(|b| mix(v, b)).collect::<Option<_>>()?),
            Self::Color(v) => Self::Color(blends.iter().map(|b| mix(v, b)).collect::<Option<_>>()?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeChannel {
    pub name: String,
    pub domain: Domain,
    pub data: AttributeData,
}

impl AttributeChannel {
    pub const POSITION: &'static str = "position";

    #[must_use]
    pub fn new(name: impl Into<String>, domain: Domain, data: AttributeData) -> Self {
        Self {
            name: name.into(),
            domain,
            data,
        }
    }

    /// Internal channels (dot-prefixed names and `position`) are never removed or transferred.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        is_internal_name(&self.name)
    }
}

#[must_use]
pub fn is_internal_name(name: &str) -> bool {
    name.starts_with('.') || name == AttributeChannel::POSITION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_weights_floating_kinds() {
        let data = AttributeData::Vector2(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let out = data.blend(&[[(0, 0.5), (1, 0.25), (2, 0.25)]]).unwrap();
        assert_eq!(out, AttributeData::Vector2(vec![[0.25, 0.25]]));
    }

    #[test]
    fn blend_rounds_ints_and_picks_heaviest_bool() {
        let ints = AttributeData::Int(vec![0, 10, 20]);
        assert_eq!(
            ints.blend(&[[(0, 0.2), (1, 0.3), (2, 0.5)]]).unwrap(),
            AttributeData::Int(vec![13])
        );

        let bools = AttributeData::Bool(vec![false, true, false]);
        assert_eq!(
            bools.blend(&[[(0, 0.3), (1, 0.4), (2, 0.3)]]).unwrap(),
            AttributeData::Bool(vec![true])
        );
    }

    #[test]
    fn strings_cannot_blend_but_can_gather() {
        let strings = AttributeData::String(vec!["a".into(), "b".into()]);
        assert!(strings.blend(&[[(0, 1.0), (1, 0.0), (1, 0.0)]]).is_none());
        assert_eq!(
            strings.gather(&[1, 1, 0]).unwrap(),
            AttributeData::String(vec!["b".into(), "b".into(), "a".into()])
        );
        assert!(strings.gather(&[5]).is_none());
    }

    #[test]
    fn internal_names() {
        assert!(is_internal_name("position"));
        assert!(is_internal_name(".select_vert"));
        assert!(!is_internal_name("UVMap"));
    }
}
