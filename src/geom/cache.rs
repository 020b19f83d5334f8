//! Spatial index caching for one merge invocation.
//!
//! Indices are keyed by the name of the source entity whose mesh they were built
//! from. Source entities are read-only for the whole merge, so entries never go
//! stale while the cache is alive.
//!
//! # Example
//! ```ignore
//! let mut cache = SpatialIndexCache::new();
//! let index = cache.face_index("Body", &mesh);
//! let stats = cache.stats();
//! println!("entries: {}, hits: {}", stats.face_index_entries, stats.hits);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::mesh::Mesh;
use super::proximity::{PointIndex, SpatialIndex};

#[derive(Debug, Default)]
pub struct SpatialIndexCache {
    // `None` records a mesh that has nothing to index.
    face_indices: HashMap<String, Option<Arc<SpatialIndex>>>,
    point_indices: HashMap<String, Option<Arc<PointIndex>>>,

    hits: usize,
    misses: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpatialIndexCacheStats {
    pub face_index_entries: usize,
    pub point_index_entries: usize,
    pub hits: usize,
    pub misses: usize,
}

impl SpatialIndexCacheStats {
    /// Between 0.0 and 1.0; 0.0 before any lookup.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl SpatialIndexCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stats(&self) -> SpatialIndexCacheStats {
        SpatialIndexCacheStats {
            face_index_entries: self.face_indices.len(),
            point_index_entries: self.point_indices.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }

    pub fn clear(&mut self) {
        self.face_indices.clear();
        self.point_indices.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Face index of `mesh`, built on first use under `key`.
    pub fn face_index(&mut self, key: &str, mesh: &Mesh) -> Option<Arc<SpatialIndex>> {
        if let Some(cached) = self.face_indices.get(key) {
            self.hits += 1;
            return cached.clone();
        }
        self.misses += 1;
        let index = SpatialIndex::build(mesh).map(Arc::new);
        self.face_indices.insert(key.to_string(), index.clone());
        index
    }

    /// Point index of `mesh`, built on first use under `key`.
    pub fn point_index(&mut self, key: &str, mesh: &Mesh) -> Option<Arc<PointIndex>> {
        if let Some(cached) = self.point_indices.get(key) {
            self.hits += 1;
            return cached.clone();
        }
        self.misses += 1;
        let index = PointIndex::build(mesh).map(Arc::new);
        self.point_indices.insert(key.to_string(), index.clone());
        index
    }
}
