//! In-memory asset graph: named entities grouped into nested collections.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use wildmatch::WildMatch;

use crate::geom::Geometry;
use crate::transfer::StackEntry;

use super::error::MergeError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: [f64; 3],
    /// Euler angles in radians.
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: [0.0; 3],
        rotation: [0.0; 3],
        scale: [1.0; 3],
    };
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Named node of an asset graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub geometry: Geometry,
    #[serde(default)]
    pub stack: Vec<StackEntry>,
    /// Object constraints; owned by name prefix like stack entries.
    #[serde(default)]
    pub constraints: Vec<StackEntry>,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub parent: Option<String>,
    /// Material names per slot; `None` for an empty slot.
    #[serde(default)]
    pub material_slots: Vec<Option<String>>,
}

impl Entity {
    #[must_use]
    pub fn new(name: impl Into<String>, geometry: impl Into<Geometry>) -> Self {
        Self {
            name: name.into(),
            geometry: geometry.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn stack_entry(&self, name: &str) -> Option<&StackEntry> {
        self.stack.iter().find(|e| e.name == name)
    }

    #[must_use]
    pub fn constraint(&self, name: &str) -> Option<&StackEntry> {
        self.constraints.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    /// Entity names.
    #[serde(default)]
    pub objects: Vec<String>,
    /// Child collection names.
    #[serde(default)]
    pub children: Vec<String>,
}

impl Collection {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Serialized layout of an [`AssetGraph`]; the lookup indices are rebuilt on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetGraphData {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub collections: Vec<Collection>,
}

/// Entities and collections with name indices for lookups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "AssetGraphData", into = "AssetGraphData")]
pub struct AssetGraph {
    entities: Vec<Entity>,
    collections: Vec<Collection>,
    entity_index: HashMap<String, usize>,
    collection_index: HashMap<String, usize>,
}

impl PartialEq for AssetGraph {
    fn eq(&self, other: &Self) -> bool {
        self.entities == other.entities && self.collections == other.collections
    }
}

impl TryFrom<AssetGraphData> for AssetGraph {
    type Error = MergeError;

    fn try_from(data: AssetGraphData) -> Result<Self, Self::Error> {
        let mut graph = Self::new();
        for entity in data.entities {
            graph.add_entity(entity)?;
        }
        for collection in data.collections {
            graph.add_collection(collection)?;
        }
        Ok(graph)
    }
}

impl From<AssetGraph> for AssetGraphData {
    fn from(graph: AssetGraph) -> Self {
        Self {
            entities: graph.entities,
            collections: graph.collections,
        }
    }
}

impl AssetGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names are unique within one graph.
    pub fn add_entity(&mut self, entity: Entity) -> Result<(), MergeError> {
        if self.entity_index.contains_key(&entity.name) {
            return Err(MergeError::DuplicateEntity(entity.name));
        }
        self.entity_index.insert(entity.name.clone(), self.entities.len());
        self.entities.push(entity);
        Ok(())
    }

    pub fn add_collection(&mut self, collection: Collection) -> Result<(), MergeError> {
        if self.collection_index.contains_key(&collection.name) {
            return Err(MergeError::DuplicateEntity(collection.name));
        }
        self.collection_index.insert(collection.name.clone(), self.collections.len());
        self.collections.push(collection);
        Ok(())
    }

    /// Adds `entity` to the objects of `collection`. Returns `false` if the collection is unknown.
    pub fn link(&mut self, collection: &str, entity: &str) -> bool {
        let Some(&idx) = self.collection_index.get(collection) else {
            return false;
        };
        let objects = &mut self.collections[idx].objects;
        if !objects.iter().any(|o| o == entity) {
            objects.push(entity.to_string());
        }
        true
    }

    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entity_index.get(name).and_then(|&idx| self.entities.get(idx))
    }

    pub fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entity_index
            .get(name)
            .copied()
            .and_then(move |idx| self.entities.get_mut(idx))
    }

    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[must_use]
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collection_index.get(name).and_then(|&idx| self.collections.get(idx))
    }

    #[must_use]
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Collections that hold `entity` directly, in graph order.
    #[must_use]
    pub fn direct_collections(&self, entity: &str) -> Vec<&str> {
        self.collections
            .iter()
            .filter(|c| c.objects.iter().any(|o| o == entity))
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Every collection that holds `entity` directly or through its children.
    #[must_use]
    pub fn collections_containing(&self, entity: &str) -> Vec<&str> {
        let mut parents: HashMap<&str, Vec<&str>> = HashMap::new();
        for collection in &self.collections {
            for child in &collection.children {
                parents.entry(child.as_str()).or_default().push(collection.name.as_str());
            }
        }

        let mut seen = HashSet::new();
        let mut pending = self.direct_collections(entity);
        let mut found = Vec::new();
        while let Some(name) = pending.pop() {
            if !seen.insert(name) {
                continue;
            }
            found.push(name);
            if let Some(up) = parents.get(name) {
                pending.extend(up.iter().copied());
            }
        }
        found
    }

    /// Whether `entity` lies in a collection whose name matches the glob `filter`.
    #[must_use]
    pub fn in_collection_matching(&self, entity: &str, filter: &str) -> bool {
        let pattern = WildMatch::new(filter);
        self.collections_containing(entity).into_iter().any(|c| pattern.matches(c))
    }
}
