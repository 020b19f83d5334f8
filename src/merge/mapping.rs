use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::transfer::EntityRemap;

use super::asset::AssetGraph;
use super::error::MergeError;

/// Pairs source entities and collections with their target counterparts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferMapping {
    /// Source entity name to target entity name.
    #[serde(default)]
    pub object_map: BTreeMap<String, String>,
    /// Source entities without a target counterpart; copied into the target.
    #[serde(default)]
    pub new_objects: Vec<String>,
    /// Source collection name to target collection name.
    #[serde(default)]
    pub collection_map: BTreeMap<String, String>,
}

impl TransferMapping {
    /// Pairs everything that has the same name on both sides.
    ///
    /// Source entities missing on the target become new objects.
    #[must_use]
    pub fn match_by_name(source: &AssetGraph, target: &AssetGraph) -> Self {
        let mut mapping = Self::default();
        for entity in source.entities() {
            if target.entity(&entity.name).is_some() {
                mapping.object_map.insert(entity.name.clone(), entity.name.clone());
            } else {
                mapping.new_objects.push(entity.name.clone());
            }
        }
        for collection in source.collections() {
            if target.collection(&collection.name).is_some() {
                mapping.collection_map.insert(collection.name.clone(), collection.name.clone());
            }
        }
        mapping
    }

    /// Every name must exist on its side, and a target entity may be claimed only once.
    pub fn validate(&self, source: &AssetGraph, target: &AssetGraph) -> Result<(), MergeError> {
        let mut claimed = BTreeSet::new();
        for (from, to) in &self.object_map {
            if source.entity(from).is_none() {
                return Err(MergeError::UnresolvedMapping(format!("source entity '{from}' does not exist")));
            }
            if target.entity(to).is_none() {
                return Err(MergeError::UnresolvedMapping(format!("target entity '{to}' does not exist")));
            }
            if !claimed.insert(to.as_str()) {
                return Err(MergeError::UnresolvedMapping(format!("target entity '{to}' is mapped more than once")));
            }
        }

        let mut seen = BTreeSet::new();
        for name in &self.new_objects {
            if !seen.insert(name.as_str()) {
                return Err(MergeError::UnresolvedMapping(format!("new entity '{name}' is listed twice")));
            }
            if source.entity(name).is_none() {
                return Err(MergeError::UnresolvedMapping(format!("new entity '{name}' is not in the source")));
            }
            if self.object_map.contains_key(name) {
                return Err(MergeError::UnresolvedMapping(format!("'{name}' is both mapped and new")));
            }
            if target.entity(name).is_some() || claimed.contains(name.as_str()) {
                return Err(MergeError::UnresolvedMapping(format!("new entity '{name}' already exists on the target")));
            }
        }

        for (from, to) in &self.collection_map {
            if source.collection(from).is_none() {
                return Err(MergeError::UnresolvedMapping(format!("source collection '{from}' does not exist")));
            }
            if target.collection(to).is_none() {
                return Err(MergeError::UnresolvedMapping(format!("target collection '{to}' does not exist")));
            }
        }
        Ok(())
    }

    /// Mapped pairs in source-name order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.object_map.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }
}

impl EntityRemap for TransferMapping {
    fn remap(&self, name: &str) -> Option<&str> {
        self.object_map.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Geometry;
    use crate::merge::asset::{Collection, Entity};

    fn graph(entities: &[&str], collections: &[&str]) -> AssetGraph {
        let mut graph = AssetGraph::new();
        for name in entities {
            graph.add_entity(Entity::new(*name, Geometry::Empty)).unwrap();
        }
        for name in collections {
            graph.add_collection(Collection::new(*name)).unwrap();
        }
        graph
    }

    #[test]
    fn name_matching_splits_mapped_and_new() {
        let source = graph(&["Body", "Rig", "Hat"], &["hero.geometry"]);
        let target = graph(&["Body", "Rig"], &["hero.geometry"]);
        let mapping = TransferMapping::match_by_name(&source, &target);

        assert_eq!(mapping.pairs().collect::<Vec<_>>(), vec![("Body", "Body"), ("Rig", "Rig")]);
        assert_eq!(mapping.new_objects, vec!["Hat".to_string()]);
        mapping.validate(&source, &target).unwrap();
    }

    #[test]
    fn unresolved_names_are_fatal() {
        let source = graph(&["Body"], &[]);
        let target = graph(&["Body"], &[]);

        let mut mapping = TransferMapping::default();
        mapping.object_map.insert("Body".into(), "Missing".into());
        assert!(matches!(mapping.validate(&source, &target), Err(MergeError::UnresolvedMapping(_))));

        let mut mapping = TransferMapping::default();
        mapping.new_objects.push("Body".into());
        assert!(matches!(mapping.validate(&source, &target), Err(MergeError::UnresolvedMapping(_))));

        let mut mapping = TransferMapping::default();
        mapping.collection_map.insert("a".into(), "b".into());
        assert!(matches!(mapping.validate(&source, &target), Err(MergeError::UnresolvedMapping(_))));
    }

    #[test]
    fn remaps_only_mapped_names() {
        let mut mapping = TransferMapping::default();
        mapping.object_map.insert("Rig.task".into(), "Rig".into());
        assert_eq!(mapping.remap("Rig.task"), Some("Rig"));
        assert_eq!(mapping.remap("Other"), None);
    }
}
