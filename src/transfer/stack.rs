//! Ownership-prefixed synchronisation of procedural stacks (modifier-like entries).
//!
//! Only entries whose name carries one of the caller's prefixes are touched; every
//! other entry on the target keeps its position and settings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::merge::naming::{is_owned_by, prefixed_name};

/// Setting value of a stack entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum StackValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Vector([f64; 3]),
    /// Reference to another entity by name.
    Entity(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackEntry {
    pub name: String,
    /// Operation type, e.g. `SUBSURF` or `ARMATURE`.
    pub kind: String,
    #[serde(default)]
    pub settings: BTreeMap<String, StackValue>,
}

impl StackEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            settings: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_setting(mut self, field: impl Into<String>, value: StackValue) -> Self {
        self.settings.insert(field.into(), value);
        self
    }
}

/// Translates source entity names into target entity names.
pub trait EntityRemap {
    /// Target name for `name`, or `None` to keep the reference as is.
    fn remap(&self, name: &str) -> Option<&str>;
}

impl EntityRemap for BTreeMap<String, String> {
    fn remap(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

fn remapped_value(value: &StackValue, remap: &dyn EntityRemap) -> StackValue {
    match value {
        StackValue::Entity(Some(name)) => match remap.remap(name) {
            Some(target) => StackValue::Entity(Some(target.to_string())),
            None => value.clone(),
        },
        other => other.clone(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSyncReport {
    pub removed: Vec<String>,
    pub added: Vec<String>,
    /// `(entry, field)` pairs whose value changed.
    pub updated: Vec<(String, String)>,
}

impl StackSyncReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.updated.is_empty()
    }
}

/// Bring the entries of `target` owned by `owned_prefixes` in line with `source`.
pub fn sync_stack<S: AsRef<str>>(
    source: &[StackEntry],
    target: &mut Vec<StackEntry>,
    owned_prefixes: &[S],
    remap: &dyn EntityRemap,
) -> StackSyncReport {
    let mut report = StackSyncReport::default();
    let owned = |name: &str| is_owned_by(name, owned_prefixes);
    let on_source = |name: &str| source.iter().any(|e| e.name == name);

    target.retain(|entry| {
        if owned(&entry.name) && !on_source(&entry.name) {
            log::debug!("removing stack entry {}", entry.name);
            report.removed.push(entry.name.clone());
            return false;
        }
        true
    });

    for (i, entry) in source.iter().enumerate() {
        if !owned(&entry.name) || target.iter().any(|t| t.name == entry.name) {
            continue;
        }
        // Right after the nearest preceding source entry present on the target.
        let insert_at = source[..i]
            .iter()
            .rev()
            .find_map(|prev| target.iter().position(|t| t.name == prev.name))
            .map_or(0, |pos| pos + 1);
        log::debug!("adding stack entry {} at {insert_at}", entry.name);
        target.insert(insert_at, StackEntry::new(entry.name.clone(), entry.kind.clone()));
        report.added.push(entry.name.clone());
    }

    for entry in source.iter().filter(|e| owned(&e.name)) {
        let Some(slot) = target.iter_mut().find(|t| t.name == entry.name) else {
            continue;
        };
        if slot.kind != entry.kind {
            *slot = StackEntry::new(entry.name.clone(), entry.kind.clone());
            report.updated.push((entry.name.clone(), "kind".to_string()));
        }
        report.updated.extend(copy_settings(entry, slot, remap));
    }

    report
}

/// Copy every setting of `from` onto `to`, remapping entity references.
///
/// Returns the `(entry, field)` pairs whose value actually changed.
fn copy_settings(from: &StackEntry, to: &mut StackEntry, remap: &dyn EntityRemap) -> Vec<(String, String)> {
    let mut changed = Vec::new();
    for (field, value) in &from.settings {
        let value = remapped_value(value, remap);
        if to.settings.get(field) != Some(&value) {
            to.settings.insert(field.clone(), value);
            changed.push((to.name.clone(), field.clone()));
        }
    }
    let stale: Vec<String> = to.settings.keys().filter(|k| !from.settings.contains_key(*k)).cloned().collect();
    for field in stale {
        to.settings.remove(&field);
        changed.push((to.name.clone(), field));
    }
    changed
}

/// Give every entry without a known prefix the `prefix`. Returns how many were renamed.
///
/// A claimed name that is already taken gets a numeric suffix (`GEO-Smooth.001`),
/// so names stay unique within the stack.
pub fn claim_unprefixed<S: AsRef<str>>(stack: &mut [StackEntry], prefix: &str, known_prefixes: &[S]) -> usize {
    let mut claimed = 0;
    for i in 0..stack.len() {
        if is_owned_by(&stack[i].name, known_prefixes) {
            continue;
        }
        let wanted = prefixed_name(&stack[i].name, prefix, known_prefixes);
        let name = unique_name(stack, wanted);
        stack[i].name = name;
        claimed += 1;
    }
    claimed
}

fn unique_name(stack: &[StackEntry], wanted: String) -> String {
    let taken = |name: &str| stack.iter().any(|e| e.name == name);
    if !taken(&wanted) {
        return wanted;
    }
    (1..)
        .map(|n| format!("{wanted}.{n:03}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or(wanted)
}

/// Rewrite the entity references of `entry` through `remap`. Returns whether anything changed.
pub fn remap_references(entry: &mut StackEntry, remap: &dyn EntityRemap) -> bool {
    let mut changed = false;
    for value in entry.settings.values_mut() {
        let remapped = remapped_value(value, remap);
        if *value != remapped {
            *value = remapped;
            changed = true;
        }
    }
    changed
}
