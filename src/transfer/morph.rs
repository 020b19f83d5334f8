//! Morph-target (shape key) transfer.
//!
//! Offsets are stored relative to the base shape, so resampling them by proximity
//! never drags the source base shape along when the two bases differ.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::geom::{FaceSample, Mesh, MorphTarget, SpatialIndex};
use crate::merge::naming::owner_prefix;

use super::error::{TransferError, TransferResult};

/// Name given to the base morph target created on a target without any.
pub const BASIS_NAME: &str = "Basis";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MorphTransferReport {
    pub removed: Vec<String>,
    pub created: Vec<String>,
    pub basis_created: bool,
    #[serde(skip)]
    pub errors: Vec<TransferError>,
}

fn is_owned(morph: &MorphTarget, prefix: &str) -> bool {
    owner_prefix(&morph.name) == Some(prefix)
}

/// Replace the target's morph targets owned by `owned_prefix` with the source's.
///
/// Fails as a whole only when offsets must be resampled and `index` (the face
/// index of `source`) is missing. Problems with individual morph targets end up in
/// [`MorphTransferReport::errors`] and leave that morph target out.
pub fn transfer_morph_targets(
    source: &Mesh,
    target: &mut Mesh,
    owned_prefix: &str,
    topo_match: bool,
    index: Option<&SpatialIndex>,
) -> TransferResult<MorphTransferReport> {
    let owned: Vec<&MorphTarget> = source.morph_targets.iter().filter(|m| is_owned(m, owned_prefix)).collect();
    let samples = if topo_match || owned.is_empty() {
        None
    } else {
        Some(sample_points(target, index)?)
    };

    let mut report = MorphTransferReport::default();
    target.morph_targets.retain(|m| {
        if is_owned(m, owned_prefix) {
            report.removed.push(m.name.clone());
            return false;
        }
        true
    });
    if owned.is_empty() {
        return Ok(report);
    }

    if target.morph_targets.is_empty() {
        target
            .morph_targets
            .push(MorphTarget::new(BASIS_NAME, vec![[0.0; 3]; target.point_count()]));
        report.basis_created = true;
    }

    let order = RelativeKeyOrder::new(&owned);
    for (idx, chain) in order.blocked {
        report.errors.push(TransferError::CyclicReference {
            item: owned[idx].name.clone(),
            chain,
        });
    }

    for idx in order.order {
        let morph = owned[idx];
        match build_morph_target(source, target, morph, samples.as_deref()) {
            Ok(created) => {
                report.created.push(created.name.clone());
                target.morph_targets.push(created);
            }
            Err(err) => {
                log::warn!("skipping morph target '{}': {err}", morph.name);
                report.errors.push(err);
            }
        }
    }

    log::debug!(
        "morph targets ({owned_prefix}): {} removed, {} created, {} failed",
        report.removed.len(),
        report.created.len(),
        report.errors.len()
    );
    Ok(report)
}

fn build_morph_target(
    source: &Mesh,
    target: &Mesh,
    morph: &MorphTarget,
    samples: Option<&[FaceSample]>,
) -> TransferResult<MorphTarget> {
    let relative_key = resolve_relative_key(source, target, morph)?;
    if let Some(key) = &relative_key {
        if let Some(chain) = chain_reaching(target, key, &morph.name) {
            return Err(TransferError::CyclicReference {
                item: morph.name.clone(),
                chain,
            });
        }
    }

    let offsets = match samples {
        Some(samples) => samples.iter().map(|s| s.blend_vectors(&morph.offsets).to_array()).collect(),
        None => {
            if morph.offsets.len() != target.point_count() {
                return Err(TransferError::LengthMismatch {
                    channel: morph.name.clone(),
                    expected: target.point_count(),
                    found: morph.offsets.len(),
                });
            }
            morph.offsets.clone()
        }
    };

    let mut created = MorphTarget::new(morph.name.clone(), offsets);
    created.relative_key = relative_key;
    created.copy_settings_from(morph);
    Ok(created)
}

/// Target-side name of the morph target `morph` is relative to.
///
/// A key naming the source's base morph target resolves to the target's base.
fn resolve_relative_key(source: &Mesh, target: &Mesh, morph: &MorphTarget) -> TransferResult<Option<String>> {
    let Some(key) = morph.relative_key.as_deref() else {
        return Ok(None);
    };
    if key == morph.name {
        return Ok(None);
    }
    if target.morph_target(key).is_some() {
        return Ok(Some(key.to_string()));
    }
    let source_base = source.morph_targets.first().map(|m| m.name.as_str());
    match target.morph_targets.first() {
        Some(base) if source_base == Some(key) => Ok(Some(base.name.clone())),
        _ => Err(TransferError::DanglingReference {
            item: morph.name.clone(),
            reference: key.to_string(),
        }),
    }
}

/// Follows relative keys on `mesh` from `start`; returns the chain if it reaches `name`.
fn chain_reaching(mesh: &Mesh, start: &str, name: &str) -> Option<Vec<String>> {
    let mut chain = vec![name.to_string(), start.to_string()];
    let mut current = start;
    for _ in 0..=mesh.morph_targets.len() {
        let next = mesh.morph_target(current)?.relative_key.as_deref()?;
        chain.push(next.to_string());
        if next == name {
            return Some(chain);
        }
        if next == current {
            return None;
        }
        current = next;
    }
    None
}

/// Nearest source surface sample for every target point.
fn sample_points(target: &Mesh, index: Option<&SpatialIndex>) -> TransferResult<Vec<FaceSample>> {
    let index = index.ok_or_else(|| TransferError::InvalidGeometry("source mesh has no faces".to_string()))?;
    target
        .positions
        .iter()
        .map(|&p| index.sample(p.into()))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| TransferError::InvalidGeometry("source mesh has no faces".to_string()))
}

/// Processing order of morph targets so every relative key is created first.
///
/// Kahn ordering over the "is relative to" edges between the given morph targets,
/// ties broken by input position. Members of (or dependants of) a cycle are
/// returned in `blocked` together with the cycle that blocks them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelativeKeyOrder {
    pub order: Vec<usize>,
    pub blocked: Vec<(usize, Vec<String>)>,
}

impl RelativeKeyOrder {
    #[must_use]
    pub fn new(morphs: &[&MorphTarget]) -> Self {
        let by_name: HashMap<&str, usize> = morphs.iter().enumerate().map(|(i, m)| (m.name.as_str(), i)).collect();
        let parent: Vec<Option<usize>> = morphs
            .iter()
            .enumerate()
            .map(|(i, m)| {
                m.relative_key
                    .as_deref()
                    .and_then(|key| by_name.get(key).copied())
                    .filter(|&p| p != i)
            })
            .collect();

        let mut indegree = vec![0usize; morphs.len()];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); morphs.len()];
        for (child, p) in parent.iter().enumerate() {
            if let Some(p) = *p {
                children[p].push(child);
                indegree[child] += 1;
            }
        }

        let mut queue: VecDeque<usize> = (0..morphs.len()).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(morphs.len());
        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &child in &children[node] {
                indegree[child] -= 1;
                if indegree[child] == 0 {
                    queue.push_back(child);
                }
            }
        }

        let done: HashSet<usize> = order.iter().copied().collect();
        let blocked = (0..morphs.len())
            .filter(|i| !done.contains(i))
            .map(|i| {
                let cycle = find_cycle(i, &parent)
                    .into_iter()
                    .map(|n| morphs[n].name.clone())
                    .collect();
                (i, cycle)
            })
            .collect();

        Self { order, blocked }
    }
}

/// Walks parent links from `start` until a node repeats; returns that cycle.
fn find_cycle(start: usize, parent: &[Option<usize>]) -> Vec<usize> {
    let mut stack = vec![start];
    let mut current = start;
    while let Some(next) = parent.get(current).copied().flatten() {
        if let Some(position) = stack.iter().position(|&n| n == next) {
            let mut cycle = stack[position..].to_vec();
            cycle.push(next);
            return cycle;
        }
        stack.push(next);
        current = next;
    }
    Vec::new()
}

/// Re-project every morph target not owned by `skip_prefix` from `old` onto `new`.
///
/// `new` replaces the geometry of `old`; `old_index` is the face index of `old`.
/// Missing morph targets are created on `new`, existing ones get their offsets,
/// relative key and vertex group from `old`. Relative keys naming a `skip_prefix`
/// morph target are kept as they are: the owner recreates those afterwards, and
/// [`clear_dangling_relative_keys`] catches the ones it does not.
pub fn transfer_foreign_morph_targets(
    old: &Mesh,
    new: &mut Mesh,
    skip_prefix: &str,
    old_index: &SpatialIndex,
) -> TransferResult<MorphTransferReport> {
    let mut report = MorphTransferReport::default();
    let foreign: Vec<&MorphTarget> = old.morph_targets.iter().filter(|m| !is_owned(m, skip_prefix)).collect();
    if foreign.is_empty() {
        return Ok(report);
    }
    let samples = sample_points(new, Some(old_index))?;

    for morph in &foreign {
        if new.morph_target(&morph.name).is_none() {
            new.morph_targets
                .push(MorphTarget::new(morph.name.clone(), vec![[0.0; 3]; new.point_count()]));
            report.created.push(morph.name.clone());
        }
    }

    let mut names: HashSet<String> = new.morph_targets.iter().map(|m| m.name.clone()).collect();
    names.extend(old.morph_targets.iter().filter(|m| is_owned(m, skip_prefix)).map(|m| m.name.clone()));
    for slot in new.morph_targets.iter_mut() {
        let Some(morph) = foreign.iter().find(|m| m.name == slot.name) else {
            continue;
        };
        slot.offsets = samples.iter().map(|s| s.blend_vectors(&morph.offsets).to_array()).collect();
        slot.vertex_group.clone_from(&morph.vertex_group);
        slot.relative_key = match morph.relative_key.as_deref() {
            Some(key) if names.contains(key) => Some(key.to_string()),
            Some(key) => {
                report.errors.push(TransferError::DanglingReference {
                    item: morph.name.clone(),
                    reference: key.to_string(),
                });
                None
            }
            None => None,
        };
    }

    Ok(report)
}

/// Clears relative keys naming a morph target `mesh` does not have.
pub fn clear_dangling_relative_keys(mesh: &mut Mesh) -> Vec<TransferError> {
    let names: HashSet<String> = mesh.morph_targets.iter().map(|m| m.name.clone()).collect();
    let mut errors = Vec::new();
    for morph in &mut mesh.morph_targets {
        if morph.relative_key.as_deref().is_none_or(|key| names.contains(key)) {
            continue;
        }
        if let Some(reference) = morph.relative_key.take() {
            errors.push(TransferError::DanglingReference {
                item: morph.name.clone(),
                reference,
            });
        }
    }
    errors
}
