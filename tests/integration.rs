use asset_merge::geom::{
    AttributeChannel, AttributeData, Curve, Domain, Geometry, Mesh, MorphTarget, Spline, TopologyMatch, VertexGroup, topology_match,
};
use asset_merge::merge::{
    AssetGraph, Collection, Entity, MergeError, MergeOptions, Merger, TaskLayerRegistry, TransferMapping, merge, parse_config,
};
use asset_merge::transfer::{StackEntry, StackValue};

fn two_triangles(positions: Vec<[f64; 3]>) -> Mesh {
    Mesh::new(positions, vec![vec![0, 1, 2], vec![0, 2, 3]])
}

fn unit_quad() -> Vec<[f64; 3]> {
    vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]
}

/// Graph with one collection holding every given entity.
fn graph(collection: &str, entities: Vec<Entity>) -> AssetGraph {
    let mut graph = AssetGraph::new();
    graph.add_collection(Collection::new(collection)).unwrap();
    for entity in entities {
        let name = entity.name.clone();
        graph.add_entity(entity).unwrap();
        assert!(graph.link(collection, &name));
    }
    graph
}

fn float_values(mesh: &Mesh, name: &str) -> Vec<f64> {
    match mesh.attribute(name).map(|c| &c.data) {
        Some(AttributeData::Float(values)) => values.clone(),
        other => panic!("attribute {name}: unexpected {other:?}"),
    }
}

fn mesh_of<'a>(graph: &'a AssetGraph, name: &str) -> &'a Mesh {
    graph.entity(name).and_then(|e| e.geometry.as_mesh()).expect("mesh entity")
}

#[test]
fn point_attribute_copies_exactly_on_matching_topology() {
    let mut source_mesh = two_triangles(unit_quad());
    assert_eq!(source_mesh.edge_count(), 5);
    source_mesh.set_attribute(AttributeChannel::new("w", Domain::Point, AttributeData::Float(vec![1.0, 2.0, 3.0, 4.0])));
    let target_mesh = two_triangles(vec![[0.0, 0.0, 0.3], [2.0, 0.0, 0.0], [2.0, 2.0, 0.1], [0.0, 2.0, 0.0]]);

    let source = graph("hero.shading", vec![Entity::new("Body", source_mesh)]);
    let mut target = graph("hero.shading", vec![Entity::new("Body", target_mesh)]);
    let mapping = TransferMapping::match_by_name(&source, &target);

    let report = merge(&source, &mut target, &mapping, &TaskLayerRegistry::builtin()).unwrap();
    assert!(report.failed_pairs.is_empty(), "{report}");
    assert_eq!(float_values(mesh_of(&target, "Body"), "w"), vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn owned_stack_entry_is_inserted_before_foreign_one() {
    let armature = StackEntry::new("RIG-Armature", "ARMATURE").with_setting("object", StackValue::Entity(Some("Rig".into())));
    let mut source_entity = Entity::new("Body", Geometry::Empty);
    source_entity.stack = vec![
        StackEntry::new("GEO-Subdivide", "SUBSURF").with_setting("levels", StackValue::Int(2)),
        StackEntry::new("RIG-Armature", "ARMATURE"),
    ];
    let mut target_entity = Entity::new("Body", Geometry::Empty);
    target_entity.stack = vec![armature.clone()];

    let source = graph("hero.geometry", vec![source_entity]);
    let mut target = graph("hero.geometry", vec![target_entity]);
    let mapping = TransferMapping::match_by_name(&source, &target);

    merge(&source, &mut target, &mapping, &TaskLayerRegistry::builtin()).unwrap();

    let stack = &target.entity("Body").unwrap().stack;
    let names: Vec<&str> = stack.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["GEO-Subdivide", "RIG-Armature"]);
    assert_eq!(stack[0].settings["levels"], StackValue::Int(2));
    assert_eq!(stack[1], armature);
}

#[test]
fn morph_target_resolves_to_target_basis() {
    let smile_offsets = vec![[0.0, 0.0, 0.1], [0.0, 0.0, 0.2], [0.0, 0.0, 0.3], [0.0, 0.0, 0.4]];
    let mut source_mesh = two_triangles(unit_quad());
    source_mesh.morph_targets = vec![
        MorphTarget::new("Basis", vec![[0.0; 3]; 4]),
        MorphTarget::new("GEO-Smile", smile_offsets.clone()).relative_to("Basis"),
    ];
    let mut target_mesh = two_triangles(unit_quad());
    target_mesh.morph_targets = vec![MorphTarget::new("Basis", vec![[0.0; 3]; 4])];

    let source = graph("hero.geometry", vec![Entity::new("Body", source_mesh)]);
    let mut target = graph("hero.geometry", vec![Entity::new("Body", target_mesh)]);
    let mapping = TransferMapping::match_by_name(&source, &target);

    merge(&source, &mut target, &mapping, &TaskLayerRegistry::builtin()).unwrap();

    let mesh = mesh_of(&target, "Body");
    let names: Vec<&str> = mesh.morph_targets.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Basis", "GEO-Smile"]);
    let smile = mesh.morph_target("GEO-Smile").unwrap();
    assert_eq!(smile.relative_key.as_deref(), Some("Basis"));
    assert_eq!(smile.offsets, smile_offsets);
}

/// Two unit squares sharing the edge x = 1, with a corner channel `u`.
fn seamed_squares(right_island: [f64; 4]) -> Mesh {
    let mut mesh = Mesh::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [2.0, 1.0, 0.0]],
        vec![vec![0, 1, 4, 3], vec![1, 2, 5, 4]],
    );
    let mut values = vec![0.0, 1.0, 1.0, 0.0];
    values.extend(right_island);
    mesh.set_attribute(AttributeChannel::new("u", Domain::Corner, AttributeData::Float(values)));
    mesh
}

#[test]
fn corner_values_stay_on_their_island() {
    let source = graph("hero.shading", vec![Entity::new("Body", seamed_squares([10.0, 11.0, 11.0, 10.0]))]);
    let straddling = Mesh::new(
        vec![[0.4, 0.0, 0.0], [1.5, 0.0, 0.0], [1.5, 1.0, 0.0], [0.4, 1.0, 0.0]],
        vec![vec![0, 1, 2, 3]],
    );
    let mut target = graph("hero.shading", vec![Entity::new("Body", straddling)]);
    let mapping = TransferMapping::match_by_name(&source, &target);

    let report = merge(&source, &mut target, &mapping, &TaskLayerRegistry::builtin()).unwrap();
    assert!(report.failed_pairs.is_empty(), "{report}");

    let values = float_values(mesh_of(&target, "Body"), "u");
    // The target face centre lies on the left island; nothing may come from the right one.
    for (value, expected) in values.iter().zip([0.4, 1.0, 1.0, 0.4]) {
        assert!((value - expected).abs() < 1e-9, "{values:?}");
    }
    assert!(values.iter().all(|v| *v <= 1.0));
}

fn full_asset(translation: f64) -> Entity {
    let mut mesh = two_triangles(unit_quad());
    mesh.set_attribute(AttributeChannel::new("w", Domain::Point, AttributeData::Float(vec![1.0, 2.0, 3.0, 4.0])));
    mesh.morph_targets = vec![
        MorphTarget::new("Basis", vec![[0.0; 3]; 4]),
        MorphTarget::new("GEO-Smile", vec![[0.0, 0.0, 1.0]; 4]).relative_to("Basis"),
    ];
    let mut entity = Entity::new("Body", mesh);
    entity.transform.translation = [translation, 0.0, 0.0];
    entity.material_slots = vec![Some("Skin".into())];
    entity.stack = vec![
        StackEntry::new("GEO-Mirror", "MIRROR").with_setting("mirror_object", StackValue::Entity(Some("Body".into()))),
        StackEntry::new("APL-Weld", "WELD").with_setting("distance", StackValue::Float(0.001)),
        StackEntry::new("SH-Displace", "DISPLACE").with_setting("strength", StackValue::Float(0.2)),
    ];
    entity
}

#[test]
fn second_merge_changes_nothing() {
    let registry = TaskLayerRegistry::builtin();
    let mut source = graph("hero.geometry", vec![full_asset(1.0)]);
    source.add_collection(Collection::new("hero.shading")).unwrap();
    source.link("hero.shading", "Body");
    let mut target_entity = Entity::new("Body", two_triangles(unit_quad()));
    target_entity.material_slots = vec![Some("Old".into()), Some("Extra".into())];
    let mut target = graph("hero.geometry", vec![target_entity]);
    target.add_collection(Collection::new("hero.shading")).unwrap();
    let mapping = TransferMapping::match_by_name(&source, &target);

    let first = merge(&source, &mut target, &mapping, &registry).unwrap();
    assert!(first.failed_pairs.is_empty(), "{first}");
    let body = target.entity("Body").unwrap();
    assert_eq!(body.material_slots, vec![Some("Skin".to_string())]);
    assert_eq!(body.transform.translation, [1.0, 0.0, 0.0]);
    assert_eq!(body.stack.len(), 3);
    let snapshot = target.clone();

    let second = merge(&source, &mut target, &mapping, &registry).unwrap();
    assert!(second.notes.is_empty(), "{second}");
    assert_eq!(target, snapshot);
}

#[test]
fn reordered_mesh_is_a_mismatch_but_still_transfers() {
    // Same surface as `unit_quad`, points listed in a different order.
    let relabelled = Mesh::new(
        vec![[1.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
        vec![vec![2, 3, 0], vec![2, 0, 1]],
    );
    let mut source_mesh = two_triangles(unit_quad());
    source_mesh.set_attribute(AttributeChannel::new("w", Domain::Point, AttributeData::Float(vec![1.0, 2.0, 3.0, 4.0])));

    let a = Geometry::Mesh(source_mesh.clone());
    let b = Geometry::Mesh(relabelled.clone());
    assert_eq!(topology_match(&a, &b), TopologyMatch::Mismatch);
    assert_eq!(topology_match(&b, &a), TopologyMatch::Mismatch);

    let source = graph("hero.shading", vec![Entity::new("Body", source_mesh)]);
    let mut target = graph("hero.shading", vec![Entity::new("Body", relabelled)]);
    let mapping = TransferMapping::match_by_name(&source, &target);
    merge(&source, &mut target, &mapping, &TaskLayerRegistry::builtin()).unwrap();

    let values = float_values(mesh_of(&target, "Body"), "w");
    for (value, expected) in values.iter().zip([3.0, 4.0, 1.0, 2.0]) {
        assert!((value - expected).abs() < 1e-9, "{values:?}");
    }
}

#[test]
fn one_broken_pair_does_not_stop_the_merge() {
    let mut good = Entity::new("Body", two_triangles(unit_quad()));
    good.transform.translation = [0.0, 3.0, 0.0];
    let hair = Entity::new("Hair", Curve::new(vec![Spline::new(vec![[0.0; 3], [0.0, 0.0, 1.0]])]));
    let source = graph("hero.geometry", vec![good, hair]);

    let mut target = graph(
        "hero.geometry",
        vec![Entity::new("Body", two_triangles(unit_quad())), Entity::new("Hair", two_triangles(unit_quad()))],
    );
    let hair_before = target.entity("Hair").unwrap().clone();
    let mapping = TransferMapping::match_by_name(&source, &target);

    let report = merge(&source, &mut target, &mapping, &TaskLayerRegistry::builtin()).unwrap();
    assert_eq!(report.failed_pairs, vec![("Modeling".to_string(), "Hair".to_string())]);
    assert_eq!(report.errors().count(), 1);
    assert_eq!(target.entity("Hair").unwrap(), &hair_before);
    assert_eq!(target.entity("Body").unwrap().transform.translation, [0.0, 3.0, 0.0]);
}

#[test]
fn changed_topology_replaces_geometry_and_keeps_foreign_data() {
    // Source subdivided: centre point added.
    let source_mesh = Mesh::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.5, 0.5, 0.0]],
        vec![vec![0, 1, 4], vec![1, 2, 4], vec![2, 3, 4], vec![3, 0, 4]],
    );
    let mut target_mesh = two_triangles(unit_quad());
    target_mesh.morph_targets = vec![
        MorphTarget::new("Basis", vec![[0.0; 3]; 4]),
        MorphTarget::new("RIG-Blink", vec![[0.0, 0.0, 2.0]; 4]).relative_to("Basis"),
    ];
    let mut group = VertexGroup::new("DEF-Spine");
    group.weights = (0..4).map(|p| (p, 1.0)).collect();
    target_mesh.vertex_groups.push(group);

    let source = graph("hero.geometry", vec![Entity::new("Body", source_mesh)]);
    let mut target = graph("hero.geometry", vec![Entity::new("Body", target_mesh)]);
    let mapping = TransferMapping::match_by_name(&source, &target);

    let report = merge(&source, &mut target, &mapping, &TaskLayerRegistry::builtin()).unwrap();
    assert!(report.failed_pairs.is_empty(), "{report}");

    let mesh = mesh_of(&target, "Body");
    assert_eq!(mesh.point_count(), 5);
    assert_eq!(mesh.face_count(), 4);
    let blink = mesh.morph_target("RIG-Blink").expect("re-projected");
    assert_eq!(blink.offsets.len(), 5);
    assert!(blink.offsets.iter().all(|o| (o[2] - 2.0).abs() < 1e-9));
    let spine = mesh.vertex_group("DEF-Spine").expect("re-projected");
    assert!((0..5).all(|p| (spine.weight(p) - 1.0).abs() < 1e-9));
}

#[test]
fn changed_topology_keeps_keys_relative_to_recreated_targets() {
    let mut source_mesh = Mesh::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.5, 0.5, 0.0]],
        vec![vec![0, 1, 4], vec![1, 2, 4], vec![2, 3, 4], vec![3, 0, 4]],
    );
    source_mesh.morph_targets = vec![
        MorphTarget::new("Basis", vec![[0.0; 3]; 5]),
        MorphTarget::new("GEO-Smile", vec![[0.0, 0.0, 1.0]; 5]).relative_to("Basis"),
    ];
    let mut target_mesh = two_triangles(unit_quad());
    target_mesh.morph_targets = vec![
        MorphTarget::new("Basis", vec![[0.0; 3]; 4]),
        MorphTarget::new("GEO-Smile", vec![[0.0, 0.0, 1.0]; 4]).relative_to("Basis"),
        MorphTarget::new("RIG-SmileFix", vec![[0.0, 0.0, 0.5]; 4]).relative_to("GEO-Smile"),
    ];

    let source = graph("hero.geometry", vec![Entity::new("Body", source_mesh)]);
    let mut target = graph("hero.geometry", vec![Entity::new("Body", target_mesh)]);
    let mapping = TransferMapping::match_by_name(&source, &target);

    let report = merge(&source, &mut target, &mapping, &TaskLayerRegistry::builtin()).unwrap();
    assert!(!report.has_errors(), "{report}");

    let mesh = mesh_of(&target, "Body");
    assert_eq!(mesh.point_count(), 5);
    let fix = mesh.morph_target("RIG-SmileFix").expect("re-projected");
    assert_eq!(fix.relative_key.as_deref(), Some("GEO-Smile"));
    assert!(fix.offsets.iter().all(|o| (o[2] - 0.5).abs() < 1e-9));
    let smile = mesh.morph_target("GEO-Smile").expect("recreated");
    assert_eq!(smile.offsets.len(), 5);
    assert_eq!(smile.relative_key.as_deref(), Some("Basis"));
}

#[test]
fn rigging_syncs_owned_constraints() {
    let mut source_arm = Entity::new("Arm", Geometry::Empty);
    source_arm.constraints = vec![
        StackEntry::new("RIG-CopyLoc", "COPY_LOCATION").with_setting("target", StackValue::Entity(Some("Rig.task".into()))),
        StackEntry::new("GEO-Limit", "LIMIT_LOCATION").with_setting("max_z", StackValue::Float(2.0)),
    ];
    let mut target_arm = Entity::new("Arm", Geometry::Empty);
    let limit = StackEntry::new("GEO-Limit", "LIMIT_LOCATION").with_setting("max_z", StackValue::Float(1.0));
    target_arm.constraints = vec![limit.clone(), StackEntry::new("RIG-Stale", "DAMPED_TRACK")];

    let source = graph("hero.rig", vec![source_arm, Entity::new("Rig.task", Geometry::Empty)]);
    let mut target = graph("hero.rig", vec![target_arm, Entity::new("Rig", Geometry::Empty)]);
    let mut mapping = TransferMapping::default();
    mapping.object_map.insert("Arm".into(), "Arm".into());
    mapping.object_map.insert("Rig.task".into(), "Rig".into());

    let report = merge(&source, &mut target, &mapping, &TaskLayerRegistry::builtin()).unwrap();
    assert!(report.failed_pairs.is_empty(), "{report}");

    let arm = target.entity("Arm").unwrap();
    let names: Vec<&str> = arm.constraints.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["RIG-CopyLoc", "GEO-Limit"]);
    assert_eq!(arm.constraint("RIG-CopyLoc").unwrap().settings["target"], StackValue::Entity(Some("Rig".into())));
    assert_eq!(arm.constraint("GEO-Limit"), Some(&limit));
}

#[test]
fn rigging_transfers_vertex_groups() {
    let mut source_mesh = two_triangles(unit_quad());
    let mut group = VertexGroup::new("DEF-Arm");
    group.weights = [(0, 1.0), (1, 0.5)].into_iter().collect();
    source_mesh.vertex_groups.push(group);

    let source = graph("hero.rig", vec![Entity::new("Body", source_mesh)]);
    let mut target = graph("hero.rig", vec![Entity::new("Body", two_triangles(unit_quad()))]);
    let mapping = TransferMapping::match_by_name(&source, &target);

    merge(&source, &mut target, &mapping, &TaskLayerRegistry::builtin()).unwrap();
    let arm = mesh_of(&target, "Body").vertex_group("DEF-Arm").expect("group");
    assert_eq!(arm.weight(0), 1.0);
    assert_eq!(arm.weight(1), 0.5);
}

#[test]
fn new_hair_curve_is_claimed_and_repointed() {
    let mut curve = Curve::new(vec![Spline::new(vec![[0.0; 3], [0.0, 0.0, 1.0]])]);
    curve.surface = Some("Body.task".into());
    let mut hair = Entity::new("Hair", curve);
    hair.stack = vec![StackEntry::new("Children", "PARTICLES").with_setting("target", StackValue::Entity(Some("Body.task".into())))];

    let source = graph("hero.task.hair", vec![Entity::new("Body.task", Geometry::Empty), hair]);
    let mut target = graph("hero.hair", vec![Entity::new("Body", Geometry::Empty)]);

    let mut mapping = TransferMapping::default();
    mapping.object_map.insert("Body.task".into(), "Body".into());
    mapping.new_objects.push("Hair".into());
    mapping.collection_map.insert("hero.task.hair".into(), "hero.hair".into());

    let report = merge(&source, &mut target, &mapping, &TaskLayerRegistry::builtin()).unwrap();
    assert_eq!(report.new_objects, vec!["Hair".to_string()]);

    let hair = target.entity("Hair").expect("copied");
    assert!(target.collection("hero.hair").unwrap().objects.contains(&"Hair".to_string()));
    let Geometry::Curve(curve) = &hair.geometry else {
        panic!("hair lost its curve");
    };
    assert_eq!(curve.surface.as_deref(), Some("Body"));
    let children = hair.stack_entry("GRM-Children").expect("claimed by grooming");
    assert_eq!(children.settings["target"], StackValue::Entity(Some("Body".into())));
}

#[test]
fn configuration_errors_are_fatal() {
    let err = parse_config(r#"<taskLayers><layer name="Modelling"/></taskLayers>"#).unwrap_err();
    assert!(matches!(
        err,
        MergeError::UnknownTaskLayer { ref suggestion, .. } if suggestion.as_deref() == Some("Modeling")
    ));

    let config = parse_config(
        r#"<taskLayers>
             <options positionOffsetWarning="0.0"/>
             <layer name="Modeling" collection="*.geometry"/>
           </taskLayers>"#,
    )
    .unwrap();
    let lifted = two_triangles(vec![[0.0, 0.0, 0.5], [1.0, 0.0, 0.5], [1.0, 1.0, 0.5], [0.0, 1.0, 0.5]]);
    let source = graph("hero.geometry", vec![Entity::new("Body", lifted)]);
    let mut target = graph("hero.geometry", vec![Entity::new("Body", two_triangles(unit_quad()))]);
    let mapping = TransferMapping::match_by_name(&source, &target);

    let report = Merger::new(&config.registry, config.options).merge(&source, &mut target, &mapping).unwrap();
    assert_eq!(report.layers_run, vec!["Modeling"]);
    assert_eq!(report.warnings().count(), 1);
    assert_eq!(MergeOptions::default().position_offset_warning, 0.1);
}
