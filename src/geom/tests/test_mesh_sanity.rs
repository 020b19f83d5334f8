use crate::geom::{AttributeChannel, AttributeData, Domain, Mesh, MorphTarget, Point3, edge_key};

fn two_triangles() -> Mesh {
    Mesh::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        vec![vec![0, 1, 2], vec![0, 2, 3]],
    )
}

#[test]
fn derived_edges_follow_first_appearance() {
    let mesh = two_triangles();
    assert_eq!(mesh.edges, vec![[0, 1], [1, 2], [0, 2], [2, 3], [0, 3]]);
    assert_eq!(mesh.point_count(), 4);
    assert_eq!(mesh.edge_count(), 5);
    assert_eq!(mesh.face_count(), 2);
    assert_eq!(mesh.corner_count(), 6);
    mesh.validate().expect("valid mesh");
}

#[test]
fn corner_numbering_is_face_by_face() {
    let mesh = two_triangles();
    assert_eq!(mesh.corner_offsets(), vec![0, 3]);
    assert_eq!(mesh.corner_points(), vec![0, 1, 2, 0, 2, 3]);
}

#[test]
fn edge_faces_lists_shared_edges_once_per_face() {
    let mesh = two_triangles();
    let adjacency = mesh.edge_faces();
    assert_eq!(adjacency[&edge_key(2, 0)], vec![0, 1]);
    assert_eq!(adjacency[&edge_key(0, 1)], vec![0]);
    assert_eq!(adjacency.len(), 5);
}

#[test]
fn face_center_is_loop_mean() {
    let mesh = two_triangles();
    let center = mesh.face_center(0).expect("face 0");
    assert!((center.x - 2.0 / 3.0).abs() < 1e-12);
    assert!((center.y - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(mesh.face_center(9), None);
    assert_eq!(mesh.point(3), Some(Point3::new(0.0, 1.0, 0.0)));
}

#[test]
fn validate_rejects_broken_invariants() {
    let mut short_face = two_triangles();
    short_face.faces.push(vec![0, 1]);
    assert!(short_face.validate().is_err());

    let mut bad_index = two_triangles();
    bad_index.faces[1][2] = 42;
    assert!(bad_index.validate().is_err());

    let mut bad_channel = two_triangles();
    bad_channel.set_attribute(AttributeChannel::new("weight", Domain::Point, AttributeData::Float(vec![1.0])));
    let err = bad_channel.validate().unwrap_err();
    assert!(err.contains("weight"));

    let mut bad_morph = two_triangles();
    bad_morph.morph_targets.push(MorphTarget::new("Smile", vec![[0.0; 3]; 3]));
    assert!(bad_morph.validate().is_err());
}

#[test]
fn set_attribute_replaces_by_name() {
    let mut mesh = two_triangles();
    mesh.set_attribute(AttributeChannel::new("id", Domain::Face, AttributeData::Int(vec![1, 2])));
    mesh.set_attribute(AttributeChannel::new("id", Domain::Face, AttributeData::Int(vec![3, 4])));
    assert_eq!(mesh.attributes.len(), 1);
    assert_eq!(mesh.attribute("id").unwrap().data, AttributeData::Int(vec![3, 4]));
    assert!(mesh.remove_attribute("id").is_some());
    assert!(mesh.remove_attribute("id").is_none());
}
