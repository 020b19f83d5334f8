use crate::geom::{Mesh, Point3, PointIndex, SpatialIndex, SpatialIndexCache, Tolerance, closest_point_on_triangle};

fn two_triangles() -> Mesh {
    Mesh::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        vec![vec![0, 1, 2], vec![0, 2, 3]],
    )
}

fn assert_weights_sum_to_one(weights: [f64; 3]) {
    let sum: f64 = weights.iter().sum();
    assert!(Tolerance::WEIGHTS.approx_eq(sum, 1.0), "weights {weights:?} sum to {sum}");
}

#[test]
fn sample_projects_onto_nearest_face() {
    let index = SpatialIndex::build(&two_triangles()).expect("index");
    let sample = index.sample(Point3::new(0.75, 0.25, 1.0)).expect("sample");

    assert_eq!(sample.face, 0);
    assert_eq!(sample.points, [0, 1, 2]);
    assert_eq!(sample.corners, [0, 1, 2]);
    assert!(sample.location.distance_to(Point3::new(0.75, 0.25, 0.0)) < 1e-12);
    assert!((sample.weights[0] - 0.25).abs() < 1e-12);
    assert!((sample.weights[1] - 0.5).abs() < 1e-12);
    assert!((sample.weights[2] - 0.25).abs() < 1e-12);
}

#[test]
fn equidistant_faces_resolve_to_lowest_index() {
    let index = SpatialIndex::build(&two_triangles()).expect("index");
    assert_eq!(index.nearest_face(Point3::new(0.5, 0.5, 3.0)), Some(0));
}

#[test]
fn quad_faces_use_fan_triangles_and_corner_indices() {
    let mesh = Mesh::new(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 1.0, 0.0],
        ],
        vec![vec![0, 1, 2, 3], vec![1, 4, 5, 2]],
    );
    let index = SpatialIndex::build(&mesh).expect("index");
    let sample = index.sample(Point3::new(1.2, 0.9, 0.0)).expect("sample");

    assert_eq!(sample.face, 1);
    // Second fan triangle (1, 5, 2) of face 1, whose corners start at 4.
    assert_eq!(sample.points, [1, 5, 2]);
    assert_eq!(sample.corners, [4, 6, 7]);
    assert_weights_sum_to_one(sample.weights);
}

#[test]
fn weights_sum_to_one_everywhere() {
    let index = SpatialIndex::build(&two_triangles()).expect("index");
    for &(x, y, z) in &[(-1.0, -1.0, 0.0), (0.3, 0.9, 2.0), (5.0, 0.5, -1.0), (0.5, 0.5, 0.0)] {
        let sample = index.sample(Point3::new(x, y, z)).expect("sample");
        assert_weights_sum_to_one(sample.weights);
        assert!(sample.weights.iter().all(|w| *w >= -1e-12));
    }
}

#[test]
fn degenerate_triangles_anchor_at_first_vertex() {
    let a = Point3::new(0.0, 0.0, 0.0);
    let b = Point3::new(1.0, 0.0, 0.0);
    let c = Point3::new(2.0, 0.0, 0.0);
    let (weights, location) = closest_point_on_triangle(Point3::new(1.0, 1.0, 0.0), a, b, c);
    assert_eq!(weights, [1.0, 0.0, 0.0]);
    assert_eq!(location, a);

    let (weights, location) = closest_point_on_triangle(Point3::new(1.0, 1.0, 0.0), a, a, a);
    assert_eq!(weights, [1.0, 0.0, 0.0]);
    assert_eq!(location, a);
}

#[test]
fn mesh_without_faces_has_no_index() {
    let mesh = Mesh::new(vec![[0.0; 3]], Vec::new());
    assert!(SpatialIndex::build(&mesh).is_none());
    assert!(PointIndex::build(&mesh).is_some());
}

#[test]
fn point_index_finds_nearest_point() {
    let index = PointIndex::build(&two_triangles()).expect("index");
    let (idx, dist) = index.nearest_point(Point3::new(0.9, 1.2, 0.0)).expect("nearest");
    assert_eq!(idx, 2);
    assert!((dist - (0.01f64 + 0.04).sqrt()).abs() < 1e-12);
}

#[test]
fn cache_builds_each_index_once() {
    let mesh = two_triangles();
    let mut cache = SpatialIndexCache::new();
    assert!(cache.face_index("Body", &mesh).is_some());
    assert!(cache.face_index("Body", &mesh).is_some());
    assert!(cache.point_index("Body", &mesh).is_some());

    let stats = cache.stats();
    assert_eq!(stats.face_index_entries, 1);
    assert_eq!(stats.point_index_entries, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);

    cache.clear();
    assert_eq!(cache.stats().face_index_entries, 0);
}
