//! Integration tests exercising `Supercluster` end to end, over synthetic
//! point sets (a tuple `(lon, lat)` is the point type throughout).

use geocluster::{lat_to_y, lng_to_x, Supercluster, SuperclusterError};

type Point = (f64, f64);

fn get_x(p: &Point) -> Option<f64> {
    Some(p.0)
}

fn get_y(p: &Point) -> Option<f64> {
    Some(p.1)
}

fn default_cluster() -> Supercluster<Point> {
    Supercluster::new(Supercluster::<Point>::builder().build())
}

#[test]
fn s1_nearby_pair_merges_far_point_stays_separate_until_zoomed_out() {
    let mut cluster = default_cluster();
    cluster
        .load(vec![(0.0, 0.0), (0.0001, 0.0001), (90.0, 45.0)], get_x, get_y)
        .unwrap();

    let fine = &cluster.trees[&16].nodes;
    assert_eq!(fine.len(), 2);

    let pair = fine.iter().find(|n| n.is_cluster()).unwrap();
    assert_eq!(pair.num_points(), 2);
    assert!((pair.x - lng_to_x(0.00005)).abs() < 1e-6);
    assert!((pair.y - lat_to_y(0.00005)).abs() < 1e-6);

    let coarse = &cluster.trees[&0].nodes;
    assert_eq!(coarse.len(), 1);
    assert_eq!(coarse[0].num_points(), 3);
}

#[test]
fn s2_single_point_never_clusters() {
    let mut cluster = default_cluster();
    cluster.load(vec![(10.0, 10.0)], get_x, get_y).unwrap();

    for zoom in 0..=17 {
        let tree = &cluster.trees[&zoom];
        assert_eq!(tree.nodes.len(), 1);
        assert!(!tree.nodes[0].is_cluster());
    }
}

#[test]
fn s3_many_coincident_points_merge_and_leaves_paginate() {
    let mut cluster = default_cluster();
    let points: Vec<Point> = (0..100).map(|i| (1e-6 * i as f64, 1e-6 * i as f64)).collect();
    cluster.load(points, get_x, get_y).unwrap();

    let fine = &cluster.trees[&16].nodes;
    assert_eq!(fine.len(), 1);
    assert_eq!(fine[0].num_points(), 100);

    let id = fine[0].cluster_id().unwrap();

    let page = cluster.get_leaves(id, 10, 0);
    assert_eq!(page.len(), 10);

    let tail = cluster.get_leaves(id, 10, 95);
    assert_eq!(tail.len(), 5);

    let all = cluster.get_leaves(id, usize::MAX, 0);
    assert_eq!(all.len(), 100);
}

#[test]
fn s4_antimeridian_pair_found_by_split_viewport() {
    let mut cluster = default_cluster();
    cluster
        .load(vec![(-179.0, 0.0), (179.0, 0.0)], get_x, get_y)
        .unwrap();

    let results = cluster
        .get_clusters_and_points(170.0, -10.0, -170.0, 10.0, 0.0)
        .unwrap();

    assert_eq!(results.len(), 2);
}

#[test]
fn s5_missing_coordinate_point_is_dropped_and_shrinks_id_space() {
    let mut cluster: Supercluster<Option<Point>> =
        Supercluster::new(Supercluster::<Option<Point>>::builder().build());

    let points = vec![Some((0.0, 0.0)), None, Some((1.0, 1.0))];
    cluster
        .load(
            points,
            |p: &Option<Point>| p.map(|(x, _)| x),
            |p: &Option<Point>| p.map(|(_, y)| y),
        )
        .unwrap();

    let leaves = &cluster.trees[&17].nodes;
    assert_eq!(leaves.len(), 2);
}

#[test]
fn s6_fabricated_id_is_not_found() {
    let mut cluster = default_cluster();
    cluster.load(vec![(0.0, 0.0), (0.0, 0.0)], get_x, get_y).unwrap();

    let fabricated = 9_999_999usize;
    let result = cluster.get_children(fabricated);

    assert!(matches!(
        result,
        Err(SuperclusterError::TreeNotFound) | Err(SuperclusterError::ClusterNotFound)
    ));
}

#[test]
fn invariant_num_points_conserved_across_zooms() {
    let mut cluster = default_cluster();
    let points: Vec<Point> = (0..50)
        .map(|i| (((i % 10) as f64) * 0.5, ((i / 10) as f64) * 0.5))
        .collect();
    let n = points.len();
    cluster.load(points, get_x, get_y).unwrap();

    for zoom in 0..=17 {
        let total: usize = cluster.trees[&zoom].nodes.iter().map(|n| n.num_points()).sum();
        assert_eq!(total, n, "zoom {zoom} lost or gained points");
    }
}

#[test]
fn invariant_children_sum_and_centroid_match_parent() {
    let mut cluster = default_cluster();
    cluster
        .load(
            vec![(0.0, 0.0), (0.0, 0.0001), (0.0001, 0.0), (0.0001, 0.0001)],
            get_x,
            get_y,
        )
        .unwrap();

    let root = &cluster.trees[&0].nodes[0];
    assert!(root.is_cluster());

    let children = cluster.get_children(root.cluster_id().unwrap()).unwrap();
    let child_sum: usize = children.iter().map(|c| c.num_points()).sum();
    assert_eq!(child_sum, root.num_points());

    let wx: f64 = children.iter().map(|c| c.x * c.num_points() as f64).sum();
    let wy: f64 = children.iter().map(|c| c.y * c.num_points() as f64).sum();
    let n = root.num_points() as f64;

    assert!((wx / n - root.x).abs() < 1e-12);
    assert!((wy / n - root.y).abs() < 1e-12);
}

#[test]
fn invariant_full_globe_query_matches_clamped_tree() {
    let mut cluster = default_cluster();
    cluster
        .load(
            vec![(-170.0, 10.0), (10.0, 20.0), (170.0, -10.0)],
            get_x,
            get_y,
        )
        .unwrap();

    for zoom in [0.0, 5.0, 17.0, 100.0] {
        let results = cluster.get_clusters_and_points(-180.0, -90.0, 180.0, 90.0, zoom).unwrap();
        let expected = cluster.trees[&cluster.limit_zoom(zoom)].nodes.len();
        assert_eq!(results.len(), expected);
    }
}

#[test]
fn invariant_wraparound_viewport_equals_full_globe() {
    let mut cluster = default_cluster();
    cluster
        .load(vec![(-170.0, 10.0), (10.0, 20.0), (170.0, -10.0)], get_x, get_y)
        .unwrap();

    let west = -47.0;
    let wrapped = cluster
        .get_clusters_and_points(west, -90.0, west + 360.0, 90.0, 3.0)
        .unwrap();
    let full_globe = cluster.get_clusters_and_points(-180.0, -90.0, 180.0, 90.0, 3.0).unwrap();

    assert_eq!(wrapped.len(), full_globe.len());
}

#[test]
fn invariant_cluster_expansion_zoom_is_bounded() {
    let mut cluster = default_cluster();
    let points: Vec<Point> = (0..20).map(|i| (1e-6 * i as f64, 1e-6 * i as f64)).collect();
    cluster.load(points, get_x, get_y).unwrap();

    let root = &cluster.trees[&0].nodes[0];
    let id = root.cluster_id().unwrap();
    let origin_zoom = cluster.origin_zoom(id);

    let expansion_zoom = cluster.get_cluster_expansion_zoom(id);

    assert!(expansion_zoom + 1 >= origin_zoom);
    assert!(expansion_zoom <= 17);
}

#[test]
fn cluster_expansion_zoom_equals_origin_zoom_when_it_breaks_apart_immediately() {
    let mut cluster = default_cluster();
    let points: Vec<Point> = (0..100).map(|i| (1e-6 * i as f64, 1e-6 * i as f64)).collect();
    cluster.load(points, get_x, get_y).unwrap();

    let fine = &cluster.trees[&16].nodes;
    assert_eq!(fine.len(), 1);

    let id = fine[0].cluster_id().unwrap();
    assert_eq!(cluster.origin_zoom(id), 17);

    // The cluster is still whole at its own origin zoom and only splits
    // into its 100 individual leaves once the leaf-only tree (zoom 17) is
    // reached, so the expansion zoom is 17, not 16.
    assert_eq!(cluster.get_cluster_expansion_zoom(id), 17);
}

#[test]
fn invariant_viewport_results_are_inside_the_projected_rectangle() {
    let mut cluster = default_cluster();
    let points: Vec<Point> = (0..30)
        .map(|i| (((i % 6) as f64) * 10.0 - 25.0, ((i / 6) as f64) * 10.0 - 25.0))
        .collect();
    cluster.load(points, get_x, get_y).unwrap();

    let (west, south, east, north) = (-30.0, -30.0, 30.0, 30.0);
    let results = cluster
        .get_clusters_and_points(west, south, east, north, 10.0)
        .unwrap();

    let (min_x, max_x) = (lng_to_x(west), lng_to_x(east));
    let (min_y, max_y) = (lat_to_y(north), lat_to_y(south));

    for node in results {
        assert!(node.x >= min_x - 1e-12 && node.x <= max_x + 1e-12);
        assert!(node.y >= min_y - 1e-12 && node.y <= max_y + 1e-12);
    }
}
