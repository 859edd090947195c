use clusterkit::{
    Clustering, ClusterError, Dbscan, DbscanPp, DistanceMetric, Hdbscan, KdTree, Kmeans, Point,
};
use std::collections::HashSet;

#[test]
fn hdbscan_cluster() {
    let data = cluster_test_data();
    let clusterer = Hdbscan::default_params();
    let result = clusterer.fit(&data).unwrap();
    // Two dense groups of five points each
    assert_eq!(2, result.len());
    assert!(result.iter().all(|c| c.size() == 5));
    // First five points form one cluster, next five the other
    let member_sets: Vec<HashSet<usize>> = result
        .iter()
        .map(|c| c.members().iter().copied().collect())
        .collect();
    assert!(member_sets.contains(&(0..5).collect()));
    assert!(member_sets.contains(&(5..10).collect()));
    // The final point is noise and belongs to neither
    assert!(member_sets.iter().all(|s| !s.contains(&10)));
}

#[test]
fn hdbscan_single_cluster() {
    let data: Vec<Point<f64, 2>> = vec![
        [1.1, 1.1],
        [1.2, 1.1],
        [1.3, 1.2],
        [1.1, 1.3],
        [1.2, 1.2],
    ]
    .into_iter()
    .map(Point::from)
    .collect();

    // One dense group only: without allow_single_cluster the root is
    // never extracted, so everything is noise
    let clusterer = Hdbscan::new(4).unwrap();
    let result = clusterer.fit(&data).unwrap();
    assert!(result.is_empty());

    let clusterer = Hdbscan::new(4).unwrap().with_allow_single_cluster(true);
    let result = clusterer.fit(&data).unwrap();
    assert_eq!(1, result.len());
    assert_eq!(5, result[0].size());
}

#[test]
fn hdbscan_labels() {
    let data = cluster_test_data();
    let labels = Hdbscan::default_params().fit_labels(&data).unwrap();
    assert_eq!(data.len(), labels.len());
    // Labels agree within each group and the outlier carries none
    assert_eq!(1, labels[..5].iter().collect::<HashSet<_>>().len());
    assert_eq!(1, labels[5..10].iter().collect::<HashSet<_>>().len());
    assert!(labels[..10].iter().all(|l| l.is_some()));
    assert_eq!(None, labels[10]);
}

#[test]
fn kmeans_cluster() {
    let data = cluster_test_data();
    let clusterer = Kmeans::new(2).unwrap().with_seed(42);
    let result = clusterer.fit(&data).unwrap();
    assert_eq!(2, result.len());
    // Every point is assigned, including the outlier
    let assigned: usize = result.iter().map(|c| c.size()).sum();
    assert_eq!(data.len(), assigned);
    // The two tight groups never straddle a boundary
    let member_sets: Vec<HashSet<usize>> = result
        .iter()
        .map(|c| c.members().iter().copied().collect())
        .collect();
    for group in [0..5, 5..10] {
        let indices: HashSet<usize> = group.collect();
        assert!(member_sets.iter().any(|s| indices.is_subset(s)));
    }
}

#[test]
fn kmeans_seeded_runs_are_identical() {
    let data = cluster_test_data();
    let fit = |seed| {
        Kmeans::new(3)
            .unwrap()
            .with_seed(seed)
            .fit(&data)
            .unwrap()
            .iter()
            .map(|c| c.members().to_vec())
            .collect::<Vec<_>>()
    };
    assert_eq!(fit(7), fit(7));
}

#[test]
fn dbscan_cluster() {
    let data = cluster_test_data();
    let clusterer = Dbscan::new(0.9, 3).unwrap();
    let result = clusterer.fit(&data).unwrap();
    assert_eq!(2, result.len());
    assert!(result.iter().all(|c| c.size() == 5));
    let labels = clusterer.fit_labels(&data).unwrap();
    assert_eq!(None, labels[10]);
}

#[test]
fn dbscan_pp_full_sample_matches_dbscan() {
    let data = cluster_test_data();
    let exact = Dbscan::new(0.9, 3).unwrap().fit_labels(&data).unwrap();
    // probability 1.0 tests every point as a core candidate
    let approx = DbscanPp::new(0.9, 3, 1.0).unwrap().fit_labels(&data).unwrap();
    assert_eq!(exact.len(), approx.len());
    for (a, b) in exact.iter().zip(approx.iter()) {
        assert_eq!(a.is_some(), b.is_some());
    }
}

#[test]
fn dbscan_pp_subsampled_cluster() {
    let data = cluster_test_data();
    // Probability 0.5 tests every second point as a core candidate.
    // Both dense groups still contain sampled cores, so the clustering
    // matches the exact one on this data.
    let clusterer = DbscanPp::new(0.9, 3, 0.5).unwrap();
    let labels = clusterer.fit_labels(&data).unwrap();
    assert!(labels[10].is_none());
    let clusters = clusterer.fit(&data).unwrap();
    assert_eq!(2, clusters.len());
    assert!(clusters.iter().all(|c| c.size() == 5));
}

#[test]
fn empty_data() {
    let data: Vec<Point<f64, 2>> = Vec::new();
    assert!(Kmeans::new(2).unwrap().fit(&data).unwrap().is_empty());
    assert!(Dbscan::new(1.0, 3).unwrap().fit(&data).unwrap().is_empty());
    assert!(DbscanPp::new(1.0, 3, 0.5).unwrap().fit(&data).unwrap().is_empty());
    assert!(Hdbscan::default_params().fit(&data).unwrap().is_empty());
}

#[test]
fn non_finite_coordinate() {
    let data: Vec<Point<f64, 2>> = vec![
        Point::new([1.0, 1.0]),
        Point::new([1.1, f64::NAN]),
        Point::new([1.2, 1.1]),
        Point::new([0.9, 1.0]),
        Point::new([1.0, 1.2]),
    ];
    let result = Dbscan::new(1.0, 2).unwrap().fit(&data);
    assert!(matches!(result, Err(ClusterError::NonFiniteCoordinate(_))));
    let result = Hdbscan::new(2).unwrap().fit(&data);
    assert!(matches!(result, Err(ClusterError::NonFiniteCoordinate(_))));
}

#[test]
fn invalid_parameters() {
    assert!(Kmeans::<f64>::new(0).is_err());
    assert!(Dbscan::new(0.0, 3).is_err());
    assert!(Dbscan::new(f64::NAN, 3).is_err());
    assert!(Dbscan::new(1.0, 0).is_err());
    assert!(DbscanPp::new(1.0, 3, 0.0).is_err());
    assert!(DbscanPp::new(1.0, 3, 1.5).is_err());
    assert!(Hdbscan::new(1).is_err());
}

#[test]
fn kdtree_queries_end_to_end() {
    let data = cluster_test_data();
    let tree = KdTree::build(&data, DistanceMetric::Euclidean).unwrap();

    let query = Point::new([1.0, 1.0]);
    // Indices 1 and 4 are equidistant from the query
    let nearest = tree.nearest(&query).unwrap();
    assert!(nearest.index == 1 || nearest.index == 4);
    assert!((nearest.distance.get() - 0.1).abs() < 1e-9);

    let neighbours = tree.nearest_k(&query, 5).unwrap();
    assert_eq!(5, neighbours.len());
    // Results come back nearest first
    for pair in neighbours.windows(2) {
        assert!(pair[0].distance.get() <= pair[1].distance.get());
    }
    // All five must come from the first dense group
    assert!(neighbours.iter().all(|n| n.index < 5));

    let in_range = tree.within_radius(&query, 1.5).unwrap();
    let found: HashSet<usize> = in_range.iter().map(|n| n.index).collect();
    assert_eq!((0..5).collect::<HashSet<usize>>(), found);
}

#[test]
fn five_dimensional_colour_points() {
    // LAB channels plus normalised pixel coordinates
    let data: Vec<Point<f32, 5>> = vec![
        [0.52, 0.10, 0.10, 0.20, 0.20],
        [0.50, 0.11, 0.10, 0.22, 0.21],
        [0.51, 0.10, 0.11, 0.21, 0.23],
        [0.53, 0.12, 0.10, 0.20, 0.22],
        [0.50, 0.10, 0.12, 0.23, 0.20],
        [0.10, 0.80, 0.40, 0.80, 0.78],
        [0.11, 0.82, 0.41, 0.81, 0.80],
        [0.12, 0.80, 0.42, 0.79, 0.81],
        [0.10, 0.81, 0.40, 0.80, 0.79],
        [0.11, 0.80, 0.41, 0.82, 0.80],
    ]
    .into_iter()
    .map(Point::from)
    .collect();

    let result = Hdbscan::new(4).unwrap().fit(&data).unwrap();
    assert_eq!(2, result.len());
    assert!(result.iter().all(|c| c.size() == 5));

    let result = Kmeans::new(2).unwrap().with_seed(1).fit(&data).unwrap();
    assert_eq!(2, result.len());
    assert!(result.iter().all(|c| c.size() == 5));
}

#[test]
fn centroids_sit_inside_their_cluster() {
    let data = cluster_test_data();
    let result = Dbscan::new(0.9, 3).unwrap().fit(&data).unwrap();
    for cluster in &result {
        let centroid = cluster.centroid();
        for axis in 0..2 {
            let lo = cluster
                .members()
                .iter()
                .map(|&i| data[i][axis])
                .fold(f64::INFINITY, f64::min);
            let hi = cluster
                .members()
                .iter()
                .map(|&i| data[i][axis])
                .fold(f64::NEG_INFINITY, f64::max);
            assert!(lo <= centroid[axis] && centroid[axis] <= hi);
        }
    }
}

fn cluster_test_data() -> Vec<Point<f64, 2>> {
    vec![
        [1.5, 2.2],
        [1.0, 1.1],
        [1.2, 1.4],
        [0.8, 1.0],
        [1.1, 1.0],
        [3.7, 4.0],
        [3.9, 3.9],
        [3.6, 4.1],
        [3.8, 3.9],
        [4.0, 4.1],
        [10.0, 10.0],
    ]
    .into_iter()
    .map(Point::from)
    .collect()
}
