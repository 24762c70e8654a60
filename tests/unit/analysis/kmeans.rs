use super::*;

fn blobs() -> Vec<[f32; 3]> {
    let mut pts = Vec::new();
    for i in 0..60 {
        let j = (i % 5) as f32 * 0.1;
        pts.push([10.0 + j, 0.0, 0.0]);
    }
    for i in 0..30 {
        let j = (i % 3) as f32 * 0.1;
        pts.push([80.0 + j, 20.0, -20.0]);
    }
    for i in 0..10 {
        let j = (i % 2) as f32 * 0.1;
        pts.push([50.0, -40.0 + j, 40.0]);
    }
    pts
}

#[test]
fn separates_well_spaced_blobs_and_ranks_by_population() {
    let fit = fit(&blobs(), KMeansOpts::with_k(3)).unwrap();
    let ranked = fit.ranked();
    assert_eq!(fit.counts[ranked[0]], 60);
    assert_eq!(fit.counts[ranked[1]], 30);
    assert_eq!(fit.counts[ranked[2]], 10);
    assert!((fit.centers[ranked[0]][0] - 10.2).abs() < 0.5);
    assert!((fit.centers[ranked[1]][0] - 80.1).abs() < 0.5);
}

#[test]
fn same_seed_same_result() {
    let pts = blobs();
    let a = fit(&pts, KMeansOpts::with_k(4)).unwrap();
    let b = fit(&pts, KMeansOpts::with_k(4)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn identical_points_do_not_break_seeding() {
    let pts = vec![[42.0f32, 1.0, -1.0]; 16];
    let fit = fit(&pts, KMeansOpts::with_k(5)).unwrap();
    assert_eq!(fit.centers.len(), 5);
    assert_eq!(fit.counts.iter().sum::<usize>(), 16);
    for c in &fit.centers {
        assert_eq!(*c, [42.0, 1.0, -1.0]);
    }
}

#[test]
fn fewer_points_than_clusters_is_allowed() {
    let pts = vec![[0.0f32, 0.0, 0.0], [100.0, 0.0, 0.0]];
    let fit = fit(&pts, KMeansOpts::with_k(5)).unwrap();
    assert_eq!(fit.counts.iter().sum::<usize>(), 2);
}

#[test]
fn rejects_degenerate_inputs() {
    assert!(fit(&[], KMeansOpts::with_k(3)).is_err());
    assert!(fit(&[[0.0, 0.0, 0.0]], KMeansOpts::with_k(0)).is_err());
}

#[test]
fn ranking_breaks_ties_by_index() {
    let fit = KMeansFit {
        centers: vec![[0.0; 3], [1.0; 3], [2.0; 3]],
        counts: vec![5, 7, 5],
        iterations: 1,
    };
    assert_eq!(fit.ranked(), vec![1, 0, 2]);
}

#[test]
fn weighted_seeding_picks_the_far_point() {
    let points = vec![[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [90.0, 10.0, -10.0]];
    for seed in 0..8 {
        let centers = seed_centers(
            &points,
            2,
            &mut StdRng::seed_from_u64(seed),
        );
        assert_eq!(centers.len(), 2);
        assert_ne!(centers[0], centers[1], "seed {seed}");
    }
}
