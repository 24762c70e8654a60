use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::foundation::error::{FmiError, FmiResult};

/// Parameters for a single k-means run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KMeansOpts {
    /// Number of clusters.
    pub k: usize,
    /// Upper bound on Lloyd iterations.
    pub max_iter: usize,
    /// Relative tolerance on total squared center movement, scaled by mean data variance.
    pub tol: f64,
    /// Seed for k-means++ center selection.
    pub seed: u64,
}

impl KMeansOpts {
    pub fn with_k(k: usize) -> Self {
        Self {
            k,
            max_iter: 300,
            tol: 1e-3,
            seed: 42,
        }
    }
}

/// Result of a k-means run: final centers and how many points each one owns.
#[derive(Clone, Debug, PartialEq)]
pub struct KMeansFit {
    pub centers: Vec<[f64; 3]>,
    pub counts: Vec<usize>,
    pub iterations: usize,
}

impl KMeansFit {
    /// Center indices ordered by descending population; ties keep the lower index first.
    pub fn ranked(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.centers.len()).collect();
        order.sort_by(|&a, &b| self.counts[b].cmp(&self.counts[a]).then(a.cmp(&b)));
        order
    }
}

fn dist2(p: &[f32; 3], c: &[f64; 3]) -> f64 {
    let d0 = f64::from(p[0]) - c[0];
    let d1 = f64::from(p[1]) - c[1];
    let d2 = f64::from(p[2]) - c[2];
    d0 * d0 + d1 * d1 + d2 * d2
}

fn to_f64(p: &[f32; 3]) -> [f64; 3] {
    [f64::from(p[0]), f64::from(p[1]), f64::from(p[2])]
}

fn nearest(p: &[f32; 3], centers: &[[f64; 3]]) -> usize {
    let mut best = 0usize;
    let mut best_d = f64::INFINITY;
    for (i, c) in centers.iter().enumerate() {
        let d = dist2(p, c);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

fn mean_variance(points: &[[f32; 3]]) -> f64 {
    let n = points.len() as f64;
    let mut sum = [0f64; 3];
    let mut sum_sq = [0f64; 3];
    for p in points {
        for d in 0..3 {
            let v = f64::from(p[d]);
            sum[d] += v;
            sum_sq[d] += v * v;
        }
    }
    let mut var = 0.0;
    for d in 0..3 {
        let mean = sum[d] / n;
        var += (sum_sq[d] / n - mean * mean).max(0.0);
    }
    var / 3.0
}

fn seed_centers(points: &[[f32; 3]], k: usize, rng: &mut StdRng) -> Vec<[f64; 3]> {
    let mut centers = Vec::with_capacity(k);
    centers.push(to_f64(&points[rng.gen_range(0..points.len())]));

    let mut closest: Vec<f64> = points.iter().map(|p| dist2(p, &centers[0])).collect();
    while centers.len() < k {
        let total: f64 = closest.iter().sum();
        let pick = if total > 0.0 {
            let target = rng.gen_range(0.0..1.0_f64) * total;
            let mut acc = 0.0;
            let mut chosen = points.len() - 1;
            for (i, d) in closest.iter().enumerate() {
                acc += d;
                if acc >= target && *d > 0.0 {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            // Every point already coincides with a center.
            rng.gen_range(0..points.len())
        };

        let c = to_f64(&points[pick]);
        for (d, p) in closest.iter_mut().zip(points) {
            *d = d.min(dist2(p, &c));
        }
        centers.push(c);
    }
    centers
}

/// Partition `points` into `opts.k` clusters with Lloyd's algorithm and k-means++ seeding.
///
/// The run is fully determined by `points` and `opts`.
pub fn fit(points: &[[f32; 3]], opts: KMeansOpts) -> FmiResult<KMeansFit> {
    if opts.k == 0 {
        return Err(FmiError::validation("k-means needs at least one cluster"));
    }
    if points.is_empty() {
        return Err(FmiError::validation("k-means needs at least one point"));
    }

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut centers = seed_centers(points, opts.k, &mut rng);
    let tol_abs = opts.tol * mean_variance(points);

    let mut labels = vec![0usize; points.len()];
    let mut iterations = 0usize;
    for _ in 0..opts.max_iter {
        iterations += 1;
        for (label, p) in labels.iter_mut().zip(points) {
            *label = nearest(p, &centers);
        }

        let mut sums = vec![[0f64; 3]; opts.k];
        let mut counts = vec![0usize; opts.k];
        for (label, p) in labels.iter().zip(points) {
            counts[*label] += 1;
            for d in 0..3 {
                sums[*label][d] += f64::from(p[d]);
            }
        }

        let mut shift = 0.0;
        for (i, center) in centers.iter_mut().enumerate() {
            if counts[i] == 0 {
                continue;
            }
            let n = counts[i] as f64;
            let next = [sums[i][0] / n, sums[i][1] / n, sums[i][2] / n];
            shift += (0..3).map(|d| (next[d] - center[d]).powi(2)).sum::<f64>();
            *center = next;
        }

        if shift <= tol_abs {
            break;
        }
    }

    let mut counts = vec![0usize; opts.k];
    for p in points {
        counts[nearest(p, &centers)] += 1;
    }

    tracing::trace!(k = opts.k, iterations, "k-means converged");
    Ok(KMeansFit {
        centers,
        counts,
        iterations,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/analysis/kmeans.rs"]
mod tests;
