//! Lloyd's k-means in RGB space with seeded k-means++ initialisation.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::color_space::Rgb;
use crate::error::{PaletteError, Result};

pub const DEFAULT_MAX_ITERATIONS: usize = 20;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansOptions {
    /// Safety bound; well-behaved inputs converge before reaching it.
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for KMeansOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: DEFAULT_SEED,
        }
    }
}

/// Final state of a clustering run.
#[derive(Clone, Debug, PartialEq)]
pub struct Clustering {
    /// Rounded, clamped centroid colors, one per cluster.
    pub centroids: Vec<Rgb>,
    /// Cluster index of every input sample; always `< centroids.len()`.
    pub assignments: Vec<usize>,
    /// Number of samples assigned to each cluster.
    pub populations: Vec<usize>,
    pub iterations: usize,
    /// False when the iteration cap was hit before assignments settled.
    pub converged: bool,
}

type Point = [f64; 3];

#[inline]
fn point(c: Rgb) -> Point {
    [c.r as f64, c.g as f64, c.b as f64]
}

#[inline]
fn dist2(a: &Point, b: &Point) -> f64 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

/// Cluster `samples` into `k` colors and return the centroids.
pub fn cluster(samples: &[Rgb], k: usize, opts: &KMeansOptions) -> Result<Vec<Rgb>> {
    cluster_with_state(samples, k, opts).map(|c| c.centroids)
}

/// Cluster `samples` into `k` colors, keeping assignments and populations.
///
/// Identical `samples`, `k` and `opts.seed` always produce identical output.
pub fn cluster_with_state(samples: &[Rgb], k: usize, opts: &KMeansOptions) -> Result<Clustering> {
    if k < 1 || k > samples.len() {
        return Err(PaletteError::InvalidK { k, samples: samples.len() });
    }

    let points: Vec<Point> = samples.iter().copied().map(point).collect();
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut centroids = init_plus_plus(&points, k, &mut rng);

    let mut assignments = vec![0usize; points.len()];
    assign(&points, &centroids, &mut assignments);

    let mut iterations = 0;
    let mut converged = false;
    while iterations < opts.max_iterations {
        iterations += 1;
        let reseeded = update(&points, &mut centroids, &assignments);
        let changed = assign(&points, &centroids, &mut assignments);
        if !changed && !reseeded {
            converged = true;
            break;
        }
    }
    debug!(
        "k-means k={k} over {} samples: {iterations} iterations, converged={converged}",
        points.len()
    );

    let mut populations = vec![0usize; k];
    for &a in &assignments {
        populations[a] += 1;
    }

    Ok(Clustering {
        centroids: centroids.iter().map(round_centroid).collect(),
        assignments,
        populations,
        iterations,
        converged,
    })
}

fn round_centroid(c: &Point) -> Rgb {
    let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    Rgb::new(channel(c[0]), channel(c[1]), channel(c[2]))
}

/// k-means++: first centroid uniform, the rest weighted by squared distance
/// to the nearest centroid chosen so far.
fn init_plus_plus(points: &[Point], k: usize, rng: &mut StdRng) -> Vec<Point> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..points.len())]);

    let mut nearest: Vec<f64> = points.iter().map(|p| dist2(p, &centroids[0])).collect();
    while centroids.len() < k {
        let total: f64 = nearest.iter().sum();
        let chosen = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut acc = 0.0;
            nearest
                .iter()
                .position(|&d| {
                    acc += d;
                    acc > target
                })
                .unwrap_or_else(|| farthest(&nearest))
        } else {
            // Every point coincides with a centroid already.
            rng.random_range(0..points.len())
        };

        let c = points[chosen];
        for (d, p) in nearest.iter_mut().zip(points) {
            *d = d.min(dist2(p, &c));
        }
        centroids.push(c);
    }
    centroids
}

fn farthest(nearest: &[f64]) -> usize {
    let mut best = 0;
    for (i, &d) in nearest.iter().enumerate() {
        if d > nearest[best] {
            best = i;
        }
    }
    best
}

/// Assign each point to its nearest centroid (ties go to the lower index).
/// Returns whether any assignment changed.
fn assign(points: &[Point], centroids: &[Point], assignments: &mut [usize]) -> bool {
    let mut changed = false;
    for (p, slot) in points.iter().zip(assignments.iter_mut()) {
        let mut best = 0;
        let mut best_d = f64::INFINITY;
        for (i, c) in centroids.iter().enumerate() {
            let d = dist2(p, c);
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        if *slot != best {
            *slot = best;
            changed = true;
        }
    }
    changed
}

/// Move every centroid to the mean of its members. Empty clusters are
/// re-seeded from the point farthest from all current centroids.
/// Returns whether any centroid had to be re-seeded.
fn update(points: &[Point], centroids: &mut [Point], assignments: &[usize]) -> bool {
    let k = centroids.len();
    let mut sums = vec![[0.0f64; 3]; k];
    let mut counts = vec![0usize; k];
    for (p, &a) in points.iter().zip(assignments) {
        sums[a][0] += p[0];
        sums[a][1] += p[1];
        sums[a][2] += p[2];
        counts[a] += 1;
    }

    let mut empty = Vec::new();
    for i in 0..k {
        if counts[i] == 0 {
            empty.push(i);
        } else {
            let n = counts[i] as f64;
            centroids[i] = [sums[i][0] / n, sums[i][1] / n, sums[i][2] / n];
        }
    }

    let mut reseeded = false;
    for i in empty {
        let nearest: Vec<f64> = points
            .iter()
            .map(|p| centroids.iter().map(|c| dist2(p, c)).fold(f64::INFINITY, f64::min))
            .collect();
        let idx = farthest(&nearest);
        if nearest[idx] > 0.0 {
            debug!("re-seeding empty cluster {i} from sample {idx}");
            centroids[i] = points[idx];
            reseeded = true;
        }
    }
    reseeded
}
