//! Density-based clustering of the synthetic pickup coordinates.
//!
//! Coordinates are standardized over the whole dataset, then labeled with
//! DBSCAN. Labels are computed once at startup and never change afterwards.
//!
//! Border points reachable from more than one cluster keep the first cluster
//! that reaches them. Scanning follows record order, so permuting the input
//! can move such a point to a different cluster. Core points and noise are
//! unaffected by ordering.

use log::{debug, warn};
use rstar::primitives::GeomWithData;
use rstar::RTree;
use serde::Serialize;

use super::model::NOISE;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

// ---------------------------------------------------------------------------
// Standardization
// ---------------------------------------------------------------------------

/// Per-dimension mean and scale fitted over a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standardizer {
    pub mean: [f64; 2],
    /// Population standard deviation; a dimension without spread keeps 1.0.
    pub scale: [f64; 2],
    spread: [bool; 2],
}

impl Standardizer {
    pub fn fit(points: &[[f64; 2]]) -> Self {
        if points.is_empty() {
            return Standardizer {
                mean: [0.0; 2],
                scale: [1.0; 2],
                spread: [false; 2],
            };
        }
        let n = points.len() as f64;
        let mut mean = [0.0; 2];
        let mut scale = [1.0; 2];
        let mut spread = [false; 2];
        for d in 0..2 {
            mean[d] = points.iter().map(|p| p[d]).sum::<f64>() / n;
            let var = points.iter().map(|p| (p[d] - mean[d]).powi(2)).sum::<f64>() / n;
            spread[d] = points.iter().any(|p| p[d] != points[0][d]);
            if spread[d] && var > 0.0 {
                scale[d] = var.sqrt();
            }
        }
        Standardizer {
            mean,
            scale,
            spread,
        }
    }

    pub fn transform(&self, p: [f64; 2]) -> [f64; 2] {
        [
            (p[0] - self.mean[0]) / self.scale[0],
            (p[1] - self.mean[1]) / self.scale[1],
        ]
    }

    /// True when every fitted point was identical.
    pub fn is_degenerate(&self) -> bool {
        !self.spread.iter().any(|s| *s)
    }
}

// ---------------------------------------------------------------------------
// DBSCAN
// ---------------------------------------------------------------------------

/// Outcome counts of one clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ClusterSummary {
    pub clusters: usize,
    pub noise: usize,
}

impl ClusterSummary {
    pub fn from_labels(labels: &[i32]) -> Self {
        let clusters = labels
            .iter()
            .copied()
            .max()
            .map_or(0, |max| (max + 1).max(0) as usize);
        let noise = labels.iter().filter(|l| **l == NOISE).count();
        ClusterSummary { clusters, noise }
    }
}

/// Standardize `(lat, lon)` pairs and label them with DBSCAN.
///
/// The returned labels are parallel to `coords`. Identical points, or fewer
/// than `min_samples` points, come back as all noise.
pub fn cluster_coordinates(coords: &[[f64; 2]], eps: f64, min_samples: usize) -> Vec<i32> {
    let scaler = Standardizer::fit(coords);
    if scaler.is_degenerate() {
        if !coords.is_empty() {
            warn!(
                "all {} coordinates are identical; labeling everything as noise",
                coords.len()
            );
        }
        return vec![NOISE; coords.len()];
    }
    debug!(
        "standardized coordinates: mean={:?} scale={:?}",
        scaler.mean, scaler.scale
    );
    let scaled: Vec<[f64; 2]> = coords.iter().map(|p| scaler.transform(*p)).collect();
    dbscan(&scaled, eps, min_samples)
}

/// Plain DBSCAN over already-scaled points.
///
/// A point is core when at least `min_samples` points, itself included, lie
/// within Euclidean distance `eps`. Cluster ids are assigned in the order
/// their first core point appears in `points`.
pub fn dbscan(points: &[[f64; 2]], eps: f64, min_samples: usize) -> Vec<i32> {
    let n = points.len();
    let mut labels = vec![NOISE; n];
    if n == 0 || n < min_samples {
        return labels;
    }

    let tree: RTree<IndexedPoint> = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new(*p, i))
            .collect(),
    );
    let eps2 = eps * eps;

    let is_core: Vec<bool> = points
        .iter()
        .map(|p| tree.locate_within_distance(*p, eps2).count() >= min_samples)
        .collect();

    let neighbours = |i: usize| -> Vec<usize> {
        let mut found: Vec<usize> = tree
            .locate_within_distance(points[i], eps2)
            .map(|g| g.data)
            .collect();
        found.sort_unstable();
        found
    };

    let mut next_label = 0i32;
    let mut stack: Vec<usize> = Vec::new();

    for seed in 0..n {
        if labels[seed] != NOISE || !is_core[seed] {
            continue;
        }
        let mut i = seed;
        loop {
            if labels[i] == NOISE {
                labels[i] = next_label;
                if is_core[i] {
                    stack.extend(neighbours(i).into_iter().filter(|&v| labels[v] == NOISE));
                }
            }
            match stack.pop() {
                Some(j) => i = j,
                None => break,
            }
        }
        next_label += 1;
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(cx: f64, cy: f64, n: usize, step: f64) -> Vec<[f64; 2]> {
        (0..n)
            .map(|i| [cx + (i % 4) as f64 * step, cy + (i / 4) as f64 * step])
            .collect()
    }

    #[test]
    fn standardizer_centres_and_scales() {
        let s = Standardizer::fit(&[[0.0, 10.0], [2.0, 10.0]]);
        assert_eq!(s.mean, [1.0, 10.0]);
        assert_eq!(s.scale, [1.0, 1.0]);
        assert!(!s.is_degenerate());
        assert_eq!(s.transform([2.0, 10.0]), [1.0, 0.0]);
    }

    #[test]
    fn two_separated_blobs() {
        let mut pts = blob(0.0, 0.0, 12, 0.1);
        pts.extend(blob(10.0, 10.0, 12, 0.1));
        let labels = dbscan(&pts, 0.5, 3);
        assert!(labels[..12].iter().all(|l| *l == 0));
        assert!(labels[12..].iter().all(|l| *l == 1));
        assert_eq!(
            ClusterSummary::from_labels(&labels),
            ClusterSummary { clusters: 2, noise: 0 }
        );
    }

    #[test]
    fn isolated_point_is_noise() {
        let mut pts = blob(0.0, 0.0, 8, 0.1);
        pts.push([50.0, 50.0]);
        let labels = dbscan(&pts, 0.5, 3);
        assert_eq!(labels[8], NOISE);
        assert!(labels[..8].iter().all(|l| *l == 0));
    }

    #[test]
    fn far_apart_points_are_all_noise() {
        let pts: Vec<[f64; 2]> = (0..20).map(|i| [i as f64 * 10.0, 0.0]).collect();
        let labels = dbscan(&pts, 1.0, 2);
        assert!(labels.iter().all(|l| *l == NOISE));
    }

    #[test]
    fn border_point_joins_cluster() {
        // A dense column with one point just inside eps of its end.
        let mut pts: Vec<[f64; 2]> = (0..5).map(|i| [0.0, i as f64 * 0.1]).collect();
        pts.push([0.0, 0.4 + 0.25]);
        let labels = dbscan(&pts, 0.3, 4);
        assert_eq!(labels[5], 0);
    }

    #[test]
    fn radius_is_inclusive() {
        let pts = vec![[0.0, 0.0], [1.0, 0.0]];
        assert_eq!(dbscan(&pts, 1.0, 2), vec![0, 0]);
    }

    #[test]
    fn fewer_points_than_min_samples() {
        let pts = blob(0.0, 0.0, 3, 0.01);
        assert_eq!(dbscan(&pts, 1.0, 4), vec![NOISE; 3]);
    }

    #[test]
    fn identical_coordinates_are_noise() {
        let coords = vec![[40.7, -74.0]; 100];
        let labels = cluster_coordinates(&coords, 0.15, 10);
        assert!(labels.iter().all(|l| *l == NOISE));
    }

    #[test]
    fn empty_input() {
        assert!(cluster_coordinates(&[], 0.15, 40).is_empty());
        assert_eq!(ClusterSummary::from_labels(&[]), ClusterSummary::default());
    }
}
