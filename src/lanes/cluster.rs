// src/lanes/cluster.rs
// Groups raw segments whose slopes are mutually close and fits one
// representative line per group, spanning the full image width.

use log::{debug, warn};
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::geometry::Line;

/// What happens to lines that do not reach `min_cluster_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoisePolicy {
    /// Noise lines are excluded from the output.
    #[default]
    Drop,
    /// Noise lines are emitted unchanged, after the fitted clusters.
    PassThrough,
}

/// Clustering parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Maximum slope difference between neighbouring members of a cluster.
    pub slope_tolerance: f64,
    /// Minimum number of lines within `slope_tolerance` of a line (itself
    /// included) for it to seed a cluster.
    pub min_cluster_size: usize,
    /// Fate of lines left outside every cluster.
    pub noise: NoisePolicy,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            slope_tolerance: 0.1,
            min_cluster_size: 1,
            noise: NoisePolicy::Drop,
        }
    }
}

const NOISE: i32 = -1;
const UNVISITED: i32 = -2;

/// Density-based clustering over the 1-D slope value, followed by a
/// least-squares merge of each cluster.
///
/// Only slope is considered; two parallel but spatially separate lines land
/// in the same cluster.
#[derive(Debug, Clone)]
pub struct SegmentClusterer {
    config: ClusterConfig,
}

impl SegmentClusterer {
    /// Clusterer with fixed parameters.
    pub fn new(config: ClusterConfig) -> Self {
        SegmentClusterer { config }
    }

    /// Assigns a cluster label to every line, or `-1` for noise.
    ///
    /// Labels are numbered in the order their first member appears in `lines`.
    pub fn labels(&self, lines: &[Line]) -> Vec<i32> {
        let slopes: Vec<f64> = lines.iter().map(Line::slope).collect();
        let eps = self.config.slope_tolerance;
        let neighbours = |i: usize| -> Vec<usize> {
            (0..slopes.len())
                .filter(|&j| (slopes[i] - slopes[j]).abs() <= eps)
                .collect()
        };

        let mut labels = vec![UNVISITED; slopes.len()];
        let mut next_label = 0;

        for i in 0..slopes.len() {
            if labels[i] != UNVISITED {
                continue;
            }
            let seeds = neighbours(i);
            if seeds.len() < self.config.min_cluster_size {
                labels[i] = NOISE;
                continue;
            }

            let label = next_label;
            next_label += 1;
            labels[i] = label;

            let mut frontier = seeds;
            while let Some(j) = frontier.pop() {
                if labels[j] == NOISE {
                    // border point
                    labels[j] = label;
                }
                if labels[j] != UNVISITED {
                    continue;
                }
                labels[j] = label;
                let reach = neighbours(j);
                if reach.len() >= self.config.min_cluster_size {
                    frontier.extend(reach);
                }
            }
        }

        labels
    }

    /// Merges colinear segments into one representative line per cluster.
    ///
    /// Returns `None` when a fitted line cannot be drawn inside the pixel range
    /// across the image width.
    pub fn merge(&self, lines: &[Line], width: u32, height: u32) -> Option<Vec<Line>> {
        if lines.is_empty() {
            return Some(Vec::new());
        }

        let labels = self.labels(lines);
        let mut groups: Vec<(i32, Vec<&Line>)> = Vec::new();
        for (line, &label) in lines.iter().zip(&labels) {
            match groups.iter_mut().find(|(l, _)| *l == label) {
                Some((_, members)) => members.push(line),
                None => groups.push((label, vec![line])),
            }
        }

        let mut merged = Vec::with_capacity(groups.len());
        let mut noise = Vec::new();
        for (label, members) in groups {
            if label == NOISE {
                noise.extend(members.into_iter().cloned());
                continue;
            }
            let Some(fitted) = fit_representative(&members, width, height) else {
                warn!("cluster {} fit leaves the pixel range", label);
                return None;
            };
            merged.push(fitted);
        }

        debug!(
            "clustered {} segments into {} lines ({} noise)",
            lines.len(),
            merged.len(),
            noise.len()
        );

        if self.config.noise == NoisePolicy::PassThrough {
            merged.extend(noise);
        }
        Some(merged)
    }
}

/// Least-squares fit `y = a x + b` over every endpoint of `members`, re-drawn
/// from `x = 0` to `x = width`.
fn fit_representative(members: &[&Line], width: u32, height: u32) -> Option<Line> {
    let mut normal = Matrix2::<f64>::zeros();
    let mut rhs = Vector2::<f64>::zeros();
    for line in members {
        let [x1, y1, x2, y2] = line.get_points();
        for (x, y) in [(x1, y1), (x2, y2)] {
            let (x, y) = (f64::from(x), f64::from(y));
            normal += Matrix2::new(x * x, x, x, 1.0);
            rhs += Vector2::new(x * y, y);
        }
    }

    let n = normal[(1, 1)];
    let degenerate = normal.determinant().abs() <= 1e-9 * normal[(0, 0)] * n;
    match normal.lu().solve(&rhs) {
        Some(coeffs) if !degenerate && coeffs.iter().all(|c| c.is_finite()) => {
            let (a, b) = (coeffs[0], coeffs[1]);
            let w = f64::from(width);
            Line::from_points_f64((0.0, b), (w, a * w + b), height)
        }
        _ => {
            // every sample shares one x, so the fit is vertical through the mean x
            let x = normal[(0, 1)] / n;
            Line::from_points_f64((x, 0.0), (x, f64::from(height)), height)
        }
    }
}
