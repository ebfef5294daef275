// src/lanes/pairing.rs
// Greedy single pass over intercept-sorted lines, pairing neighbours into
// lanes by slope symmetry or by parallel slopes on one side of the image.

use log::debug;
use serde::{Deserialize, Serialize};

use super::Lane;
use crate::geometry::Line;

/// Tolerances for the two pairing rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Relative tolerance for `slope_a ≈ -slope_b` (mirrored boundaries).
    pub center_lane_tol: f64,
    /// Relative tolerance for `slope_a ≈ slope_b` (parallel boundaries).
    pub parallel_tol: f64,
    /// Max intercept distance (px) between parallel boundaries.
    pub x_intercept_tol: f64,
}

impl Default for PairingConfig {
    fn default() -> Self {
        PairingConfig {
            center_lane_tol: 0.5,
            parallel_tol: 0.5,
            x_intercept_tol: 250.0,
        }
    }
}

/// Which rule matched a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRule {
    /// Near-mirror slopes converging toward the image center.
    CenterLane,
    /// Near-parallel slopes, close intercepts, same side of center.
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Scanning(usize),
    PairFound(usize),
}

/// Pairs merged lines into lanes.
#[derive(Debug, Clone)]
pub struct LanePairer {
    config: PairingConfig,
}

impl LanePairer {
    /// Pairer with fixed tolerances.
    pub fn new(config: PairingConfig) -> Self {
        LanePairer { config }
    }

    /// Checks the adjacent pair `(a, b)` against both rules, mirror rule first.
    pub fn match_rule(&self, a: &Line, b: &Line, center: f64) -> Option<PairRule> {
        if is_close(a.slope(), -b.slope(), self.config.center_lane_tol) {
            return Some(PairRule::CenterLane);
        }

        let parallel = is_close(a.slope(), b.slope(), self.config.parallel_tol);
        let close = (a.x_intercept() - b.x_intercept()).abs() <= self.config.x_intercept_tol;
        let same_side = (a.x_intercept() > center && b.x_intercept() > center)
            || (a.x_intercept() < center && b.x_intercept() < center);
        if parallel && close && same_side {
            Some(PairRule::Parallel)
        } else {
            None
        }
    }

    /// Sorts `lines` by x-intercept and partitions adjacent neighbours into lanes.
    ///
    /// Each line lands in at most one lane; the first matching pair wins and
    /// lanes come out in ascending intercept order. Consumed lines have their
    /// `paired` flag set.
    pub fn pair(&self, mut lines: Vec<Line>, width: u32) -> Vec<Lane> {
        lines.sort_by(|a, b| a.x_intercept().total_cmp(&b.x_intercept()));
        let center = f64::from(width) / 2.0;

        let mut pairs = Vec::new();
        let mut state = ScanState::Scanning(0);
        loop {
            state = match state {
                ScanState::Scanning(i) if i + 1 < lines.len() => {
                    match self.match_rule(&lines[i], &lines[i + 1], center) {
                        Some(rule) => {
                            debug!(
                                "paired lines at x={} and x={} ({:?})",
                                lines[i].x_intercept(),
                                lines[i + 1].x_intercept(),
                                rule
                            );
                            ScanState::PairFound(i)
                        }
                        None => ScanState::Scanning(i + 1),
                    }
                }
                ScanState::Scanning(_) => break,
                ScanState::PairFound(i) => {
                    lines[i].set_paired();
                    lines[i + 1].set_paired();
                    pairs.push(i);
                    ScanState::Scanning(i + 2)
                }
            };
        }

        let mut lanes = Vec::with_capacity(pairs.len());
        let mut slots: Vec<Option<Line>> = lines.into_iter().map(Some).collect();
        for i in pairs {
            if let (Some(left), Some(right)) = (slots[i].take(), slots[i + 1].take()) {
                lanes.push((left, right));
            }
        }
        lanes
    }
}

// `|a - b| <= rel_tol * max(|a|, |b|)`
fn is_close(a: f64, b: f64, rel_tol: f64) -> bool {
    (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}
