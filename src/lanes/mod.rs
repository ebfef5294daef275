//! Lane estimation
//!
//! Turns the raw segments of one frame into a single trusted lane midline:
//! colinear segments are clustered and merged, neighbouring merged lines are
//! paired into lanes, and the lane whose midline sits closest to the image
//! center is selected. Every stage is a pure function of its inputs.

/// Lane midlines and center-line selection.
pub mod center;
/// Slope clustering and least-squares merging.
pub mod cluster;
/// Greedy lane pairing.
pub mod pairing;

pub use center::{center_line, center_lines, pick_center_line};
pub use cluster::{ClusterConfig, NoisePolicy, SegmentClusterer};
pub use pairing::{LanePairer, PairRule, PairingConfig};

use crate::geometry::Line;

/// Left and right boundary of one lane, in ascending x-intercept order.
pub type Lane = (Line, Line);
