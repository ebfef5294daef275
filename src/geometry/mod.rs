//! Geometric primitives shared by the lane stages.

/// The [`Line`] primitive and its sentinels.
pub mod line;

pub use line::{Line, HORIZONTAL_SLOPE, NO_X_INTERCEPT, VERTICAL_SLOPE};
