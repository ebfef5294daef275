// src/geometry/line.rs
// Infinite 2D line sampled from two pixel endpoints, with the slope and
// bottom-edge intercept every lane stage works from.

use std::fmt;

/// Slope assigned to vertical segments (`x1 == x2`).
pub const VERTICAL_SLOPE: f64 = 1e10;
/// Slope assigned to horizontal segments so `1 / slope` stays finite.
pub const HORIZONTAL_SLOPE: f64 = 1e-14;
/// Intercept assigned to horizontal segments, which never reach the reference height.
pub const NO_X_INTERCEPT: f64 = 1e10;

/// A line through two integer pixel endpoints.
///
/// `slope` and `x_intercept` are computed once at construction. The
/// x-intercept is taken at `reference_height` (the image height), i.e. where
/// the line crosses the bottom edge of the frame. Degenerate segments get the
/// finite sentinels above instead of infinities.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    slope: f64,
    x_intercept: f64,
    paired: bool,
}

impl Line {
    /// Builds a line from four pixel coordinates.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32, reference_height: u32) -> Self {
        let reference_height = f64::from(reference_height);
        let slope = if x1 == x2 {
            VERTICAL_SLOPE
        } else if y1 == y2 {
            HORIZONTAL_SLOPE
        } else {
            (f64::from(y2) - f64::from(y1)) / (f64::from(x2) - f64::from(x1))
        };
        let x_intercept = if y1 == y2 {
            NO_X_INTERCEPT
        } else {
            ((reference_height - f64::from(y1)) / slope + f64::from(x1)).round()
        };

        Line {
            x1,
            y1,
            x2,
            y2,
            slope,
            x_intercept,
            paired: false,
        }
    }

    /// Builds a line from real-valued endpoints, rounding each to the nearest pixel.
    ///
    /// Returns `None` when a coordinate is not finite or rounds outside the
    /// `i32` pixel range.
    pub fn from_points_f64(p1: (f64, f64), p2: (f64, f64), reference_height: u32) -> Option<Self> {
        Some(Line::new(
            round_px(p1.0)?,
            round_px(p1.1)?,
            round_px(p2.0)?,
            round_px(p2.1)?,
            reference_height,
        ))
    }

    /// Rise over run, or one of the sentinels for axis-aligned segments.
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Rounded `x` where the line crosses the reference height, or
    /// [`NO_X_INTERCEPT`] for horizontal lines.
    pub fn x_intercept(&self) -> f64 {
        self.x_intercept
    }

    /// The value of `y` where the line crosses `x = 0`.
    pub fn y_intercept(&self) -> f64 {
        self.y(0.0)
    }

    /// `y = m(x - x1) + y1`
    pub fn y(&self, x: f64) -> f64 {
        self.slope * (x - f64::from(self.x1)) + f64::from(self.y1)
    }

    /// `x = (y - y1) / m + x1`
    ///
    /// Meaningless for vertical lines beyond returning `x1` (the sentinel slope
    /// makes the quotient vanish).
    pub fn x(&self, y: f64) -> f64 {
        (y - f64::from(self.y1)) / self.slope + f64::from(self.x1)
    }

    /// Endpoints as `[x1, y1, x2, y2]`.
    pub fn get_points(&self) -> [i32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Both endpoints share one x.
    pub fn is_vertical(&self) -> bool {
        self.x1 == self.x2
    }

    /// Both endpoints share one y.
    pub fn is_horizontal(&self) -> bool {
        self.y1 == self.y2
    }

    /// True when both endpoints coincide, so no direction is defined.
    pub fn is_point(&self) -> bool {
        self.is_vertical() && self.is_horizontal()
    }

    /// Set once the pairer has placed this line in a lane.
    pub fn is_paired(&self) -> bool {
        self.paired
    }

    /// Marks the line as consumed by a lane.
    pub fn set_paired(&mut self) {
        self.paired = true;
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "p1: ({}, {}), p2: ({}, {}), slope: {:.2}, x-intercept: {}, y-intercept: {:.2}",
            self.x1,
            self.y1,
            self.x2,
            self.y2,
            self.slope,
            self.x_intercept,
            self.y_intercept()
        )
    }
}

fn round_px(value: f64) -> Option<i32> {
    let rounded = value.round();
    if rounded.is_finite() && rounded >= f64::from(i32::MIN) && rounded <= f64::from(i32::MAX) {
        Some(rounded as i32)
    } else {
        None
    }
}
