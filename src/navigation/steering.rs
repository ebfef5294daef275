// src/navigation/steering.rs
// Maps the selected lane midline to lateral and yaw error signals, plus the
// human-readable direction labels shown alongside them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Line;

/// Dead bands for the steering signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Half-width (px) of the band around the image center treated as "forward".
    pub forward_tol: f64,
    /// Yaw angles (degrees) within this of zero snap to zero.
    pub angle_tol: f64,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        SteeringConfig {
            forward_tol: 50.0,
            angle_tol: 5.0,
        }
    }
}

/// Sideways correction implied by the lane position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    /// Lane midline is left of the forward band.
    Left,
    /// Lane midline is right of the forward band.
    Right,
    /// Lane midline is inside the forward band.
    Forward,
}

/// Rotation implied by the lane heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Turn {
    /// Positive yaw.
    Clockwise,
    /// Negative yaw.
    CounterClockwise,
    /// Yaw inside the dead band.
    Straight,
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Movement::Left => write!(f, "left"),
            Movement::Right => write!(f, "right"),
            Movement::Forward => write!(f, "forward"),
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Turn::Clockwise => write!(f, "clockwise"),
            Turn::CounterClockwise => write!(f, "counter-clockwise"),
            Turn::Straight => write!(f, "straight"),
        }
    }
}

/// Error signals for one frame, one per control axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteeringErrors {
    /// Supplied by the caller; not derived from the lane.
    pub longitudinal: f64,
    /// Signed fraction of image width, positive right of center.
    pub lateral: f64,
    /// Degrees, positive clockwise.
    pub yaw: f64,
}

impl SteeringErrors {
    /// False if any signal is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.longitudinal.is_finite() && self.lateral.is_finite() && self.yaw.is_finite()
    }
}

/// Result of mapping one center line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    /// Per-axis error signals.
    pub errors: SteeringErrors,
    /// Sideways label.
    pub movement: Movement,
    /// Rotation label.
    pub turn: Turn,
}

/// Turns a center line into [`Steering`].
#[derive(Debug, Clone)]
pub struct SteeringMapper {
    config: SteeringConfig,
}

impl SteeringMapper {
    /// Mapper with fixed dead bands.
    pub fn new(config: SteeringConfig) -> Self {
        SteeringMapper { config }
    }

    /// Lateral error and movement label from the midline's bottom intercept.
    pub fn lateral(&self, line: &Line, width: u32) -> (f64, Movement) {
        let w = f64::from(width);
        let mid = w / 2.0;
        let x = line.x_intercept().clamp(0.0, w);

        if x > mid + self.config.forward_tol {
            ((x - mid) / w, Movement::Right)
        } else if x < mid - self.config.forward_tol {
            ((x - mid) / w, Movement::Left)
        } else {
            (0.0, Movement::Forward)
        }
    }

    /// `atan(-1 / slope)` in degrees, rounded to 0.01 and snapped to zero
    /// inside `angle_tol`.
    pub fn yaw(&self, line: &Line) -> (f64, Turn) {
        let angle = ((-1.0 / line.slope()).atan().to_degrees() * 100.0).round() / 100.0;
        if angle.abs() <= self.config.angle_tol {
            (0.0, Turn::Straight)
        } else if angle > 0.0 {
            (angle, Turn::Clockwise)
        } else {
            (angle, Turn::CounterClockwise)
        }
    }

    /// Maps the selected center line; `longitudinal` is passed through untouched.
    pub fn map(&self, line: &Line, width: u32, longitudinal: f64) -> Steering {
        let (lateral, movement) = self.lateral(line, width);
        let (yaw, turn) = self.yaw(line);
        Steering {
            errors: SteeringErrors {
                longitudinal,
                lateral,
                yaw,
            },
            movement,
            turn,
        }
    }
}
