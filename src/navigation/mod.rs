//! Navigation for the lane follower
//!
//! This module turns the selected lane midline into per-axis error signals
//! and smooths those signals into bounded actuator commands.

/// Per-axis PID controller.
pub mod controller;
/// Steering errors and direction labels.
pub mod steering;

pub use controller::{Pid, PidError, PidGains};
pub use steering::{Movement, Steering, SteeringConfig, SteeringErrors, SteeringMapper, Turn};

use serde::{Deserialize, Serialize};

/// Actuator commands for one frame, each bounded by its controller's limit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Commands {
    /// Forward/backward thrust.
    pub longitudinal: f64,
    /// Sideways thrust.
    pub lateral: f64,
    /// Rotation about the vertical axis.
    pub yaw: f64,
}

impl Commands {
    /// False if any axis is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.longitudinal.is_finite() && self.lateral.is_finite() && self.yaw.is_finite()
    }
}

/// The three axis controllers driven by the lane pipeline.
#[derive(Debug, Clone)]
pub struct AxisControllers {
    longitudinal: Pid,
    lateral: Pid,
    yaw: Pid,
}

impl AxisControllers {
    /// Builds one controller per axis.
    pub fn new(longitudinal: PidGains, lateral: PidGains, yaw: PidGains) -> Result<Self, PidError> {
        Ok(AxisControllers {
            longitudinal: Pid::new(longitudinal)?,
            lateral: Pid::new(lateral)?,
            yaw: Pid::new(yaw)?,
        })
    }

    /// Steps every controller once.
    pub fn update(&mut self, errors: &SteeringErrors) -> Commands {
        Commands {
            longitudinal: self.longitudinal.update(errors.longitudinal),
            lateral: self.lateral.update(errors.lateral),
            yaw: self.yaw.update(errors.yaw),
        }
    }

    /// The most recent commands, without stepping.
    pub fn last(&self) -> Commands {
        Commands {
            longitudinal: self.longitudinal.last_output(),
            lateral: self.lateral.last_output(),
            yaw: self.yaw.last_output(),
        }
    }

    /// Clears every controller.
    pub fn reset(&mut self) {
        self.longitudinal.reset();
        self.lateral.reset();
        self.yaw.reset();
    }
}
