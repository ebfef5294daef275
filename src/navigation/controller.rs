// src/navigation/controller.rs
// Discrete PID controller, one instance per control axis.

use log::info;
use serde::{Deserialize, Serialize};

/// Gains and output bound for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
    /// Output is clamped to `[-output_limit, output_limit]`.
    pub output_limit: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        PidGains {
            kp: 0.1,
            ki: 0.0,
            kd: 0.0,
            output_limit: 100.0,
        }
    }
}

impl PidGains {
    /// Gains in `kp, ki, kd` order, then the output bound.
    pub fn new(kp: f64, ki: f64, kd: f64, output_limit: f64) -> Self {
        PidGains {
            kp,
            ki,
            kd,
            output_limit,
        }
    }

    /// Rejects gains that cannot produce a meaningful bounded command.
    pub fn validate(&self) -> Result<(), PidError> {
        let gains = [self.kp, self.ki, self.kd];
        if gains.iter().any(|g| !g.is_finite() || *g < 0.0) {
            return Err(PidError::InvalidGain);
        }
        if gains.iter().all(|g| *g == 0.0) {
            return Err(PidError::ZeroGains);
        }
        if !self.output_limit.is_finite() || self.output_limit <= 0.0 {
            return Err(PidError::InvalidOutputLimit(self.output_limit));
        }
        Ok(())
    }
}

/// Construction-time PID misconfiguration.
#[derive(Debug, Clone, PartialEq)]
pub enum PidError {
    /// A gain is negative or not finite
    InvalidGain,
    /// Every gain is zero, so the output would always be zero
    ZeroGains,
    /// Output limit must be finite and positive
    InvalidOutputLimit(f64),
}

impl std::fmt::Display for PidError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PidError::InvalidGain => write!(f, "gains must be finite and non-negative"),
            PidError::ZeroGains => write!(f, "at least one gain must be non-zero"),
            PidError::InvalidOutputLimit(limit) => {
                write!(f, "output limit must be finite and positive, got {}", limit)
            }
        }
    }
}

impl std::error::Error for PidError {}

/// PID controller stepped once per control frame.
///
/// There is no timestamping: integral and derivative are per-call sums and
/// differences, so the caller must step at a steady cadence. The integral has
/// no anti-windup beyond the output clamp.
#[derive(Debug, Clone)]
pub struct Pid {
    gains: PidGains,
    integral: f64,
    previous_error: f64,
    last_output: f64,
}

impl Pid {
    /// Validates `gains` and starts from a zero state.
    pub fn new(gains: PidGains) -> Result<Self, PidError> {
        gains.validate()?;
        Ok(Pid {
            gains,
            integral: 0.0,
            previous_error: 0.0,
            last_output: 0.0,
        })
    }

    /// Feeds one error sample and returns the clamped command.
    pub fn update(&mut self, error: f64) -> f64 {
        self.integral += error;
        let derivative = error - self.previous_error;
        let raw = self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative;
        let limit = self.gains.output_limit;
        let output = raw.clamp(-limit, limit);

        self.previous_error = error;
        self.last_output = output;
        output
    }

    /// Clears the integral and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.last_output = 0.0;
        info!("PID state reset");
    }

    /// The most recent output, or 0 before the first update.
    pub fn last_output(&self) -> f64 {
        self.last_output
    }

    /// Running sum of every error fed so far.
    pub fn integral(&self) -> f64 {
        self.integral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(5.0, 5.0)]
    #[case(-42.5, -42.5)]
    #[case(250.0, 100.0)]
    #[case(-1e9, -100.0)]
    fn proportional_only_tracks_clamped_error(#[case] error: f64, #[case] expected: f64) {
        let mut pid = Pid::new(PidGains::new(1.0, 0.0, 0.0, 100.0)).unwrap();
        for _ in 0..4 {
            assert_eq!(pid.update(error), expected);
        }
    }

    #[test]
    fn integral_accumulates() {
        let mut pid = Pid::new(PidGains::new(0.0, 1.0, 0.0, 1000.0)).unwrap();
        let outputs: Vec<f64> = [1.0, 1.0, 1.0].iter().map(|e| pid.update(*e)).collect();
        assert_eq!(outputs, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn derivative_uses_previous_error() {
        let mut pid = Pid::new(PidGains::new(0.0, 0.0, 1.0, 1000.0)).unwrap();
        assert_eq!(pid.update(2.0), 2.0);
        assert_eq!(pid.update(5.0), 3.0);
        assert_eq!(pid.update(5.0), 0.0);
        assert_eq!(pid.update(1.0), -4.0);
    }

    #[test]
    fn saturation_still_winds_the_integral() {
        let mut pid = Pid::new(PidGains::new(0.0, 1.0, 0.0, 2.0)).unwrap();
        for _ in 0..5 {
            pid.update(1.0);
        }
        assert_eq!(pid.last_output(), 2.0);
        assert_eq!(pid.integral(), 5.0);
    }

    #[test]
    fn reset_clears_history() {
        let mut pid = Pid::new(PidGains::new(0.0, 1.0, 1.0, 100.0)).unwrap();
        pid.update(3.0);
        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.last_output(), 0.0);
        // derivative starts from zero again: 1*1 + 1*(1-0)
        assert_eq!(pid.update(1.0), 2.0);
    }

    #[rstest]
    #[case(PidGains::new(-0.1, 0.0, 0.0, 100.0), PidError::InvalidGain)]
    #[case(PidGains::new(f64::NAN, 0.0, 0.0, 100.0), PidError::InvalidGain)]
    #[case(PidGains::new(0.0, 0.0, 0.0, 100.0), PidError::ZeroGains)]
    #[case(PidGains::new(1.0, 0.0, 0.0, 0.0), PidError::InvalidOutputLimit(0.0))]
    #[case(PidGains::new(1.0, 0.0, 0.0, -5.0), PidError::InvalidOutputLimit(-5.0))]
    fn misconfiguration_fails_at_construction(#[case] gains: PidGains, #[case] expected: PidError) {
        assert_eq!(Pid::new(gains).unwrap_err(), expected);
    }
}
