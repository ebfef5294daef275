//! Lane Follow - lane estimation and steering for an AUV
//!
//! This library turns the raw line segments reported by a vision collaborator
//! into a single lane midline, maps that midline to lateral, longitudinal and
//! yaw error signals, and smooths them into bounded actuator commands with one
//! PID controller per axis.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod geometry;
pub mod interface;
pub mod lanes;
pub mod navigation;
pub mod tags;

// Re-export commonly used items for easier access
pub use geometry::Line;
pub use interface::{CommandSink, ControlLoop, FrameSource, LoopSummary, SinkError};
pub use lanes::{ClusterConfig, Lane, LanePairer, NoisePolicy, PairingConfig, SegmentClusterer};
pub use navigation::{
    AxisControllers, Commands, Movement, Pid, PidError, PidGains, SteeringConfig, SteeringErrors,
    SteeringMapper, Turn,
};
pub use tags::{CameraIntrinsics, TagDetection, TagTracker, TagTrackingConfig};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Main configuration structure for the lane follower
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// Slope clustering of raw segments
    pub clustering: ClusterConfig,
    /// Lane pairing tolerances
    pub pairing: PairingConfig,
    /// Steering dead bands
    pub steering: SteeringConfig,
    /// Forward/backward controller
    pub longitudinal: PidGains,
    /// Sideways controller
    pub lateral: PidGains,
    /// Heading controller
    pub yaw: PidGains,
    /// Intrinsics of the camera feeding this pipeline
    pub camera: CameraIntrinsics,
    /// Tag tracking controllers
    pub tags: TagTrackingConfig,
}

impl FollowerConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: FollowerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML config file.
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let config_file = std::fs::File::open(path)?;
        let config: FollowerConfig = serde_yaml::from_reader(config_file)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let clustering = &self.clustering;
        if !(clustering.slope_tolerance.is_finite() && clustering.slope_tolerance >= 0.0) {
            return Err(ConfigError::Invalid("clustering.slope_tolerance must be >= 0".into()));
        }
        if clustering.min_cluster_size == 0 {
            return Err(ConfigError::Invalid("clustering.min_cluster_size must be >= 1".into()));
        }

        let tolerances = [
            ("pairing.center_lane_tol", self.pairing.center_lane_tol),
            ("pairing.parallel_tol", self.pairing.parallel_tol),
            ("pairing.x_intercept_tol", self.pairing.x_intercept_tol),
            ("steering.forward_tol", self.steering.forward_tol),
            ("steering.angle_tol", self.steering.angle_tol),
        ];
        for (name, value) in tolerances {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!("{} must be >= 0, got {}", name, value)));
            }
        }

        let gains = [
            ("longitudinal", self.longitudinal),
            ("lateral", self.lateral),
            ("yaw", self.yaw),
            ("tags.horizontal", self.tags.horizontal),
            ("tags.vertical", self.tags.vertical),
        ];
        for (axis, gains) in gains {
            gains
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("{}: {}", axis, e)))?;
        }
        Ok(())
    }
}

/// Construction-time errors; fatal at startup
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read
    Io(std::io::Error),
    /// Config file is not valid YAML for this schema
    Yaml(serde_yaml::Error),
    /// A value is out of range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Config I/O error: {}", e),
            ConfigError::Yaml(e) => write!(f, "Config parse error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Yaml(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Yaml(e)
    }
}

impl From<PidError> for ConfigError {
    fn from(e: PidError) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

/// One frame as reported by the vision collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Image width in pixels
    pub width: i64,
    /// Image height in pixels; also the reference height for intercepts
    pub height: i64,
    /// Raw segments as `[x1, y1, x2, y2]`
    #[serde(default)]
    pub segments: Vec<[i32; 4]>,
    /// Longitudinal error supplied by the caller (e.g. from tag range)
    #[serde(default)]
    pub longitudinal_error: f64,
}

impl Frame {
    /// Frame with no longitudinal error.
    pub fn new(width: i64, height: i64, segments: Vec<[i32; 4]>) -> Self {
        Frame {
            width,
            height,
            segments,
            longitudinal_error: 0.0,
        }
    }
}

/// Per-frame failures; the frame is skipped and previous commands hold
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    /// Width or height is not a positive pixel count
    InvalidDimensions {
        /// Reported width
        width: i64,
        /// Reported height
        height: i64,
    },
    /// Segment at this index collapses to a single point
    DegenerateSegment(usize),
    /// Segment at this index spans more than the `i32` pixel range
    SegmentOutOfRange(usize),
    /// A fit or center line left the pixel range, or mapping produced NaN or infinity
    NonFinite,
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FrameError::InvalidDimensions { width, height } => {
                write!(f, "Invalid frame dimensions {}x{}", width, height)
            }
            FrameError::DegenerateSegment(i) => write!(f, "Segment {} is a single point", i),
            FrameError::SegmentOutOfRange(i) => write!(f, "Segment {} exceeds the pixel range", i),
            FrameError::NonFinite => write!(f, "Non-finite or out-of-range geometry"),
        }
    }
}

impl std::error::Error for FrameError {}

/// What the pipeline produced for a lane frame
#[derive(Debug, Clone, PartialEq)]
pub struct SteeringReport {
    /// Midline of the selected lane
    pub center_line: Line,
    /// Error signals fed to the controllers
    pub errors: SteeringErrors,
    /// Controller outputs
    pub commands: Commands,
    /// Sideways label, consistent with `errors.lateral`
    pub movement: Movement,
    /// Rotation label, consistent with `errors.yaw`
    pub turn: Turn,
}

/// Outcome of one processed frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// A lane was found and the controllers were stepped
    Steering(SteeringReport),
    /// No lane; the controllers were not stepped and these commands hold
    NoLane {
        /// Commands from the last steered frame
        held: Commands,
    },
}

impl FrameOutcome {
    /// The command to send for this frame, fresh or held.
    pub fn commands(&self) -> Commands {
        match self {
            FrameOutcome::Steering(report) => report.commands,
            FrameOutcome::NoLane { held } => *held,
        }
    }
}

/// Primary entry point: one lane pipeline with its three axis controllers
#[derive(Debug, Clone)]
pub struct LaneFollower {
    clusterer: SegmentClusterer,
    pairer: LanePairer,
    mapper: SteeringMapper,
    controllers: AxisControllers,
    missed_frames: u32,
}

impl LaneFollower {
    /// Create a lane follower, validating the configuration
    pub fn new(config: FollowerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let controllers = AxisControllers::new(config.longitudinal, config.lateral, config.yaw)?;
        info!(
            "Lane follower ready (slope tol {}, forward tol {}px)",
            config.clustering.slope_tolerance, config.steering.forward_tol
        );

        Ok(LaneFollower {
            clusterer: SegmentClusterer::new(config.clustering),
            pairer: LanePairer::new(config.pairing),
            mapper: SteeringMapper::new(config.steering),
            controllers,
            missed_frames: 0,
        })
    }

    /// Runs one frame through the pipeline.
    ///
    /// Controllers are stepped exactly once when a lane is found. When no lane
    /// is found they are left alone and the previous commands hold. On `Err`
    /// nothing changes.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameOutcome, FrameError> {
        let (width, height, lines) = self.validate(frame)?;

        let merged = self
            .clusterer
            .merge(&lines, width, height)
            .ok_or(FrameError::NonFinite)?;
        let lanes = self.pairer.pair(merged, width);
        debug!("{} segments -> {} lanes", lines.len(), lanes.len());

        let centers = lanes::center_lines(&lanes, height).ok_or(FrameError::NonFinite)?;
        let center = match lanes::pick_center_line(centers, width) {
            Some(line) => line,
            None => {
                self.missed_frames = self.missed_frames.saturating_add(1);
                warn!(
                    "No lane detected ({} consecutive), holding commands",
                    self.missed_frames
                );
                return Ok(FrameOutcome::NoLane { held: self.hold() });
            }
        };

        let steering = self.mapper.map(&center, width, frame.longitudinal_error);
        if !steering.errors.is_finite() {
            return Err(FrameError::NonFinite);
        }

        // Commands are bounded by the clamp, but NaN would pass through it.
        let mut trial = self.controllers.clone();
        let commands = trial.update(&steering.errors);
        if !commands.is_finite() {
            return Err(FrameError::NonFinite);
        }
        self.controllers = trial;
        self.missed_frames = 0;

        debug!(
            "center x={} -> {} / {}, commands {:?}",
            center.x_intercept(),
            steering.movement,
            steering.turn,
            commands
        );
        Ok(FrameOutcome::Steering(SteeringReport {
            center_line: center,
            errors: steering.errors,
            commands,
            movement: steering.movement,
            turn: steering.turn,
        }))
    }

    /// Last commands produced, for frames that are skipped or miss a deadline.
    pub fn hold(&self) -> Commands {
        self.controllers.last()
    }

    /// Consecutive frames without a lane.
    pub fn missed_frames(&self) -> u32 {
        self.missed_frames
    }

    /// Re-initialises all three controllers and zeroes the held commands.
    pub fn reset(&mut self) {
        self.controllers.reset();
        self.missed_frames = 0;
        info!("Lane follower controllers reset");
    }

    fn validate(&self, frame: &Frame) -> Result<(u32, u32, Vec<Line>), FrameError> {
        let dims = (u32::try_from(frame.width), u32::try_from(frame.height));
        let (width, height) = match dims {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                return Err(FrameError::InvalidDimensions {
                    width: frame.width,
                    height: frame.height,
                })
            }
        };

        let mut lines = Vec::with_capacity(frame.segments.len());
        for (i, &[x1, y1, x2, y2]) in frame.segments.iter().enumerate() {
            if x2.checked_sub(x1).is_none() || y2.checked_sub(y1).is_none() {
                return Err(FrameError::SegmentOutOfRange(i));
            }
            let line = Line::new(x1, y1, x2, y2, height);
            if line.is_point() {
                return Err(FrameError::DegenerateSegment(i));
            }
            lines.push(line);
        }
        Ok((width, height, lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(FollowerConfig::default().validate().is_ok());
        assert!(LaneFollower::new(FollowerConfig::default()).is_ok());
    }

    #[test]
    fn yaml_overrides_only_named_fields() {
        let config = FollowerConfig::from_yaml_str(
            "clustering:\n  slope_tolerance: 0.05\nlateral:\n  kp: 2.0\n  ki: 0.0\n  kd: 0.5\n  output_limit: 50.0\n",
        )
        .unwrap();
        assert_eq!(config.clustering.slope_tolerance, 0.05);
        assert_eq!(config.clustering.min_cluster_size, 1);
        assert_eq!(config.lateral, PidGains::new(2.0, 0.0, 0.5, 50.0));
        assert_eq!(config.yaw, PidGains::default());
        assert_eq!(config.camera, CameraIntrinsics::default());
    }

    #[test]
    fn zero_output_limit_is_rejected() {
        let yaml = "yaw:\n  kp: 1.0\n  ki: 0.0\n  kd: 0.0\n  output_limit: 0.0\n";
        assert!(matches!(
            FollowerConfig::from_yaml_str(yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        assert!(matches!(
            FollowerConfig::from_yaml_str("pairing: [1, 2"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            FollowerConfig::from_yaml_file("/nonexistent/lane-follow.yaml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn invalid_frames_change_nothing() {
        let mut follower = LaneFollower::new(FollowerConfig::default()).unwrap();
        let bad = Frame::new(0, 1080, Vec::new());
        assert_eq!(
            follower.process_frame(&bad),
            Err(FrameError::InvalidDimensions { width: 0, height: 1080 })
        );

        let point = Frame::new(1920, 1080, vec![[700, 1080, 160, 540], [5, 5, 5, 5]]);
        assert_eq!(follower.process_frame(&point), Err(FrameError::DegenerateSegment(1)));
        assert_eq!(follower.hold(), Commands::default());
        assert_eq!(follower.missed_frames(), 0);
    }

    #[test]
    fn non_finite_longitudinal_error_is_rejected() {
        let mut follower = LaneFollower::new(FollowerConfig::default()).unwrap();
        let mut frame = Frame::new(1920, 1080, vec![[700, 1080, 160, 540], [1220, 1080, 1760, 540]]);
        frame.longitudinal_error = f64::NAN;
        assert_eq!(follower.process_frame(&frame), Err(FrameError::NonFinite));
        assert_eq!(follower.hold(), Commands::default());
    }

    #[test]
    fn horizontal_segment_beside_a_shallow_one_finds_no_lane() {
        let mut follower = LaneFollower::new(FollowerConfig::default()).unwrap();
        let frame = Frame::new(1920, 1080, vec![[0, 500, 1920, 500], [0, 600, 1000, 400]]);
        assert!(matches!(
            follower.process_frame(&frame),
            Ok(FrameOutcome::NoLane { .. })
        ));
        assert_eq!(follower.missed_frames(), 1);
    }

    #[test]
    fn horizontal_boundary_in_a_lane_rejects_the_frame() {
        // a wide mirror tolerance lets the horizontal line pair with the -0.2 one
        let config = FollowerConfig {
            pairing: PairingConfig {
                center_lane_tol: 1.5,
                ..PairingConfig::default()
            },
            ..FollowerConfig::default()
        };
        let mut follower = LaneFollower::new(config).unwrap();
        let frame = Frame::new(1920, 1080, vec![[0, 500, 1920, 500], [0, 600, 1000, 400]]);
        assert_eq!(follower.process_frame(&frame), Err(FrameError::NonFinite));
        assert_eq!(follower.hold(), Commands::default());
        assert_eq!(follower.missed_frames(), 0);
    }

    #[test]
    fn oversized_segments_are_rejected() {
        let mut follower = LaneFollower::new(FollowerConfig::default()).unwrap();
        let wide = Frame::new(1920, 1080, vec![[700, 1080, 160, 540], [i32::MIN, 0, i32::MAX, 5]]);
        assert_eq!(follower.process_frame(&wide), Err(FrameError::SegmentOutOfRange(1)));

        // fits in range, but its fitted line does not
        let steep = Frame::new(1920, 1080, vec![[0, 0, 1, 2_000_000_000]]);
        assert_eq!(follower.process_frame(&steep), Err(FrameError::NonFinite));
        assert_eq!(follower.missed_frames(), 0);
    }
}
