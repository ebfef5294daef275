//! Fiducial tag tracking
//!
//! Alternative to lane following: the vision collaborator reports tag
//! detections in pixel space and the vehicle is steered to bring a tag to the
//! image center. Pose estimation stays with the collaborator; the intrinsics
//! below are only carried so each camera profile travels as one value.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::navigation::{Pid, PidError, PidGains};

/// Pinhole camera parameters handed to the tag detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length along x, in pixels.
    pub fx: f64,
    /// Focal length along y, in pixels.
    pub fy: f64,
    /// Principal point x.
    pub cx: f64,
    /// Principal point y.
    pub cy: f64,
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        // 1920x1080 pool camera
        CameraIntrinsics {
            fx: 1060.71,
            fy: 1060.71,
            cx: 960.0,
            cy: 540.0,
        }
    }
}

/// One detected tag, in pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagDetection {
    /// Tag family id.
    pub id: i32,
    /// Tag center `(x, y)`.
    pub center: (f64, f64),
    /// Corner points, counter-clockwise from the top left.
    #[serde(default)]
    pub corners: [(f64, f64); 4],
}

/// Offset of a tag from the image center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagError {
    /// Id of the detection this offset belongs to.
    pub id: i32,
    /// Pixels, positive right of center.
    pub horizontal: f64,
    /// Pixels, positive above center.
    pub vertical: f64,
}

/// Pixel offset of every detection from the image center.
pub fn tag_errors(tags: &[TagDetection], width: u32, height: u32) -> Vec<TagError> {
    let x_center = f64::from(width) / 2.0;
    let y_center = f64::from(height) / 2.0;
    tags.iter()
        .map(|tag| TagError {
            id: tag.id,
            horizontal: tag.center.0 - x_center,
            vertical: y_center - tag.center.1,
        })
        .collect()
}

/// Gains for the two tag-centering controllers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagTrackingConfig {
    /// Sideways controller, fed the horizontal pixel offset.
    pub horizontal: PidGains,
    /// Depth controller, fed the vertical pixel offset.
    pub vertical: PidGains,
}

impl Default for TagTrackingConfig {
    fn default() -> Self {
        TagTrackingConfig {
            horizontal: PidGains::new(0.1, 0.0, 0.0, 100.0),
            vertical: PidGains::new(0.1, 0.0, 0.0, 100.0),
        }
    }
}

/// Controller outputs for the tracked tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagCommands {
    /// Tag being tracked.
    pub id: i32,
    /// Sideways command.
    pub horizontal: f64,
    /// Depth command.
    pub vertical: f64,
}

/// Steers toward the first reported tag with a horizontal and a vertical PID.
#[derive(Debug, Clone)]
pub struct TagTracker {
    horizontal: Pid,
    vertical: Pid,
}

impl TagTracker {
    /// Builds both controllers, failing on invalid gains.
    pub fn new(config: &TagTrackingConfig) -> Result<Self, PidError> {
        Ok(TagTracker {
            horizontal: Pid::new(config.horizontal)?,
            vertical: Pid::new(config.vertical)?,
        })
    }

    /// Steps both controllers toward the first detection; with no detections
    /// nothing is updated and `None` comes back.
    pub fn update(&mut self, tags: &[TagDetection], width: u32, height: u32) -> Option<TagCommands> {
        let target = tag_errors(tags, width, height).into_iter().next()?;
        debug!(
            "tracking tag {} at offset ({:.1}, {:.1})",
            target.id, target.horizontal, target.vertical
        );
        Some(TagCommands {
            id: target.id,
            horizontal: self.horizontal.update(target.horizontal),
            vertical: self.vertical.update(target.vertical),
        })
    }

    /// Clears both controllers.
    pub fn reset(&mut self) {
        self.horizontal.reset();
        self.vertical.reset();
    }
}
