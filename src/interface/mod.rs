//! Collaborator seams for the control loop
//!
//! Frames come in through a [`FrameSource`] (the camera and line extractor)
//! and commands go out through a [`CommandSink`] (the thrusters, or a ROS
//! topic with the `ros` feature). [`ControlLoop`] wires the two to a
//! [`LaneFollower`] and processes frames strictly one after another.

/// ROS 2 command output.
#[cfg(feature = "ros")]
pub mod ros;

use log::{info, warn};

use crate::navigation::Commands;
use crate::{Frame, FrameOutcome, LaneFollower};

/// Supplies one frame at a time; `None` ends the session.
#[cfg_attr(test, mockall::automock)]
pub trait FrameSource {
    /// The next frame, or `None` when the session is over.
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Receives the command for every processed frame.
#[cfg_attr(test, mockall::automock)]
pub trait CommandSink {
    /// Forwards one command to the actuators.
    fn send(&mut self, commands: &Commands) -> Result<(), SinkError>;
}

/// Actuation side failed to accept a command
#[derive(Debug, Clone, PartialEq)]
pub struct SinkError(pub String);

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Command sink error: {}", self.0)
    }
}

impl std::error::Error for SinkError {}

/// Frame counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    /// Frames pulled from the source.
    pub frames: u64,
    /// Frames that produced fresh commands.
    pub steered: u64,
    /// Frames without a lane.
    pub held: u64,
    /// Frames rejected as invalid.
    pub invalid: u64,
    /// Controller resets after a sustained loss.
    pub resets: u64,
}

/// Pulls frames, runs the lane pipeline and pushes one command per frame.
pub struct ControlLoop<S, K> {
    follower: LaneFollower,
    source: S,
    sink: K,
    reset_after: Option<u32>,
    summary: LoopSummary,
}

impl<S: FrameSource, K: CommandSink> ControlLoop<S, K> {
    /// Loop with no reset policy.
    pub fn new(follower: LaneFollower, source: S, sink: K) -> Self {
        ControlLoop {
            follower,
            source,
            sink,
            reset_after: None,
            summary: LoopSummary::default(),
        }
    }

    /// Resets the controllers once this many consecutive frames have no lane.
    pub fn with_reset_after(mut self, frames: u32) -> Self {
        self.reset_after = Some(frames.max(1));
        self
    }

    /// Processes one frame. Returns `None` once the source is exhausted.
    ///
    /// A command is always sent: fresh when a lane was found, held otherwise
    /// (including for invalid frames).
    pub fn step(&mut self) -> Option<Result<Commands, SinkError>> {
        let frame = self.source.next_frame()?;
        self.summary.frames += 1;

        let commands = match self.follower.process_frame(&frame) {
            Ok(FrameOutcome::Steering(report)) => {
                self.summary.steered += 1;
                report.commands
            }
            Ok(FrameOutcome::NoLane { held }) => {
                self.summary.held += 1;
                if let Some(limit) = self.reset_after {
                    if self.follower.missed_frames() >= limit {
                        self.follower.reset();
                        self.summary.resets += 1;
                    }
                }
                held
            }
            Err(e) => {
                self.summary.invalid += 1;
                warn!("Skipping frame {}: {}", self.summary.frames, e);
                self.follower.hold()
            }
        };

        Some(self.sink.send(&commands).map(|_| commands))
    }

    /// Steps until the source runs dry or the sink fails.
    pub fn run(&mut self) -> Result<LoopSummary, SinkError> {
        while let Some(result) = self.step() {
            result?;
        }
        info!(
            "Session complete: {} frames, {} steered, {} held, {} invalid",
            self.summary.frames, self.summary.steered, self.summary.held, self.summary.invalid
        );
        Ok(self.summary)
    }

    /// Counters so far.
    pub fn summary(&self) -> LoopSummary {
        self.summary
    }

    /// The follower driven by this loop.
    pub fn follower(&self) -> &LaneFollower {
        &self.follower
    }
}
