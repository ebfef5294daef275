// src/main.rs
// Replays recorded frames through the lane follower and logs the commands.
//
// Usage: lane-follow <config.yaml> <frames.yaml>
// Set RUST_LOG=debug to see per-frame pipeline detail.

use std::collections::VecDeque;
use std::error::Error;

use lane_follow::{
    CommandSink, Commands, ControlLoop, FollowerConfig, Frame, FrameSource, LaneFollower, SinkError,
};
use log::info;
use serde::Deserialize;

/// Config file: the follower settings plus the replay-only reset policy.
#[derive(Debug, Deserialize)]
struct ReplayConfig {
    #[serde(flatten)]
    follower: FollowerConfig,
    /// Consecutive lane-less frames before the controllers are reset.
    #[serde(default = "default_reset_after")]
    reset_after_missed: u32,
}

fn default_reset_after() -> u32 {
    30
}

struct ReplaySource {
    frames: VecDeque<Frame>,
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }
}

struct LogSink {
    sent: u64,
}

impl CommandSink for LogSink {
    fn send(&mut self, commands: &Commands) -> Result<(), SinkError> {
        self.sent += 1;
        info!(
            "frame {}: longitudinal={:.3}, lateral={:.3}, yaw={:.3}",
            self.sent, commands.longitudinal, commands.lateral, commands.yaw
        );
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging for debugging
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (config_path, frames_path) = match (args.next(), args.next()) {
        (Some(config), Some(frames)) => (config, frames),
        _ => return Err("usage: lane-follow <config.yaml> <frames.yaml>".into()),
    };

    let replay: ReplayConfig = serde_yaml::from_reader(std::fs::File::open(&config_path)?)?;
    let follower = LaneFollower::new(replay.follower)?;
    info!("Loaded config from {}", config_path);

    let frames: Vec<Frame> = serde_yaml::from_reader(std::fs::File::open(&frames_path)?)?;
    info!("Replaying {} frames from {}", frames.len(), frames_path);

    let source = ReplaySource {
        frames: frames.into(),
    };
    let mut control = ControlLoop::new(follower, source, LogSink { sent: 0 })
        .with_reset_after(replay.reset_after_missed);
    let summary = control.run()?;

    info!(
        "Replay finished: {} steered, {} held, {} invalid, {} resets",
        summary.steered, summary.held, summary.invalid, summary.resets
    );
    Ok(())
}
