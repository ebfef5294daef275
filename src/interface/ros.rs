// src/interface/ros.rs
// Publishes lane-follower commands as geometry_msgs/Twist over ROS 2.

use r2r::geometry_msgs::msg::Twist;
use r2r::QosProfile;

use super::{CommandSink, SinkError};
use crate::navigation::Commands;

/// Command sink backed by an r2r publisher.
///
/// `linear.x` carries the longitudinal command, `linear.y` the lateral one and
/// `angular.z` the yaw one.
pub struct TwistSink {
    inner: r2r::Publisher<Twist>,
}

impl TwistSink {
    /// Advertises `topic` on `node` with the given QoS.
    pub fn new(node: &mut r2r::Node, topic: &str, qos: QosProfile) -> Result<Self, r2r::Error> {
        let publisher = node.create_publisher::<Twist>(topic, qos)?;
        Ok(TwistSink { inner: publisher })
    }
}

impl CommandSink for TwistSink {
    fn send(&mut self, commands: &Commands) -> Result<(), SinkError> {
        let mut msg = Twist::default();
        msg.linear.x = commands.longitudinal;
        msg.linear.y = commands.lateral;
        msg.angular.z = commands.yaw;
        self.inner
            .publish(&msg)
            .map_err(|e| SinkError(e.to_string()))
    }
}
