use lane_follow::lanes::{center_lines, pick_center_line};
use lane_follow::{
    ClusterConfig, Commands, FollowerConfig, Frame, FrameOutcome, LaneFollower, LanePairer, Line,
    Movement, NoisePolicy, PairingConfig, SegmentClusterer, Turn,
};

const W: u32 = 1920;
const H: u32 = 1080;

fn follower_with_slope_tolerance(slope_tolerance: f64) -> LaneFollower {
    let config = FollowerConfig {
        clustering: ClusterConfig {
            slope_tolerance,
            min_cluster_size: 1,
            noise: NoisePolicy::Drop,
        },
        ..FollowerConfig::default()
    };
    LaneFollower::new(config).unwrap()
}

// Integration test: mirrored boundaries straddling the center steer straight ahead
#[test]
fn centered_lane_goes_forward() {
    let mut follower = follower_with_slope_tolerance(0.1);
    let frame = Frame::new(
        1920,
        1080,
        vec![
            [700, 1080, 160, 540],   // slope +1, x=700 at the bottom
            [1220, 1080, 1760, 540], // slope -1, x=1220 at the bottom
        ],
    );

    let FrameOutcome::Steering(report) = follower.process_frame(&frame).unwrap() else {
        panic!("expected a lane");
    };
    assert!((report.center_line.x_intercept() - 960.0).abs() <= 1.0);
    assert_eq!(report.movement, Movement::Forward);
    assert_eq!(report.turn, Turn::Straight);
    assert_eq!(report.errors.lateral, 0.0);
    assert_eq!(report.errors.yaw, 0.0);
    assert_eq!(report.commands, Commands::default());
}

// Integration test: an empty frame holds whatever was commanded before
#[test]
fn empty_frame_holds_previous_commands() {
    let mut follower = follower_with_slope_tolerance(0.05);
    let lane = Frame::new(1920, 1080, vec![[1400, 1080, 500, 270], [1500, 1080, 1000, 580]]);
    let before = follower.process_frame(&lane).unwrap().commands();
    assert_ne!(before, Commands::default());

    let outcome = follower.process_frame(&Frame::new(1920, 1080, Vec::new())).unwrap();
    assert_eq!(outcome, FrameOutcome::NoLane { held: before });
    assert_eq!(follower.hold(), before);
    assert_eq!(follower.missed_frames(), 1);

    // a run of lane-less frames is not an error
    for _ in 0..100 {
        assert_eq!(
            follower.process_frame(&Frame::new(1920, 1080, Vec::new())).unwrap().commands(),
            before
        );
    }
    assert_eq!(follower.missed_frames(), 101);
}

// Integration test: parallel boundaries right of center ask for a move right
#[test]
fn parallel_lane_right_of_center_moves_right() {
    let mut follower = follower_with_slope_tolerance(0.05);
    let frame = Frame::new(
        1920,
        1080,
        vec![
            [1400, 1080, 500, 270],  // slope 0.9, x=1400
            [1500, 1080, 1000, 580], // slope 1.0, x=1500
        ],
    );

    let FrameOutcome::Steering(report) = follower.process_frame(&frame).unwrap() else {
        panic!("expected a lane");
    };
    assert_eq!(report.center_line.x_intercept(), 1450.0);
    assert_eq!(report.movement, Movement::Right);
    assert!((report.errors.lateral - 0.255).abs() < 1e-3);
    // default lateral gains are kp=0.1
    assert!((report.commands.lateral - 0.1 * report.errors.lateral).abs() < 1e-12);
}

// Integration test: the stages compose the same way when driven by hand
#[test]
fn stages_compose_without_the_follower() {
    let raw: Vec<Line> = [
        [100, 480, 300, 680],
        [400, 780, 650, 1030],
        [1220, 1080, 1760, 540],
        [1300, 1000, 1400, 900],
    ]
    .iter()
    .map(|&[x1, y1, x2, y2]| Line::new(x1, y1, x2, y2, H))
    .collect();

    let merged = SegmentClusterer::new(ClusterConfig::default())
        .merge(&raw, W, H)
        .unwrap();
    assert_eq!(merged.len(), 2);

    let lanes = LanePairer::new(PairingConfig::default()).pair(merged, W);
    assert_eq!(lanes.len(), 1);

    let center = pick_center_line(center_lines(&lanes, H).unwrap(), W).unwrap();
    assert!((center.x_intercept() - 960.0).abs() <= 1.0);
}

// Integration test: sparse segments with a strict cluster size never reach the pairer
#[test]
fn strict_cluster_size_short_circuits_to_no_lane() {
    let config = FollowerConfig {
        clustering: ClusterConfig {
            slope_tolerance: 0.1,
            min_cluster_size: 2,
            noise: NoisePolicy::Drop,
        },
        ..FollowerConfig::default()
    };
    let mut follower = LaneFollower::new(config).unwrap();
    let frame = Frame::new(1920, 1080, vec![[700, 1080, 160, 540], [1220, 1080, 1760, 540]]);
    assert!(matches!(
        follower.process_frame(&frame).unwrap(),
        FrameOutcome::NoLane { .. }
    ));
}

// Integration test: frames replay from YAML the way the binary reads them
#[test]
fn frames_deserialize_from_yaml() {
    let yaml = "
- width: 1920
  height: 1080
  segments:
    - [700, 1080, 160, 540]
    - [1220, 1080, 1760, 540]
- width: 1920
  height: 1080
  longitudinal_error: 0.5
";
    let frames: Vec<Frame> = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].segments.len(), 2);
    assert!(frames[1].segments.is_empty());
    assert_eq!(frames[1].longitudinal_error, 0.5);
}
