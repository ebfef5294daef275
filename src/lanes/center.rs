// src/lanes/center.rs
// Reduces each lane to its midline and picks the lane nearest the image center.

use super::Lane;
use crate::geometry::Line;

/// Midline of a lane: halfway between the boundaries at the bottom edge
/// (`y = height`) and at the top edge (`y = 0`).
///
/// `None` when a midpoint falls outside the pixel range, e.g. a lane with a
/// horizontal boundary whose intercept is the sentinel.
pub fn center_line(lane: &Lane, height: u32) -> Option<Line> {
    let (left, right) = lane;
    let bottom = (left.x_intercept() + right.x_intercept()) / 2.0;
    let top = (left.x(0.0) + right.x(0.0)) / 2.0;
    Line::from_points_f64((bottom, f64::from(height)), (top, 0.0), height)
}

/// Midlines of every lane, in lane order; `None` if any cannot be drawn.
pub fn center_lines(lanes: &[Lane], height: u32) -> Option<Vec<Line>> {
    lanes.iter().map(|lane| center_line(lane, height)).collect()
}

/// The center line whose x-intercept is closest to `width / 2`, or `None`
/// when there are no candidates. Ties keep the earlier line.
pub fn pick_center_line(center_lines: Vec<Line>, width: u32) -> Option<Line> {
    let mid = f64::from(width) / 2.0;
    center_lines.into_iter().reduce(|best, line| {
        if (line.x_intercept() - mid).abs() < (best.x_intercept() - mid).abs() {
            line
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 1920;
    const H: u32 = 1080;

    #[test]
    fn mirrored_lane_centers_on_the_image() {
        let lane = (
            Line::new(0, 380, 1920, 2300, H),  // slope 1, x=700 at the bottom
            Line::new(0, 2300, 1920, 380, H),  // slope -1, x=1220 at the bottom
        );
        let center = center_line(&lane, H).unwrap();
        assert_eq!(center.get_points(), [960, 1080, 960, 0]);
        assert_eq!(center.x_intercept(), 960.0);
        assert!(center.is_vertical());
    }

    #[test]
    fn parallel_lane_center_sits_between_boundaries() {
        let lane = (
            Line::new(0, -180, 1920, 1548, H), // slope 0.9, x=1400
            Line::new(0, -420, 1920, 1500, H), // slope 1.0, x=1500
        );
        let center = center_line(&lane, H).unwrap();
        assert_eq!(center.x_intercept(), 1450.0);
        // tops: 200 and 420
        assert_eq!(center.get_points(), [1450, 1080, 310, 0]);
    }

    #[test]
    fn picks_line_closest_to_middle() {
        let lines = vec![
            Line::new(400, 1080, 400, 0, H),
            Line::new(1000, 1080, 990, 0, H),
            Line::new(1500, 1080, 1500, 0, H),
        ];
        let picked = pick_center_line(lines, W).map(|l| l.x_intercept());
        assert_eq!(picked, Some(1000.0));
    }

    #[test]
    fn no_candidates_means_no_lane() {
        assert!(pick_center_line(Vec::new(), W).is_none());
    }

    #[test]
    fn horizontal_boundary_has_no_drawable_center() {
        let lane = (
            Line::new(0, 600, 1920, 216, H), // slope -0.2
            Line::new(0, 500, 1920, 500, H), // horizontal, sentinel intercept
        );
        assert!(center_line(&lane, H).is_none());
        assert!(center_lines(&[lane], H).is_none());
    }
}
