// fleet_core/src/geometry.rs

//! Planar geometry used by the affectability handlers. Everything here is a
//! pure function over `nalgebra::Point2<f64>`.

use nalgebra::Point2;
use std::f64::consts::TAU;

/// Turn direction of an ordered point triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

/// Euclidean distance between two points.
pub fn distance(a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    nalgebra::distance(a, b)
}

/// Bearing of `to` as seen from `from`, in `(-π, π]`.
pub fn bearing(from: &Point2<f64>, to: &Point2<f64>) -> f64 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Orientation of the triplet `(p, q, r)` from the sign of the 2-D cross
/// product of `pq` and `qr`.
pub fn orientation(p: &Point2<f64>, q: &Point2<f64>, r: &Point2<f64>) -> Orientation {
    let cross = (q - p).perp(&(r - q));
    if cross > 0.0 {
        Orientation::CounterClockwise
    } else if cross < 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

/// Given collinear `p`, `q`, `r`, checks whether `q` lies on segment `pr`.
pub fn on_segment(p: &Point2<f64>, q: &Point2<f64>, r: &Point2<f64>) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// True if segment `p1q1` intersects segment `p2q2`, touching included.
pub fn segments_intersect(
    p1: &Point2<f64>,
    q1: &Point2<f64>,
    p2: &Point2<f64>,
    q2: &Point2<f64>,
) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    // Collinear special cases: an endpoint of one segment lies on the other.
    (o1 == Orientation::Collinear && on_segment(p1, p2, q1))
        || (o2 == Orientation::Collinear && on_segment(p1, q2, q1))
        || (o3 == Orientation::Collinear && on_segment(p2, p1, q2))
        || (o4 == Orientation::Collinear && on_segment(p2, q1, q2))
}

/// True if `angle` falls strictly inside the open window `(min, max)`.
///
/// Bearings live in `(-π, π]` while the window bounds are unbounded sums of a
/// heading and half a field of view, so the window may straddle the `±π`
/// seam. Checking the angle and both of its `2π` rotations covers that case
/// without normalizing either side.
pub fn angle_in_arc(angle: f64, min: f64, max: f64) -> bool {
    [angle, angle + TAU, angle - TAU]
        .iter()
        .any(|a| *a > min && *a < max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    #[test]
    fn distance_is_euclidean() {
        assert_abs_diff_eq!(distance(&p(0.0, 0.0), &p(3.0, 4.0)), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn orientation_follows_cross_product_sign() {
        assert_eq!(
            orientation(&p(0.0, 0.0), &p(1.0, 0.0), &p(1.0, 1.0)),
            Orientation::CounterClockwise
        );
        assert_eq!(
            orientation(&p(0.0, 0.0), &p(1.0, 0.0), &p(1.0, -1.0)),
            Orientation::Clockwise
        );
        assert_eq!(
            orientation(&p(0.0, 0.0), &p(1.0, 0.0), &p(2.0, 0.0)),
            Orientation::Collinear
        );
    }

    #[test]
    fn crossing_segments_intersect() {
        assert!(segments_intersect(
            &p(0.0, 0.0),
            &p(10.0, 0.0),
            &p(5.0, -1.0),
            &p(5.0, 1.0)
        ));
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        assert!(!segments_intersect(
            &p(0.0, 0.0),
            &p(10.0, 0.0),
            &p(5.0, 1.0),
            &p(5.0, 2.0)
        ));
    }

    #[test]
    fn collinear_overlap_counts_as_intersection() {
        assert!(segments_intersect(
            &p(0.0, 0.0),
            &p(10.0, 0.0),
            &p(8.0, 0.0),
            &p(12.0, 0.0)
        ));
        assert!(!segments_intersect(
            &p(0.0, 0.0),
            &p(10.0, 0.0),
            &p(11.0, 0.0),
            &p(12.0, 0.0)
        ));
    }

    #[test]
    fn touching_endpoint_counts_as_intersection() {
        assert!(segments_intersect(
            &p(0.0, 0.0),
            &p(10.0, 0.0),
            &p(10.0, 0.0),
            &p(10.0, 5.0)
        ));
    }

    #[test]
    fn arc_window_is_open() {
        assert!(angle_in_arc(0.0, -0.1, 0.1));
        assert!(!angle_in_arc(0.1, -0.1, 0.1));
        assert!(!angle_in_arc(-0.1, -0.1, 0.1));
    }

    #[test]
    fn arc_window_straddling_the_seam() {
        let heading = PI - 0.05;
        let half_fov = 10f64.to_radians() / 2.0;
        assert!(angle_in_arc(-PI + 0.02, heading - half_fov, heading + half_fov));
        assert!(!angle_in_arc(-PI + 0.2, heading - half_fov, heading + half_fov));
    }

    #[test]
    fn arc_window_below_negative_pi() {
        // Heading -π + 0.01 with a 20° window reaches below -π.
        let heading = -PI + 0.01;
        let half_fov = 10f64.to_radians();
        assert!(angle_in_arc(PI - 0.05, heading - half_fov, heading + half_fov));
    }

    #[test]
    fn bearing_uses_atan2() {
        assert_abs_diff_eq!(bearing(&p(0.0, 0.0), &p(0.0, 2.0)), PI / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bearing(&p(1.0, 1.0), &p(0.0, 1.0)), PI, epsilon = 1e-12);
    }
}
