//! Bezier curve evaluation for quality → lifetime mapping.
//!
//! Component quality is mapped onto a mean lifetime (in days) through a
//! cubic Bezier polygon evaluated with de Casteljau's algorithm. Only the
//! `y` coordinate of the result is consumed by the decay model; the `x`
//! coordinates shape the curve but are otherwise ignored.
//!
//! ```
//! use partwear_logic::curve::{evaluate, Point};
//!
//! let line = [
//!     Point::new(0.0, 0.0),
//!     Point::new(1.0, 1.0),
//!     Point::new(2.0, 2.0),
//!     Point::new(3.0, 3.0),
//! ];
//! assert_eq!(evaluate(&line, 0.5), Point::new(1.5, 1.5));
//! ```

use serde::{Deserialize, Serialize};

/// Lifetime in days of a perfect (100% quality) component.
pub const DEFAULT_LIFETIME_PERFECT: f64 = 425.0;

/// Lifetime in days of a terrible (0% quality) component.
pub const DEFAULT_LIFETIME_TERRIBLE: f64 = 43.0;

/// 2D control point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `other`. `t` is not clamped.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Evaluate a cubic Bezier polygon at `t`.
///
/// `t` outside [0, 1] extrapolates. At `t = 0` and `t = 1` the first and
/// last control points are returned exactly.
pub fn evaluate(points: &[Point; 4], t: f64) -> Point {
    casteljau(points, points.len() - 1, 0, t)
}

/// Evaluate a Bezier polygon of any order. Returns `None` for an empty slice.
pub fn evaluate_slice(points: &[Point], t: f64) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    Some(casteljau(points, points.len() - 1, 0, t))
}

fn casteljau(points: &[Point], r: usize, i: usize, t: f64) -> Point {
    if r == 0 {
        return points[i];
    }
    let p1 = casteljau(points, r - 1, i, t);
    let p2 = casteljau(points, r - 1, i + 1, t);
    p1.lerp(p2, t)
}

/// Shared, read-only reliability curve mapping quality to lifetime in days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityCurve {
    pub points: [Point; 4],
}

impl ReliabilityCurve {
    /// Build the standard lifetime curve from its two endpoints.
    ///
    /// The polygon holds the terrible lifetime across the low-quality end
    /// and rises to the perfect lifetime at the top end.
    pub fn from_lifetimes(lifetime_perfect: f64, lifetime_terrible: f64) -> Self {
        Self {
            points: [
                Point::new(0.0, lifetime_terrible),
                Point::new(0.75, lifetime_terrible),
                Point::new(0.25, lifetime_perfect),
                Point::new(1.0, lifetime_perfect),
            ],
        }
    }

    /// Lifetime in days for a quality fraction.
    pub fn lifetime_days(&self, quality: f32) -> f64 {
        evaluate(&self.points, quality as f64).y
    }
}

impl Default for ReliabilityCurve {
    fn default() -> Self {
        Self::from_lifetimes(DEFAULT_LIFETIME_PERFECT, DEFAULT_LIFETIME_TERRIBLE)
    }
}
