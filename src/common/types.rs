//! Common types used throughout frontier_mcts

use std::fmt;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// 2D pose (position + orientation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.yaw)
    }

    /// Translate the pose by `displacement` along the absolute direction `angle`.
    /// Heading is left untouched (omnidirectional motion).
    pub fn translated(&self, displacement: f64, angle: f64) -> Pose2D {
        let offset = Vector3::new(displacement * angle.cos(), displacement * angle.sin(), 0.0);
        Pose2D::from(self.to_vector() + offset)
    }
}

impl From<Vector3<f64>> for Pose2D {
    fn from(v: Vector3<f64>) -> Self {
        Self { x: v[0], y: v[1], yaw: v[2] }
    }
}

/// Path represented as a sequence of 2D points
#[derive(Debug, Clone, PartialEq)]
pub struct Path2D {
    pub points: Vec<Point2D>,
}

/// Upper bound on the interior samples of one straight-line path
pub const MAX_PATH_SAMPLES: usize = 10_000;

impl Path2D {
    pub fn from_points(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// Sample the segment `from -> to` every `resolution` metres.
    /// Both endpoints are always included. Long segments are sampled more
    /// coarsely so that at most [`MAX_PATH_SAMPLES`] interior points are made.
    pub fn straight_line(from: Point2D, to: Point2D, resolution: f64) -> Self {
        let d = from.distance(&to);
        let theta = (to.y - from.y).atan2(to.x - from.x);
        let mut points = vec![from];

        if resolution > 0.0 && d.is_finite() {
            let step = resolution.max(d / MAX_PATH_SAMPLES as f64);
            let n_expand = ((d / step).floor() as usize).min(MAX_PATH_SAMPLES);
            for i in 1..=n_expand {
                let s = step * i as f64;
                if s < d {
                    points.push(Point2D::new(from.x + s * theta.cos(), from.y + s * theta.sin()));
                }
            }
        }

        if d > 0.0 {
            points.push(to);
        }
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point2D> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point2D> {
        self.points.last()
    }
}

/// Axis-aligned workspace bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaBounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl AreaBounds {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        AreaBounds { xmin, xmax, ymin, ymax }
    }

    pub fn contains(&self, p: &Point2D) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }
}

/// Circular obstacle (x, y, radius)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleObstacle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl CircleObstacle {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }
}

/// Identifier of a candidate action, unique among the candidates generated
/// for one state. Ordering follows generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(pub u32);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}
