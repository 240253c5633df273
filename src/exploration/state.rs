//! Robot state used by the exploration model

use crate::common::{Point2D, Pose2D, State};

/// Pose and kinematic limit of an omnidirectional planar robot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplorationState {
    pose: Pose2D,
    max_speed: f64,
}

impl ExplorationState {
    pub fn new(pose: Pose2D, max_speed: f64) -> Self {
        Self { pose, max_speed }
    }

    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    pub fn position(&self) -> Point2D {
        self.pose.position()
    }

    pub fn heading(&self) -> f64 {
        self.pose.yaw
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }
}

impl State for ExplorationState {}
