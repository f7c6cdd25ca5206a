// fleet_core/src/types.rs

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// --- Core Pose Type ---
/// A planar pose. `theta` is in radians and is `None` for devices without a
/// bearing (most actors, omnidirectional sensors).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2 {
    pub x: f64,
    pub y: f64,
    pub theta: Option<f64>,
}

impl Pose2 {
    pub fn new(x: f64, y: f64, theta: Option<f64>) -> Self {
        Self { x, y, theta }
    }

    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

// --- Core Trait for Transform Lookups ---
// Affectability only ever needs world-frame poses, so this is the whole seam
// between the handlers and whoever owns the pose tree.
pub trait TfProvider {
    /// The absolute (world frame) pose of `name`, if it is known.
    fn get_transform(&self, name: &str) -> Option<Pose2>;

    /// Names of every robot the provider knows about.
    fn robots(&self) -> Vec<String>;

    /// The robot ultimately carrying `name`, if any.
    fn carrying_robot(&self, name: &str) -> Option<String>;
}
