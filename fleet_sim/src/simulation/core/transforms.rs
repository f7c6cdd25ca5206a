// fleet_sim/src/simulation/core/transforms.rs

use bevy::prelude::*;
use fleet_core::prelude::{Pose2, PoseTree, TfProvider};
use std::ops::{Deref, DerefMut};

// =========================================================================
// == TF Tree Infrastructure (The "Service") ==
// =========================================================================

/// The Bevy resource owning the pose tree. Only the setup and pose-update
/// systems take it mutably.
#[derive(Resource, Default, Debug)]
pub struct TfTree(pub PoseTree);

impl Deref for TfTree {
    type Target = PoseTree;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for TfTree {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

// We implement the pure `TfProvider` trait for our Bevy-specific `TfTree`.
impl TfProvider for TfTree {
    fn get_transform(&self, name: &str) -> Option<Pose2> {
        self.0.get_transform(name)
    }

    fn robots(&self) -> Vec<String> {
        self.0.robots()
    }

    fn carrying_robot(&self, name: &str) -> Option<String> {
        self.0.carrying_robot(name)
    }
}
