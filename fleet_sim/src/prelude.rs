// fleet_sim/src/prelude.rs

// Re-export the entire Bevy prelude for convenience.
pub use bevy::prelude::*;

// Re-export the entire fleet_core prelude so plugins can reach pure types
// like `Declaration`, `PoseTree` and `Affection` directly.
pub use fleet_core::prelude::*;

// Common engine-specific types.
pub use crate::simulation::config::structs::ScenarioConfig;
pub use crate::simulation::core::app_state::{AppState, EngineSet};
pub use crate::simulation::core::transforms::TfTree;
