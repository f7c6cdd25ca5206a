// fleet_sim/src/simulation/core/app_state.rs

use bevy::{ecs::schedule::SystemSet, prelude::States};

/// Defines the major phases of the application's lifecycle.
#[derive(States, Debug, Clone, Eq, PartialEq, Hash, Default)]
pub enum AppState {
    /// The initial state. The scenario's declarations are queued here.
    #[default]
    Loading,

    /// Declarations are accepted; setup has not run yet. Setup runs as soon
    /// as every device that discovery reports has been declared.
    Declaring,

    /// The pose tree is built. Pose streams are applied and queries answered.
    Running,
}

// =========================================================================
// == Engine Sets (The per-frame "Data Flow Graph") ==
// =========================================================================

/// The `Update` schedule runs these in order. Only `Ingest`, `Setup` and
/// `PoseUpdates` write `Declarations` or `TfTree`. `Queries` reads them and
/// only writes its own caches (crossing samples, camera luminosity, rng).
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum EngineSet {
    /// Declare requests and actuator value reports.
    Ingest,
    /// One-shot pose tree setup, gated on discovery.
    Setup,
    /// Host pose and pan streams.
    PoseUpdates,
    /// `get_tf`, `get_declarations`, `get_affections`, `simulated_detection`.
    Queries,
    /// Flush notifications to the topic bus.
    Publish,
}
