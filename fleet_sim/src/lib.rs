// fleet_sim/src/lib.rs

use bevy::prelude::*;

use crate::simulation::config::ConfigPlugin;
use crate::simulation::core::simulation_setup::SimulationSetupPlugin;
use crate::simulation::plugins::declarations::DeclarationsPlugin;
use crate::simulation::plugins::notifications::NotificationsPlugin;
use crate::simulation::plugins::poses::PosesPlugin;
use crate::simulation::plugins::queries::QueriesPlugin;

// This prelude is for convenience for other files WITHIN the fleet_sim crate.
pub mod prelude;

pub mod cli;
pub mod simulation;

/// The main plugin that brings together every engine part.
/// `main.rs` only adds this one plugin to the Bevy App.
pub struct FleetSimulationPlugin;

impl Plugin for FleetSimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            // Queues the scenario's declarations.
            ConfigPlugin,
            // Owns the engine resources, events and the setup system.
            SimulationSetupPlugin,
            // Endpoints and streams.
            DeclarationsPlugin,
            PosesPlugin,
            QueriesPlugin,
            // Outgoing notifications on the topic bus.
            NotificationsPlugin,
        ));
    }
}
