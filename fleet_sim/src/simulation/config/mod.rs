// fleet_sim/src/simulation/config/mod.rs

//! Loading the scenario file and queuing every declaration it names (inline
//! and from the devices directory) for the declare endpoint.

mod devices;

pub mod structs;

use bevy::prelude::*;
use figment::{
    providers::{Format, Toml},
    Figment,
};
use std::path::Path;

use crate::simulation::core::app_state::AppState;
use crate::simulation::core::events::DeclareRequest;
pub use devices::load_device_files;
pub use structs::{ScenarioConfig, SimulationSection, WorldSection};

impl ScenarioConfig {
    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        Figment::new().merge(Toml::file(path)).extract()
    }

    pub fn from_toml_str(src: &str) -> Result<Self, figment::Error> {
        Figment::new().merge(Toml::string(src)).extract()
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ScenarioConfig>().add_systems(
            OnEnter(AppState::Loading),
            (queue_scenario_declarations, transition_to_declaring).chain(),
        );
    }
}

/// Feeds every configured declaration through the same declare endpoint that
/// external devices use. Request ids are the position in the queue.
fn queue_scenario_declarations(
    config: Res<ScenarioConfig>,
    mut requests: EventWriter<DeclareRequest>,
) {
    let mut payloads = config.declarations.clone();
    if let Some(dir) = &config.world.devices_dir {
        payloads.extend(load_device_files(dir));
    }

    info!(
        "Queuing {} declaration(s) from the scenario.",
        payloads.len()
    );
    for (request_id, payload) in payloads.into_iter().enumerate() {
        requests.write(DeclareRequest {
            request_id: request_id as u64,
            payload,
        });
    }
}

fn transition_to_declaring(mut next_state: ResMut<NextState<AppState>>) {
    info!("Configuration loaded. Transitioning to Declaring state.");
    next_state.set(AppState::Declaring);
}
