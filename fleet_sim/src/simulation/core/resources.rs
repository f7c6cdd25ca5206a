// fleet_sim/src/simulation/core/resources.rs

//! Engine state owned by the Bevy `World`. Handing these out as `Res`/`ResMut`
//! is what serializes writers against readers.

use bevy::prelude::*;
use fleet_core::prelude::*;
use std::collections::HashMap;

#[derive(Resource, Default, Debug)]
pub struct Declarations(pub DeclarationRegistry);

/// Per-alarm robot position samples for the line-crossing handler.
#[derive(Resource, Default, Debug)]
pub struct CrossingSamples(pub CrossingTracker);

/// Per-camera smoothed luminosity.
#[derive(Resource, Default, Debug)]
pub struct CameraLuminosity(pub LuminosityState);

/// Latest reported value of every live actuator. Empty until the actuator's
/// first `ActuatorValueReport`.
#[derive(Resource, Default, Debug)]
pub struct ActuatorValues(pub HashMap<String, Properties>);

impl ActuatorValueSource for ActuatorValues {
    fn current_value(&self, actuator: &str) -> SimResult<Properties> {
        self.0
            .get(actuator)
            .cloned()
            .ok_or_else(|| SimError::LiveValue {
                name: actuator.to_string(),
                reason: "actuator has not reported a value".to_string(),
            })
    }
}

/// The device-discovery collaborator.
#[derive(Resource)]
pub struct Discovery(pub Box<dyn DeviceDiscovery + Send + Sync>);

impl Default for Discovery {
    fn default() -> Self {
        Self(Box::new(StaticDiscovery::default()))
    }
}

impl Discovery {
    /// Discovered device names that have not been declared yet.
    pub fn undeclared(&self, registry: &DeclarationRegistry) -> Vec<String> {
        self.0
            .device_names()
            .into_iter()
            .filter(|name| !registry.contains(name))
            .collect()
    }
}
