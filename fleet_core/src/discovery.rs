// fleet_core/src/discovery.rs

//! Interfaces the engine consumes but does not implement: device discovery and
//! live actuator values. The simulation crate provides the concrete sources;
//! tests provide mocks.

use serde::{Deserialize, Serialize};

use crate::declaration::{DeviceSubtype, DeviceType, Properties};
use crate::error::SimResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKind {
    Robot,
    World,
}

/// A device a host reports as connected to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectedDevice {
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    #[serde(default)]
    pub base_topic: String,
    pub categorization: DeviceSubtype,
}

impl ConnectedDevice {
    pub fn is_pan_tilt(&self) -> bool {
        self.categorization.class == "pan_tilt"
    }
}

/// A robot, or the world, together with its connected devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostInfo {
    pub name: String,
    pub kind: HostKind,
    #[serde(default)]
    pub devices: Vec<ConnectedDevice>,
}

/// The device-discovery query.
pub trait DeviceDiscovery {
    fn hosts(&self) -> Vec<HostInfo>;

    /// Every device name any host reports.
    fn device_names(&self) -> Vec<String> {
        self.hosts()
            .into_iter()
            .flat_map(|h| h.devices.into_iter().map(|d| d.name))
            .collect()
    }
}

/// The per-actuator "get current value" request/response.
pub trait ActuatorValueSource {
    fn current_value(&self, actuator: &str) -> SimResult<Properties>;
}

/// Discovery backed by a fixed list, used by tests and by headless runs
/// without a discovery service.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery(pub Vec<HostInfo>);

impl DeviceDiscovery for StaticDiscovery {
    fn hosts(&self) -> Vec<HostInfo> {
        self.0.clone()
    }
}
