// fleet_core/src/affect/mod.rs

//! Affectability: which declared actors, effectors and robots currently
//! influence a sensor, and by how much.
//!
//! Each `SensorClass` maps to exactly one `Handler` through `handler_for`;
//! the handler decides the influence model and its fixed candidate set.

pub mod arc;
pub mod area;
pub mod linear;
pub mod ranged;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::declaration::{Declaration, DeviceType, EffectorClass, SensorClass};
use crate::discovery::ActuatorValueSource;
use crate::error::{SimError, SimResult};
use crate::registry::DeclarationRegistry;
use crate::types::{Pose2, TfProvider};

pub use arc::ArcedAffection;
pub use area::PresenceAffection;
pub use linear::{CrossingAffection, CrossingTracker};
pub use ranged::RangedAffection;

/// Peer name -> how that peer affects the queried sensor.
pub type Affections = BTreeMap<String, Affection>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Affection {
    Ranged(RangedAffection),
    Arced(ArcedAffection),
    Presence(PresenceAffection),
    Crossing(CrossingAffection),
}

impl Affection {
    /// The peer's kind: actor kind, effector class, or `robot`.
    pub fn kind(&self) -> &str {
        match self {
            Affection::Ranged(a) => &a.kind,
            Affection::Arced(a) => &a.kind,
            Affection::Presence(a) => &a.kind,
            Affection::Crossing(a) => &a.kind,
        }
    }

    /// Distance to the peer, where the model has one.
    pub fn distance(&self) -> Option<f64> {
        match self {
            Affection::Ranged(a) => Some(a.distance),
            Affection::Arced(a) => Some(a.distance),
            Affection::Presence(a) => Some(a.distance),
            Affection::Crossing(_) => None,
        }
    }
}

/// A category of peer that may affect a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    Actor(&'static str),
    Effector(EffectorClass),
    Robots,
}

pub const TEMPERATURE_CANDIDATES: &[Candidate] = &[
    Candidate::Effector(EffectorClass::Thermostat),
    Candidate::Actor("fire"),
];
pub const HUMIDITY_CANDIDATES: &[Candidate] = &[
    Candidate::Effector(EffectorClass::Humidifier),
    Candidate::Actor("water"),
];
pub const GAS_CANDIDATES: &[Candidate] = &[Candidate::Actor("human"), Candidate::Actor("fire")];
pub const LIGHT_CANDIDATES: &[Candidate] = &[
    Candidate::Effector(EffectorClass::Leds),
    Candidate::Actor("fire"),
];
pub const MICROPHONE_CANDIDATES: &[Candidate] =
    &[Candidate::Actor("human"), Candidate::Actor("sound_source")];
pub const CAMERA_CANDIDATES: &[Candidate] = &[
    Candidate::Actor("human"),
    Candidate::Actor("qr"),
    Candidate::Actor("barcode"),
    Candidate::Actor("color"),
    Candidate::Actor("text"),
    Candidate::Robots,
];
pub const RFID_CANDIDATES: &[Candidate] = &[Candidate::Actor("rfid_tag")];

/// The influence model used for a sensor class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Ranged(&'static [Candidate]),
    Arced(&'static [Candidate]),
    Presence,
    Crossing,
}

pub fn handler_for(class: SensorClass) -> Handler {
    match class {
        SensorClass::Temperature => Handler::Ranged(TEMPERATURE_CANDIDATES),
        SensorClass::Humidity => Handler::Ranged(HUMIDITY_CANDIDATES),
        SensorClass::Gas => Handler::Ranged(GAS_CANDIDATES),
        SensorClass::Light => Handler::Ranged(LIGHT_CANDIDATES),
        SensorClass::Microphone => Handler::Ranged(MICROPHONE_CANDIDATES),
        SensorClass::Camera => Handler::Arced(CAMERA_CANDIDATES),
        SensorClass::RfidReader => Handler::Arced(RFID_CANDIDATES),
        SensorClass::Proximity | SensorClass::AreaAlarm => Handler::Presence,
        SensorClass::LinearAlarm => Handler::Crossing,
    }
}

/// Read-only view of everything an affectability query needs.
pub struct AffectContext<'a> {
    pub registry: &'a DeclarationRegistry,
    pub tf: &'a dyn TfProvider,
    pub actuators: &'a dyn ActuatorValueSource,
}

impl<'a> AffectContext<'a> {
    pub fn new(
        registry: &'a DeclarationRegistry,
        tf: &'a dyn TfProvider,
        actuators: &'a dyn ActuatorValueSource,
    ) -> Self {
        Self {
            registry,
            tf,
            actuators,
        }
    }

    /// Dispatches to the handler selected by the device's declared class.
    pub fn affections(&self, name: &str, crossings: &mut CrossingTracker) -> SimResult<Affections> {
        let sensor = self.registry.require(name)?;
        let class = sensor
            .sensor_class()
            .ok_or_else(|| SimError::NotASensor(name.to_string()))?;

        match handler_for(class) {
            Handler::Ranged(candidates) => ranged::affections(self, sensor, candidates),
            Handler::Arced(candidates) => arc::affections(self, sensor, candidates),
            Handler::Presence => area::affections(self, sensor),
            Handler::Crossing => linear::affections(self, sensor, crossings),
        }
    }

    pub(crate) fn pose_of(&self, decl: &Declaration) -> SimResult<Pose2> {
        self.tf
            .get_transform(&decl.name)
            .ok_or_else(|| SimError::UnknownDevice(decl.name.clone()))
    }

    /// Declarations in the given candidate set, using the per-type index.
    /// `Candidate::Robots` contributes nothing here: robots are not
    /// declarations and are enumerated through the transform provider.
    pub(crate) fn declared_candidates(
        &self,
        candidates: &'static [Candidate],
    ) -> impl Iterator<Item = &'a Declaration> + 'a {
        let registry = self.registry;
        candidates.iter().flat_map(move |c| {
            let found: Vec<&'a Declaration> = match c {
                Candidate::Actor(kind) => registry.iter_in(DeviceType::Actor, kind).collect(),
                Candidate::Effector(class) => registry
                    .iter_in(DeviceType::Env, class.class_name())
                    .chain(registry.iter_in(DeviceType::Robot, class.class_name()))
                    .collect(),
                Candidate::Robots => Vec::new(),
            };
            found
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{actor, env, World};
    use super::*;

    #[test]
    fn dispatch_uses_the_declared_class() {
        let world = World::build(
            &[
                &env("temp_1", "temperature", 0.0, 0.0, ""),
                &actor("fire_1", "fire", 1.0, 0.0, 4.0),
                &actor("h1", "human", 1.0, 0.0, 4.0),
            ],
            &[],
        );
        let mut crossings = CrossingTracker::default();
        let result = world.ctx().affections("temp_1", &mut crossings).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result["fire_1"].kind(), "fire");
    }

    #[test]
    fn non_sensors_are_rejected() {
        let world = World::build(&[&actor("h1", "human", 0.0, 0.0, 1.0)], &[]);
        let mut crossings = CrossingTracker::default();
        assert_eq!(
            world.ctx().affections("h1", &mut crossings),
            Err(SimError::NotASensor("h1".to_string()))
        );
    }

    #[test]
    fn unknown_sensors_are_rejected() {
        let world = World::build(&[], &[]);
        let mut crossings = CrossingTracker::default();
        assert_eq!(
            world.ctx().affections("ghost", &mut crossings),
            Err(SimError::UnknownDevice("ghost".to_string()))
        );
    }

    #[test]
    fn every_sensor_class_has_a_handler() {
        assert_eq!(handler_for(SensorClass::Gas), Handler::Ranged(GAS_CANDIDATES));
        assert_eq!(handler_for(SensorClass::Camera), Handler::Arced(CAMERA_CANDIDATES));
        assert_eq!(handler_for(SensorClass::AreaAlarm), Handler::Presence);
        assert_eq!(handler_for(SensorClass::Proximity), Handler::Presence);
        assert_eq!(handler_for(SensorClass::LinearAlarm), Handler::Crossing);
    }
}
