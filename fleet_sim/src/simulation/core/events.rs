// fleet_sim/src/simulation/core/events.rs

//! The engine's endpoints as Bevy events. Every request carries a
//! `request_id`, echoed by exactly one reply.

use bevy::prelude::Event;
use figment::value::Value;
use fleet_core::affect::Affections;
use fleet_core::declaration::{Declaration, Properties};
use fleet_core::detection::{DetectionKind, DetectionOutcome};
use fleet_core::error::SimResult;
use fleet_core::messages::Notification;
use fleet_core::types::Pose2;

// --- Declaration Registry ---

/// A declaration payload exactly as it arrived on the bus.
#[derive(Event, Debug, Clone)]
pub struct DeclareRequest {
    pub request_id: u64,
    pub payload: Value,
}

/// Always empty: failures are logged, never returned to the device.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DeclareReply {
    pub request_id: u64,
}

#[derive(Event, Debug, Clone)]
pub struct GetDeclarationsRequest {
    pub request_id: u64,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct DeclarationsReply {
    pub request_id: u64,
    pub declarations: Vec<Declaration>,
}

// --- Queries ---

#[derive(Event, Debug, Clone)]
pub struct GetTfRequest {
    pub request_id: u64,
    pub name: String,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct TfReply {
    pub request_id: u64,
    pub name: String,
    pub result: SimResult<Pose2>,
}

#[derive(Event, Debug, Clone)]
pub struct GetAffectionsRequest {
    pub request_id: u64,
    pub name: String,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct AffectionsReply {
    pub request_id: u64,
    pub name: String,
    pub result: SimResult<Affections>,
}

#[derive(Event, Debug, Clone)]
pub struct DetectionRequest {
    pub request_id: u64,
    pub name: String,
    pub kind: DetectionKind,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct DetectionReply {
    pub request_id: u64,
    pub result: SimResult<DetectionOutcome>,
}

// --- Consumed Streams ---

/// A robot (or other host) pose sample. `theta` is in radians.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct HostPoseEvent {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

/// A pan-tilt pan sample, radians.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct PanTiltEvent {
    pub name: String,
    pub pan: f64,
}

/// The current value of a live actuator (thermostat set-point, led
/// luminosity, ...).
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ActuatorValueReport {
    pub name: String,
    pub values: Properties,
}

// --- Emitted ---

#[derive(Event, Debug, Clone, PartialEq)]
pub struct NotificationEvent(pub Notification);
