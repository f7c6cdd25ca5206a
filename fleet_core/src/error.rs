// fleet_core/src/error.rs

use thiserror::Error;

/// Every failure the engine can report to a caller.
///
/// Schema violations on declare never reach this type: they are rejected while
/// deserializing the raw declaration, before the registry sees anything.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("unknown device '{0}'")]
    UnknownDevice(String),

    #[error("malformed declaration '{name}': {reason}")]
    MalformedDeclaration { name: String, reason: String },

    #[error("device '{0}' is not a sensor with an affectability model")]
    NotASensor(String),

    #[error("device '{name}' does not support '{kind}' detection")]
    UnsupportedDetection { name: String, kind: String },

    #[error("device '{name}' is missing required field '{field}'")]
    MissingField { name: String, field: &'static str },

    #[error("live value query for actuator '{name}' failed: {reason}")]
    LiveValue { name: String, reason: String },

    #[error("alarm '{name}' has an invalid segment: {reason}")]
    InvalidSegment { name: String, reason: String },
}

pub type SimResult<T> = Result<T, SimError>;
