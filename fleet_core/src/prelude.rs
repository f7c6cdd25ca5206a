// fleet_core/src/prelude.rs

// --- Core Abstractions (the seams the adapter plugs into) ---
pub use crate::discovery::{ActuatorValueSource, DeviceDiscovery};
pub use crate::types::{Pose2, TfProvider};

// --- Core Data Structures ---
pub use crate::declaration::{
    Declaration, DeviceType, EffectorClass, Properties, PropertyValue, RawDeclaration, SensorClass,
};
pub use crate::discovery::{ConnectedDevice, HostInfo, HostKind, StaticDiscovery};
pub use crate::error::{SimError, SimResult};
pub use crate::messages::Notification;
pub use crate::registry::{DeclarationRegistry, DeclareOutcome};
pub use crate::tf::{PoseTree, SetupReport};

// --- Engine Operations ---
pub use crate::affect::{AffectContext, Affection, Affections, CrossingTracker};
pub use crate::detection::{
    simulated_detection, DetectionKind, DetectionOutcome, DetectionReport, LuminosityState,
};
