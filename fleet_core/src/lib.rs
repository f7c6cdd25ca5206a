// fleet_core/src/lib.rs

// Pure engine: declarations, pose composition, affectability, detection.
// No I/O and no logging; every failure is returned as a `SimError`.
pub mod affect;
pub mod declaration;
pub mod detection;
pub mod discovery;
pub mod error;
pub mod geometry;
pub mod messages;
pub mod prelude;
pub mod registry;
pub mod tf;
pub mod types;
