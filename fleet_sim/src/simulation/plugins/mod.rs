// fleet_sim/src/simulation/plugins/mod.rs

pub mod declarations;
pub mod notifications;
pub mod poses;
pub mod queries;
