use bevy::prelude::Resource;
use clap::Parser;
use std::path::PathBuf;

/// Fleet: a planar spatial-transform and affectability engine for simulated
/// robots and smart-environment devices.
#[derive(Parser, Debug, Resource, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/showroom.toml")]
    pub scenario: PathBuf,

    /// Stop after this many engine ticks instead of running forever.
    #[arg(long)]
    pub frames: Option<u32>,
}
