// fleet_sim/src/main.rs

//! Runs the engine headless against a scenario file.
//!
//! `cargo run -p fleet_sim -- --scenario assets/scenarios/showroom.toml --frames 120`

use std::time::Duration;

use bevy::{app::ScheduleRunnerPlugin, log::LogPlugin, prelude::*, state::app::StatesPlugin};
use clap::Parser;

use fleet_sim::cli::Cli;
use fleet_sim::prelude::{AppState, ScenarioConfig};
use fleet_sim::simulation::core::resources::Declarations;
use fleet_sim::simulation::core::topics::{TopicBus, TopicKind};
use fleet_sim::FleetSimulationPlugin;

fn main() {
    let cli = Cli::parse();

    // --- 1. Load Scenario Configuration ---
    let config = match ScenarioConfig::load(&cli.scenario) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Could not load scenario '{}': {}",
                cli.scenario.display(),
                e
            );
            std::process::exit(1);
        }
    };

    let mut app = App::new();

    // --- 2. Core Bevy Plugins & Resources ---
    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / 60.0,
        ))),
    )
    .add_plugins(LogPlugin {
        level: bevy::log::Level::INFO,
        filter: "info,fleet_sim=debug,fleet_core=debug".to_string(),
        ..default()
    })
    .add_plugins(StatesPlugin)
    .insert_resource(config)
    .insert_resource(cli.clone());

    app.init_state::<AppState>();

    // --- 3. The Engine ---
    app.add_plugins(FleetSimulationPlugin);

    // --- 4. Run ---
    match cli.frames {
        Some(frames) => {
            app.finish();
            app.cleanup();
            for _ in 0..frames {
                app.update();
            }
            let world = app.world();
            info!(
                "Stopped after {} ticks in {:?}: {} declarations, {} topics, {} dropped notifications",
                frames,
                world.resource::<State<AppState>>().get(),
                world.resource::<Declarations>().0.len(),
                world.resource::<TopicBus>().len(),
                world.resource::<TopicBus>().dropped()
            );
            let bus = world.resource::<TopicBus>();
            for decl in world.resource::<Declarations>().0.declarations() {
                debug!(
                    "  {}: pose {:?}, detection {:?}",
                    decl.name,
                    bus.topics_of(&decl.name, TopicKind::Pose),
                    bus.topics_of(&decl.name, TopicKind::Detection)
                );
            }
        }
        None => {
            app.run();
        }
    }
}
