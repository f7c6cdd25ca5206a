// fleet_sim/src/simulation/core/simulation_setup.rs

use fleet_core::discovery::StaticDiscovery;

use crate::prelude::*;
use crate::simulation::core::events::*;
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::core::resources::{
    ActuatorValues, CameraLuminosity, CrossingSamples, Declarations, Discovery,
};
use crate::simulation::core::topics::TopicBus;
use crate::simulation::core::transforms::TfTree;

pub struct SimulationSetupPlugin;

impl Plugin for SimulationSetupPlugin {
    fn build(&self, app: &mut App) {
        // This plugin's job is to read the config and add resources and the
        // setup system. A missing config means an empty default scenario.
        let config = app
            .world()
            .get_resource::<ScenarioConfig>()
            .cloned()
            .unwrap_or_default();

        // --- 1. Add the Deterministic PRNG Resource ---
        app.insert_resource(SimulationRng::seeded(config.simulation.seed));

        // --- 2. Engine state ---
        app.insert_resource(CameraLuminosity(LuminosityState::new(
            config.world.ambient_luminosity,
        )));
        if !app.world().contains_resource::<Discovery>() {
            app.insert_resource(Discovery(Box::new(StaticDiscovery(config.hosts.clone()))));
        }
        app.init_resource::<Declarations>()
            .init_resource::<TfTree>()
            .init_resource::<CrossingSamples>()
            .init_resource::<ActuatorValues>()
            .init_resource::<TopicBus>();

        // --- 3. Endpoints and streams ---
        app.add_event::<DeclareRequest>()
            .add_event::<DeclareReply>()
            .add_event::<GetDeclarationsRequest>()
            .add_event::<DeclarationsReply>()
            .add_event::<GetTfRequest>()
            .add_event::<TfReply>()
            .add_event::<GetAffectionsRequest>()
            .add_event::<AffectionsReply>()
            .add_event::<DetectionRequest>()
            .add_event::<DetectionReply>()
            .add_event::<HostPoseEvent>()
            .add_event::<PanTiltEvent>()
            .add_event::<ActuatorValueReport>()
            .add_event::<NotificationEvent>();

        // --- 4. The per-frame graph ---
        app.configure_sets(
            Update,
            (
                EngineSet::Ingest,
                EngineSet::Setup,
                EngineSet::PoseUpdates,
                EngineSet::Queries,
                EngineSet::Publish,
            )
                .chain(),
        );

        app.add_systems(
            Update,
            setup_when_all_declared
                .in_set(EngineSet::Setup)
                .run_if(in_state(AppState::Declaring)),
        );
    }
}

/// Runs pose tree setup once every device discovery reports has been
/// declared, then moves the app into `Running`.
fn setup_when_all_declared(
    discovery: Res<Discovery>,
    declarations: Res<Declarations>,
    mut tf: ResMut<TfTree>,
    mut next_state: ResMut<NextState<AppState>>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    let pending = discovery.undeclared(&declarations.0);
    if !pending.is_empty() {
        return;
    }

    let (tree, report) = PoseTree::setup(declarations.0.declarations(), discovery.0.as_ref());
    for host in &report.inconsistencies {
        warn!(
            "[SETUP] Host '{}' is referenced by a declaration but is neither declared nor a discovered robot.",
            host
        );
    }
    info!(
        "[SETUP] Pose tree built: {} declaration(s), {} robot(s), {} pan-tilt(s).",
        declarations.0.len(),
        report.robots.len(),
        report.pan_tilts.len()
    );
    tf.0 = tree;

    for decl in declarations.0.declarations() {
        if let Ok(pose) = tf.get_tf(&decl.name) {
            notifications.write(NotificationEvent(Notification::PoseChanged {
                name: decl.name.clone(),
                pose,
            }));
        }
    }

    info!("Setup complete. Transitioning to Running state.");
    next_state.set(AppState::Running);
}
