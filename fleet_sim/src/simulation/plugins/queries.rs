// fleet_sim/src/simulation/plugins/queries.rs

//! The affectability and simulated-detection endpoints.

use fleet_core::affect::AffectContext;

use crate::prelude::*;
use crate::simulation::core::events::*;
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::core::resources::{
    ActuatorValues, CameraLuminosity, CrossingSamples, Declarations,
};
use crate::simulation::core::transforms::TfTree;

pub struct QueriesPlugin;

impl Plugin for QueriesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (answer_get_affections, answer_detections).in_set(EngineSet::Queries),
        );
    }
}

fn answer_get_affections(
    mut requests: EventReader<GetAffectionsRequest>,
    mut replies: EventWriter<AffectionsReply>,
    declarations: Res<Declarations>,
    tf: Res<TfTree>,
    actuators: Res<ActuatorValues>,
    mut crossings: ResMut<CrossingSamples>,
) {
    let ctx = AffectContext::new(&declarations.0, &*tf, &*actuators);
    for request in requests.read() {
        let result = ctx.affections(&request.name, &mut crossings.0);
        if let Err(e) = &result {
            error!("[AFFECT] {}", e);
        }
        replies.write(AffectionsReply {
            request_id: request.request_id,
            name: request.name.clone(),
            result,
        });
    }
}

fn answer_detections(
    mut requests: EventReader<DetectionRequest>,
    mut replies: EventWriter<DetectionReply>,
    declarations: Res<Declarations>,
    tf: Res<TfTree>,
    actuators: Res<ActuatorValues>,
    mut luminosity: ResMut<CameraLuminosity>,
    mut rng: ResMut<SimulationRng>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    let ctx = AffectContext::new(&declarations.0, &*tf, &*actuators);
    for request in requests.read() {
        notifications.write(NotificationEvent(Notification::DetectionStarted {
            name: request.name.clone(),
            kind: request.kind,
        }));

        let result = simulated_detection(
            &ctx,
            &request.name,
            request.kind,
            &mut luminosity.0,
            &mut rng.0,
        );
        let result = match result {
            Ok(report) => {
                debug!(
                    "[DETECT] '{}' {} -> {}",
                    request.name,
                    request.kind.as_str(),
                    report.outcome.result
                );
                notifications.write(NotificationEvent(Notification::DetectionFinished {
                    name: request.name.clone(),
                    kind: request.kind,
                    outcome: report.outcome.clone(),
                    candidate: report.candidate.map(|(_, a)| a),
                }));
                Ok(report.outcome)
            }
            Err(e) => {
                error!("[DETECT] {}", e);
                Err(e)
            }
        };

        replies.write(DetectionReply {
            request_id: request.request_id,
            result,
        });
    }
}
