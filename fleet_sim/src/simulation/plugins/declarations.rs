// fleet_sim/src/simulation/plugins/declarations.rs

//! The declare and get-declarations endpoints, plus the live actuator value
//! cache that ranged affectability reads.

use fleet_core::declaration::RawDeclaration;
use fleet_core::registry::DeclareOutcome;

use crate::prelude::*;
use crate::simulation::core::events::*;
use crate::simulation::core::resources::{ActuatorValues, CrossingSamples, Declarations};
use crate::simulation::core::transforms::TfTree;

pub struct DeclarationsPlugin;

impl Plugin for DeclarationsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                (handle_declare_requests, ingest_actuator_reports)
                    .chain()
                    .in_set(EngineSet::Ingest),
                answer_get_declarations.in_set(EngineSet::Queries),
            ),
        );
    }
}

fn handle_declare_requests(
    mut requests: EventReader<DeclareRequest>,
    mut replies: EventWriter<DeclareReply>,
    mut declarations: ResMut<Declarations>,
    mut actuators: ResMut<ActuatorValues>,
    mut crossings: ResMut<CrossingSamples>,
    mut tf: ResMut<TfTree>,
    state: Res<State<AppState>>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    for request in requests.read() {
        replies.write(DeclareReply {
            request_id: request.request_id,
        });

        // Unknown keys fail here, before the registry sees anything.
        let raw: RawDeclaration = match request.payload.deserialize() {
            Ok(raw) => raw,
            Err(e) => {
                error!("[DECLARE] Rejected declaration payload: {}", e);
                continue;
            }
        };

        let decl = match Declaration::from_raw(raw) {
            Ok(decl) => decl,
            Err(e) => {
                error!("[DECLARE] {}", e);
                continue;
            }
        };
        if let DeclareOutcome::Replaced(_) = declarations.0.insert(decl.clone()) {
            warn!(
                "[DECLARE] '{}' was already declared; the new declaration replaces it.",
                decl.name
            );
            crossings.0.reset(&decl.name);
            actuators.0.remove(&decl.name);
        }

        debug!("[DECLARE] Declared '{}' ({:?}).", decl.name, decl.device_type);

        // After setup, new devices join the tree immediately.
        if *state.get() == AppState::Running {
            for name in tf.attach(&decl) {
                if let Ok(pose) = tf.get_tf(&name) {
                    notifications.write(NotificationEvent(Notification::PoseChanged { name, pose }));
                }
            }
        }
    }
}

fn ingest_actuator_reports(
    mut reports: EventReader<ActuatorValueReport>,
    declarations: Res<Declarations>,
    mut actuators: ResMut<ActuatorValues>,
) {
    for report in reports.read() {
        if !declarations.0.has_live_channel(&report.name) {
            warn!(
                "[ACTUATOR] Ignoring value report from '{}', which has no live value.",
                report.name
            );
            continue;
        }
        actuators
            .0
            .entry(report.name.clone())
            .or_default()
            .extend(report.values.clone());
    }
}

fn answer_get_declarations(
    mut requests: EventReader<GetDeclarationsRequest>,
    mut replies: EventWriter<DeclarationsReply>,
    declarations: Res<Declarations>,
) {
    for request in requests.read() {
        replies.write(DeclarationsReply {
            request_id: request.request_id,
            declarations: declarations.0.declarations().to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::test_support::{declare, engine_app, replies};

    #[test]
    fn unknown_fields_are_rejected_and_not_stored() {
        let mut app = engine_app("", AppState::Running);
        declare(
            &mut app,
            7,
            r#"
            type = "actor"
            name = "h1"
            subtype = "human"
            mood = "cheerful"
            "#,
        );
        app.world_mut()
            .send_event(GetDeclarationsRequest { request_id: 8 });
        app.update();

        assert_eq!(replies::<DeclareReply>(&app), [DeclareReply { request_id: 7 }]);
        let listed = replies::<DeclarationsReply>(&app);
        assert_eq!(listed.len(), 1);
        assert!(listed[0].declarations.is_empty());
    }

    #[test]
    fn live_actuators_wait_for_their_first_report() {
        let mut app = engine_app("", AppState::Running);
        declare(
            &mut app,
            1,
            r#"
            type = "env"
            name = "th_1"
            subtype = { category = "actuator", class = "thermostat" }
            range = 5.0
            properties = { temperature = 22.0 }
            "#,
        );
        app.update();
        assert!(matches!(
            app.world().resource::<ActuatorValues>().current_value("th_1"),
            Err(SimError::LiveValue { .. })
        ));

        app.world_mut().send_event(ActuatorValueReport {
            name: "th_1".to_string(),
            values: Properties::from([("temperature".to_string(), PropertyValue::Float(18.5))]),
        });
        app.update();
        let value = app
            .world()
            .resource::<ActuatorValues>()
            .current_value("th_1")
            .unwrap();
        assert_eq!(value["temperature"], PropertyValue::Float(18.5));
    }

    #[test]
    fn late_declarations_join_the_tree() {
        let mut app = engine_app("", AppState::Running);
        declare(
            &mut app,
            1,
            r#"
            type = "env"
            name = "fire_alarm"
            subtype = { category = "sensor", class = "area_alarm" }
            pose = { x = 3.0, y = 4.0 }
            range = 2.0
            "#,
        );
        app.update();
        let pose = app.world().resource::<TfTree>().get_tf("fire_alarm").unwrap();
        assert_eq!((pose.x, pose.y), (3.0, 4.0));
    }
}
