// fleet_sim/src/simulation/plugins/poses.rs

//! Host pose and pan streams (the only writers of absolute poses after setup)
//! and the `get_tf` endpoint.

use crate::prelude::*;
use crate::simulation::core::events::*;
use crate::simulation::core::transforms::TfTree;

pub struct PosesPlugin;

impl Plugin for PosesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                (apply_host_poses, apply_pan_tilt_pans)
                    .chain()
                    .in_set(EngineSet::PoseUpdates)
                    .run_if(in_state(AppState::Running)),
                answer_get_tf.in_set(EngineSet::Queries),
            ),
        );
    }
}

fn notify_updated(
    tf: &TfTree,
    updated: Vec<String>,
    notifications: &mut EventWriter<NotificationEvent>,
) {
    for name in updated {
        if let Ok(pose) = tf.get_tf(&name) {
            notifications.write(NotificationEvent(Notification::PoseChanged { name, pose }));
        }
    }
}

fn apply_host_poses(
    mut poses: EventReader<HostPoseEvent>,
    mut tf: ResMut<TfTree>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    for event in poses.read() {
        match tf.on_host_pose_changed(&event.name, event.x, event.y, event.theta) {
            Ok(updated) => notify_updated(&tf, updated, &mut notifications),
            Err(e) => warn!("[POSE] Dropping pose sample: {}", e),
        }
    }
}

fn apply_pan_tilt_pans(
    mut pans: EventReader<PanTiltEvent>,
    mut tf: ResMut<TfTree>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    for event in pans.read() {
        match tf.apply_pan(&event.name, event.pan) {
            Ok(updated) => notify_updated(&tf, updated, &mut notifications),
            Err(e) => warn!("[PAN] Dropping pan sample: {}", e),
        }
    }
}

fn answer_get_tf(
    mut requests: EventReader<GetTfRequest>,
    mut replies: EventWriter<TfReply>,
    tf: Res<TfTree>,
) {
    for request in requests.read() {
        let result = tf.get_tf(&request.name);
        if let Err(e) = &result {
            error!("[TF] {}", e);
        }
        replies.write(TfReply {
            request_id: request.request_id,
            name: request.name.clone(),
            result,
        });
    }
}
