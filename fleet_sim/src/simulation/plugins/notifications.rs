// fleet_sim/src/simulation/plugins/notifications.rs

//! Publishes engine notifications on the topic bus under each device's
//! base topic. Delivery is best effort.

use crate::prelude::*;
use crate::simulation::core::events::NotificationEvent;
use crate::simulation::core::resources::Declarations;
use crate::simulation::core::topics::{TopicBus, TopicKind};

pub struct NotificationsPlugin;

impl Plugin for NotificationsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, publish_notifications.in_set(EngineSet::Publish));
    }
}

fn publish_notifications(
    mut notifications: EventReader<NotificationEvent>,
    declarations: Res<Declarations>,
    mut bus: ResMut<TopicBus>,
) {
    for NotificationEvent(notification) in notifications.read() {
        let device = notification.device();
        let base_topic = declarations
            .0
            .get(device)
            .and_then(|d| d.base_topic.as_deref());
        let topic = notification.topic(base_topic);
        let kind = match notification {
            Notification::PoseChanged { .. } => TopicKind::Pose,
            _ => TopicKind::Detection,
        };

        if let Err(e) = bus.publish(&topic, kind, device, notification.clone()) {
            warn!("[BUS] Could not publish on '{}': {:?}", topic, e);
        }
    }
}
