// fleet_core/src/messages.rs

use serde::Serialize;

use crate::affect::Affection;
use crate::detection::{DetectionKind, DetectionOutcome};
use crate::types::Pose2;

// =========================================================================
// == Side-Channel Notifications ==
// =========================================================================

/// Best-effort notifications emitted by the engine. Nothing in the engine
/// depends on them being delivered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    /// A device's absolute pose was rewritten by pose composition.
    PoseChanged { name: String, pose: Pose2 },
    DetectionStarted { name: String, kind: DetectionKind },
    /// Same payload as the reply, plus the candidate that won (if any).
    DetectionFinished {
        name: String,
        kind: DetectionKind,
        outcome: DetectionOutcome,
        candidate: Option<Affection>,
    },
}

impl Notification {
    /// The device the notification is about.
    pub fn device(&self) -> &str {
        match self {
            Notification::PoseChanged { name, .. }
            | Notification::DetectionStarted { name, .. }
            | Notification::DetectionFinished { name, .. } => name,
        }
    }

    /// Topic suffix under the device's base topic.
    pub fn channel(&self) -> &'static str {
        match self {
            Notification::PoseChanged { .. } => "pose",
            Notification::DetectionStarted { .. } | Notification::DetectionFinished { .. } => {
                "detection"
            }
        }
    }

    /// `<base_topic>/<channel>`, or `<device>/<channel>` without a base topic.
    pub fn topic(&self, base_topic: Option<&str>) -> String {
        let base = base_topic
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| self.device());
        format!("{}/{}", base.trim_end_matches('/'), self.channel())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_hang_off_the_base_topic() {
        let n = Notification::PoseChanged {
            name: "cam_1".to_string(),
            pose: Pose2::default(),
        };
        assert_eq!(n.topic(Some("world/cam_1/")), "world/cam_1/pose");
        assert_eq!(n.topic(None), "cam_1/pose");
        assert_eq!(n.topic(Some("")), "cam_1/pose");

        let started = Notification::DetectionStarted {
            name: "mic_1".to_string(),
            kind: DetectionKind::Sound,
        };
        assert_eq!(started.topic(Some("world/mic_1")), "world/mic_1/detection");
    }
}
