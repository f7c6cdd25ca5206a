// fleet_core/src/affect/area.rs

//! Presence sensing (area alarms, sonar/ir distance sensors): every known
//! robot inside the sensor's range, in any direction.

use serde::Serialize;

use super::{AffectContext, Affection, Affections};
use crate::declaration::Declaration;
use crate::error::{SimError, SimResult};
use crate::geometry::distance;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenceAffection {
    #[serde(rename = "type")]
    pub kind: String,
    pub distance: f64,
    pub range: f64,
    pub name: String,
}

pub fn affections(ctx: &AffectContext<'_>, sensor: &Declaration) -> SimResult<Affections> {
    let range = sensor.range.ok_or_else(|| SimError::MissingField {
        name: sensor.name.clone(),
        field: "range",
    })?;
    let origin = ctx.pose_of(sensor)?.position();
    let carrier = ctx.tf.carrying_robot(&sensor.name);

    let mut found = Affections::new();
    for robot in ctx.tf.robots() {
        if carrier.as_deref() == Some(robot.as_str()) {
            continue;
        }
        let Some(pose) = ctx.tf.get_transform(&robot) else {
            continue;
        };
        let d = distance(&origin, &pose.position());
        if d < range {
            found.insert(
                robot.clone(),
                Affection::Presence(PresenceAffection {
                    kind: "robot".to_string(),
                    distance: d,
                    range,
                    name: robot,
                }),
            );
        }
    }
    Ok(found)
}
