// fleet_core/src/affect/arc.rs

//! Field-of-view influence for cameras and RFID readers.

use nalgebra::Point2;
use serde::Serialize;

use super::{AffectContext, Affection, Affections, Candidate};
use crate::declaration::{Declaration, PropertyValue};
use crate::error::{SimError, SimResult};
use crate::geometry::{angle_in_arc, bearing, distance};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArcedAffection {
    #[serde(rename = "type")]
    pub kind: String,
    /// The target's properties, or the robot's own name for robots.
    pub info: PropertyValue,
    pub distance: f64,
    pub min_sensor_ang: f64,
    pub max_sensor_ang: f64,
    pub actor_ang: f64,
    pub name: String,
    pub id: Option<PropertyValue>,
}

/// The sensing envelope of one arced sensor at its current absolute pose.
#[derive(Debug, Clone, Copy)]
pub struct ArcWindow {
    pub origin: Point2<f64>,
    pub range: f64,
    pub min: f64,
    pub max: f64,
}

impl ArcWindow {
    /// `fov` is in radians.
    pub fn new(origin: Point2<f64>, heading: f64, fov: f64, range: f64) -> Self {
        Self {
            origin,
            range,
            min: heading - fov / 2.0,
            max: heading + fov / 2.0,
        }
    }

    /// Distance and bearing of `target` if it falls inside the window.
    pub fn observe(&self, target: &Point2<f64>) -> Option<(f64, f64)> {
        let d = distance(&self.origin, target);
        if d >= self.range {
            return None;
        }
        let angle = bearing(&self.origin, target);
        angle_in_arc(angle, self.min, self.max).then_some((d, angle))
    }
}

pub fn affections(
    ctx: &AffectContext<'_>,
    sensor: &Declaration,
    candidates: &'static [Candidate],
) -> SimResult<Affections> {
    let missing = |field| SimError::MissingField {
        name: sensor.name.clone(),
        field,
    };
    let range = sensor.range.ok_or_else(|| missing("range"))?;
    let fov = sensor.fov.ok_or_else(|| missing("fov"))?.to_radians();
    let pose = ctx.pose_of(sensor)?;
    let heading = pose.theta.ok_or_else(|| missing("pose.theta"))?;

    let window = ArcWindow::new(pose.position(), heading, fov, range);
    let arced = |kind: &str, name: &str, info, id, seen: (f64, f64)| {
        let (d, angle) = seen;
        Affection::Arced(ArcedAffection {
            kind: kind.to_string(),
            info,
            distance: d,
            min_sensor_ang: window.min,
            max_sensor_ang: window.max,
            actor_ang: angle,
            name: name.to_string(),
            id,
        })
    };

    let mut found = Affections::new();

    for target in ctx.declared_candidates(candidates) {
        let Some(target_pose) = ctx.tf.get_transform(&target.name) else {
            continue;
        };
        if let Some(seen) = window.observe(&target_pose.position()) {
            let info = PropertyValue::Map(target.properties.clone());
            let kind = target.index_key().unwrap_or_default();
            found.insert(
                target.name.clone(),
                arced(kind, &target.name, info, target.id.clone(), seen),
            );
        }
    }

    if candidates.contains(&Candidate::Robots) {
        let carrier = ctx.tf.carrying_robot(&sensor.name);
        for robot in ctx.tf.robots() {
            if carrier.as_deref() == Some(robot.as_str()) {
                continue;
            }
            let Some(robot_pose) = ctx.tf.get_transform(&robot) else {
                continue;
            };
            if let Some(seen) = window.observe(&robot_pose.position()) {
                let info = PropertyValue::Text(robot.clone());
                found.insert(robot.clone(), arced("robot", &robot, info, None, seen));
            }
        }
    }

    Ok(found)
}
