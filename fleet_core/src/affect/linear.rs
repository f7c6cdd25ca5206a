// fleet_core/src/affect/linear.rs

//! Trip-wire alarms: a robot is reported when the segment between its two
//! most recent sampled positions crosses the alarm segment.
//!
//! Sampling happens once per query, so a robot fast enough to pass the wire
//! between two queries is not reported.

use nalgebra::Point2;
use serde::Serialize;
use std::collections::HashMap;

use super::{AffectContext, Affection, Affections};
use crate::declaration::{Declaration, PropertyValue};
use crate::error::{SimError, SimResult};
use crate::geometry::segments_intersect;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossingAffection {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub from: [f64; 2],
    pub to: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    previous: Option<Point2<f64>>,
    current: Point2<f64>,
}

/// Previous/current robot positions, kept separately for every alarm so that
/// one alarm's queries never consume another alarm's samples.
#[derive(Debug, Clone, Default)]
pub struct CrossingTracker {
    samples: HashMap<String, HashMap<String, Sample>>,
}

impl CrossingTracker {
    /// Records a new sample and returns the motion segment since the last
    /// one, if there was a last one.
    pub fn sample(
        &mut self,
        alarm: &str,
        robot: &str,
        position: Point2<f64>,
    ) -> Option<(Point2<f64>, Point2<f64>)> {
        let per_robot = self.samples.entry(alarm.to_string()).or_default();
        let sample = per_robot
            .entry(robot.to_string())
            .and_modify(|s| {
                s.previous = Some(s.current);
                s.current = position;
            })
            .or_insert(Sample {
                previous: None,
                current: position,
            });
        sample.previous.map(|p| (p, sample.current))
    }

    /// Forgets every sample of an alarm, e.g. after it is re-declared.
    pub fn reset(&mut self, alarm: &str) {
        self.samples.remove(alarm);
    }
}

/// Reads a point from `[x, y]` or `{ x = .., y = .. }`.
fn point_property(value: &PropertyValue) -> Option<Point2<f64>> {
    match value {
        PropertyValue::List(items) => match items.as_slice() {
            [x, y] => Some(Point2::new(x.as_f64()?, y.as_f64()?)),
            _ => None,
        },
        PropertyValue::Map(map) => Some(Point2::new(
            map.get("x")?.as_f64()?,
            map.get("y")?.as_f64()?,
        )),
        _ => None,
    }
}

/// The alarm's wire, in world coordinates.
pub fn alarm_segment(alarm: &Declaration) -> SimResult<(Point2<f64>, Point2<f64>)> {
    let endpoint = |key: &'static str| -> SimResult<Point2<f64>> {
        let value = alarm.property(key).ok_or_else(|| SimError::MissingField {
            name: alarm.name.clone(),
            field: key,
        })?;
        point_property(value).ok_or_else(|| SimError::InvalidSegment {
            name: alarm.name.clone(),
            reason: format!("'{key}' is not an [x, y] point"),
        })
    };
    Ok((endpoint("start")?, endpoint("end")?))
}

pub fn affections(
    ctx: &AffectContext<'_>,
    alarm: &Declaration,
    tracker: &mut CrossingTracker,
) -> SimResult<Affections> {
    let (start, end) = alarm_segment(alarm)?;
    let mut found = Affections::new();

    for robot in ctx.tf.robots() {
        let Some(pose) = ctx.tf.get_transform(&robot) else {
            continue;
        };
        let Some((from, to)) = tracker.sample(&alarm.name, &robot, pose.position()) else {
            continue;
        };
        if segments_intersect(&start, &end, &from, &to) {
            found.insert(
                robot.clone(),
                Affection::Crossing(CrossingAffection {
                    kind: "robot".to_string(),
                    name: robot,
                    from: [from.x, from.y],
                    to: [to.x, to.y],
                }),
            );
        }
    }

    Ok(found)
}
