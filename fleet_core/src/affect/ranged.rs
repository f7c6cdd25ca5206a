// fleet_core/src/affect/ranged.rs

//! Omnidirectional influence: a peer affects a sensor when the sensor lies
//! strictly inside the peer's declared range.

use serde::Serialize;

use super::{AffectContext, Affection, Affections, Candidate};
use crate::declaration::{Declaration, Properties, PropertyValue};
use crate::error::SimResult;
use crate::geometry::distance;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangedAffection {
    #[serde(rename = "type")]
    pub kind: String,
    pub distance: f64,
    pub range: f64,
    /// Declared properties, overlaid with the live value for live actuators.
    pub properties: Properties,
    pub name: String,
    pub id: Option<PropertyValue>,
}

pub fn affections(
    ctx: &AffectContext<'_>,
    sensor: &Declaration,
    candidates: &'static [Candidate],
) -> SimResult<Affections> {
    let origin = ctx.pose_of(sensor)?.position();
    let mut found = Affections::new();

    for peer in ctx.declared_candidates(candidates) {
        if peer.name == sensor.name {
            continue;
        }
        // Peers without a range cannot reach anything.
        let Some(range) = peer.range else {
            continue;
        };
        let Some(pose) = ctx.tf.get_transform(&peer.name) else {
            continue;
        };

        let d = distance(&origin, &pose.position());
        if d >= range {
            continue;
        }

        let mut properties = peer.properties.clone();
        if ctx.registry.has_live_channel(&peer.name) {
            properties.extend(ctx.actuators.current_value(&peer.name)?);
        }

        found.insert(
            peer.name.clone(),
            Affection::Ranged(RangedAffection {
                kind: peer.index_key().unwrap_or_default().to_string(),
                distance: d,
                range,
                properties,
                name: peer.name.clone(),
                id: peer.id.clone(),
            }),
        );
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{actor, env, World};
    use super::super::{CrossingTracker, TEMPERATURE_CANDIDATES};
    use super::*;
    use crate::error::SimError;
    use approx::assert_abs_diff_eq;

    fn thermostat_at(x: f64) -> String {
        env(
            "th_1",
            "thermostat",
            x,
            0.0,
            "range = 5.0\nproperties = { temperature = 22.0 }",
        )
    }

    #[test]
    fn thermostat_within_range_affects_temperature_sensor() {
        let mut world = World::build(
            &[&env("temp_1", "temperature", 0.0, 0.0, ""), &thermostat_at(2.0)],
            &[],
        );
        world.actuators.0.insert(
            "th_1".to_string(),
            Properties::from([("temperature".to_string(), PropertyValue::Float(25.0))]),
        );

        let mut crossings = CrossingTracker::default();
        let found = world.ctx().affections("temp_1", &mut crossings).unwrap();
        let Affection::Ranged(a) = &found["th_1"] else {
            panic!("expected a ranged affection");
        };
        assert_eq!(a.kind, "thermostat");
        assert_abs_diff_eq!(a.distance, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.range, 5.0);
        // The live value wins over the declared one.
        assert_eq!(a.properties["temperature"], PropertyValue::Float(25.0));
    }

    #[test]
    fn range_boundary_is_exclusive() {
        let eps = 1e-9;
        for (x, expected) in [(5.0 - eps, 1), (5.0, 0), (5.0 + eps, 0)] {
            let mut world = World::build(
                &[&env("temp_1", "temperature", 0.0, 0.0, ""), &thermostat_at(x)],
                &[],
            );
            world
                .actuators
                .0
                .insert("th_1".to_string(), Properties::new());
            let sensor = world.registry.get("temp_1").unwrap().clone();
            let found = affections(&world.ctx(), &sensor, TEMPERATURE_CANDIDATES).unwrap();
            assert_eq!(found.len(), expected, "thermostat at x = {x}");
        }
    }

    #[test]
    fn fire_range_boundary_is_exclusive() {
        let eps = 1e-9;
        for (x, expected) in [(5.0 - eps, 1), (5.0, 0), (5.0 + eps, 0)] {
            let world = World::build(
                &[
                    &env("temp_1", "temperature", 0.0, 0.0, ""),
                    &actor("fire_1", "fire", x, 0.0, 5.0),
                ],
                &[],
            );
            let sensor = world.registry.get("temp_1").unwrap().clone();
            let found = affections(&world.ctx(), &sensor, TEMPERATURE_CANDIDATES).unwrap();
            assert_eq!(found.len(), expected, "fire at x = {x}");
            if let Some(Affection::Ranged(a)) = found.get("fire_1") {
                assert_eq!(a.kind, "fire");
            }
        }
    }

    #[test]
    fn unreachable_actuator_is_an_error() {
        let world = World::build(
            &[&env("temp_1", "temperature", 0.0, 0.0, ""), &thermostat_at(1.0)],
            &[],
        );
        let mut crossings = CrossingTracker::default();
        assert!(matches!(
            world.ctx().affections("temp_1", &mut crossings),
            Err(SimError::LiveValue { .. })
        ));
    }

    #[test]
    fn peers_without_range_are_ignored() {
        let world = World::build(
            &[
                &env("gas_1", "gas", 0.0, 0.0, ""),
                r#"
                type = "actor"
                name = "h_norange"
                subtype = "human"
                "#,
                &actor("h_near", "human", 0.5, 0.0, 1.0),
            ],
            &[],
        );
        let mut crossings = CrossingTracker::default();
        let found = world.ctx().affections("gas_1", &mut crossings).unwrap();
        assert_eq!(found.keys().collect::<Vec<_>>(), ["h_near"]);
    }
}
