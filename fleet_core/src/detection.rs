// fleet_core/src/detection.rs

//! One-shot simulated detection for cameras and microphones.
//!
//! The affectability result for the device is filtered through a per
//! (device class, detection kind) acceptance table. Camera matches can then be
//! overturned when the scene is too dark.

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::affect::{self, AffectContext, Affection, Affections};
use crate::declaration::{Properties, PropertyValue, SensorClass};
use crate::error::{SimError, SimResult};

/// Fraction of the gap to the new estimate closed on every camera detection.
pub const LUMINOSITY_SMOOTHING: f64 = 0.1;
pub const DEFAULT_AMBIENT_LUMINOSITY: f64 = 100.0;
/// Full brightness of a fire, and of leds without a reported luminosity.
const FULL_LUMINOSITY: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionKind {
    Sound,
    Language,
    Emotion,
    #[serde(rename = "speech2text")]
    Speech2Text,
    Face,
    Gender,
    Age,
    Motion,
    Qr,
    Barcode,
    Text,
    Color,
    Robot,
}

impl DetectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionKind::Sound => "sound",
            DetectionKind::Language => "language",
            DetectionKind::Emotion => "emotion",
            DetectionKind::Speech2Text => "speech2text",
            DetectionKind::Face => "face",
            DetectionKind::Gender => "gender",
            DetectionKind::Age => "age",
            DetectionKind::Motion => "motion",
            DetectionKind::Qr => "qr",
            DetectionKind::Barcode => "barcode",
            DetectionKind::Text => "text",
            DetectionKind::Color => "color",
            DetectionKind::Robot => "robot",
        }
    }

    fn supported_by(&self, class: SensorClass) -> bool {
        use DetectionKind::*;
        match class {
            SensorClass::Microphone => matches!(self, Sound | Language | Emotion | Speech2Text),
            SensorClass::Camera => matches!(
                self,
                Face | Gender | Age | Emotion | Motion | Qr | Barcode | Text | Color | Robot
            ),
            _ => false,
        }
    }
}

/// `{ result, info, frm }`, where `frm` names the detecting device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionOutcome {
    pub result: bool,
    pub info: Option<PropertyValue>,
    pub frm: String,
}

/// The outcome plus the candidate that won, for the end notification.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionReport {
    pub outcome: DetectionOutcome,
    pub candidate: Option<(String, Affection)>,
}

/// Smoothed scene brightness, tracked per camera.
#[derive(Debug, Clone)]
pub struct LuminosityState {
    ambient: f64,
    per_camera: HashMap<String, f64>,
}

impl Default for LuminosityState {
    fn default() -> Self {
        Self::new(DEFAULT_AMBIENT_LUMINOSITY)
    }
}

impl LuminosityState {
    pub fn new(ambient: f64) -> Self {
        Self {
            ambient: ambient.clamp(0.0, 100.0),
            per_camera: HashMap::new(),
        }
    }

    pub fn ambient(&self) -> f64 {
        self.ambient
    }

    pub fn current(&self, camera: &str) -> f64 {
        self.per_camera.get(camera).copied().unwrap_or(self.ambient)
    }

    /// Moves the camera's luminosity toward `estimate` and returns the result.
    pub fn blend(&mut self, camera: &str, estimate: f64) -> f64 {
        let previous = self.current(camera);
        let next = (previous + LUMINOSITY_SMOOTHING * (estimate - previous)).clamp(0.0, 100.0);
        self.per_camera.insert(camera.to_string(), next);
        next
    }
}

/// Ambient light plus every fire and led lighting the camera, each fading
/// linearly to zero at the edge of its range.
pub fn luminosity_estimate(ambient: f64, lights: &Affections) -> f64 {
    lights
        .values()
        .filter_map(|a| match a {
            Affection::Ranged(r) => Some(r),
            _ => None,
        })
        .map(|r| {
            let falloff = 1.0 - r.distance / r.range;
            let brightness = match r.kind.as_str() {
                "fire" => FULL_LUMINOSITY,
                _ => r
                    .properties
                    .get("luminosity")
                    .and_then(PropertyValue::as_f64)
                    .unwrap_or(FULL_LUMINOSITY),
            };
            brightness * falloff
        })
        .sum::<f64>()
        + ambient
}

pub fn simulated_detection<R: Rng + ?Sized>(
    ctx: &AffectContext<'_>,
    name: &str,
    kind: DetectionKind,
    luminosity: &mut LuminosityState,
    rng: &mut R,
) -> SimResult<DetectionReport> {
    let device = ctx.registry.require(name)?;
    let class = device.sensor_class();
    let unsupported = || SimError::UnsupportedDetection {
        name: name.to_string(),
        kind: kind.as_str().to_string(),
    };
    let class = class.filter(|c| kind.supported_by(*c)).ok_or_else(unsupported)?;

    let candidates = match class {
        SensorClass::Camera => affect::arc::affections(ctx, device, affect::CAMERA_CANDIDATES)?,
        _ => affect::ranged::affections(ctx, device, affect::MICROPHONE_CANDIDATES)?,
    };
    let mut by_distance: Vec<(&String, &Affection)> = candidates.iter().collect();
    by_distance.sort_by(|a, b| {
        let (da, db) = (a.1.distance().unwrap_or(0.0), b.1.distance().unwrap_or(0.0));
        da.total_cmp(&db)
    });

    let matched = by_distance.into_iter().find_map(|(peer, a)| {
        accept(class, kind, a).map(|info| (peer.clone(), a.clone(), info))
    });

    let matched = match class {
        SensorClass::Camera => {
            let lights = affect::ranged::affections(ctx, device, affect::LIGHT_CANDIDATES)?;
            let estimate = luminosity_estimate(luminosity.ambient(), &lights);
            let lum = luminosity.blend(name, estimate);
            // Too dark to see: a match survives with probability sqrt(lum / 100).
            matched.filter(|_| {
                let u: f64 = Uniform::new(0.0, 1.0).sample(rng);
                u * u <= lum / 100.0
            })
        }
        _ => matched,
    };

    let (result, info, candidate) = match (kind, matched) {
        (_, Some((peer, a, info))) => (true, info, Some((peer, a))),
        (DetectionKind::Color, None) => (true, Some(black()), None),
        (_, None) => (false, None, None),
    };

    Ok(DetectionReport {
        outcome: DetectionOutcome {
            result,
            info,
            frm: name.to_string(),
        },
        candidate,
    })
}

fn black() -> PropertyValue {
    PropertyValue::Map(Properties::from([
        ("r".to_string(), PropertyValue::Integer(0)),
        ("g".to_string(), PropertyValue::Integer(0)),
        ("b".to_string(), PropertyValue::Integer(0)),
    ]))
}

fn candidate_properties(a: &Affection) -> Option<&Properties> {
    match a {
        Affection::Ranged(r) => Some(&r.properties),
        Affection::Arced(r) => r.info.as_map(),
        _ => None,
    }
}

/// The acceptance table. `Some(info)` if `a` satisfies `kind`; a microphone
/// match whose candidate lacks the requested property carries no info.
fn accept(
    class: SensorClass,
    kind: DetectionKind,
    a: &Affection,
) -> Option<Option<PropertyValue>> {
    use DetectionKind::*;
    let props = candidate_properties(a);
    let prop = |key: &str| props.and_then(|p| p.get(key)).cloned();
    let is_human = a.kind() == "human";

    let info = match (class, kind) {
        (SensorClass::Microphone, Sound | Language | Emotion) => return Some(prop(kind.as_str())),
        (SensorClass::Microphone, Speech2Text) => {
            prop("speech").filter(|s| is_human && !s.is_empty_text())
        }

        (SensorClass::Camera, Face) if is_human => Some(PropertyValue::Text(name_of(a))),
        (SensorClass::Camera, Gender) if is_human => {
            prop("gender").filter(|g| g.as_str() != Some("none"))
        }
        (SensorClass::Camera, Age) if is_human => prop("age").filter(|v| v.as_i64() != Some(-1)),
        (SensorClass::Camera, Emotion) if is_human => prop("emotion"),
        (SensorClass::Camera, Motion) if is_human => {
            prop("motion").filter(|m| m.as_i64() == Some(1))
        }

        (SensorClass::Camera, Qr | Barcode) if a.kind() == kind.as_str() => {
            prop("message").or_else(|| props.cloned().map(PropertyValue::Map))
        }
        (SensorClass::Camera, Text) if a.kind() == "text" => {
            prop("text").or_else(|| props.cloned().map(PropertyValue::Map))
        }
        (SensorClass::Camera, Color) if a.kind() == "color" => {
            let channel = |c: &str| prop(c).unwrap_or(PropertyValue::Integer(0));
            Some(PropertyValue::Map(Properties::from([
                ("r".to_string(), channel("r")),
                ("g".to_string(), channel("g")),
                ("b".to_string(), channel("b")),
            ])))
        }
        (SensorClass::Camera, Robot) if a.kind() == "robot" => {
            Some(PropertyValue::Text(name_of(a)))
        }

        _ => None,
    };
    info.map(Some)
}

fn name_of(a: &Affection) -> String {
    match a {
        Affection::Ranged(r) => r.name.clone(),
        Affection::Arced(r) => r.name.clone(),
        Affection::Presence(r) => r.name.clone(),
        Affection::Crossing(r) => r.name.clone(),
    }
}
