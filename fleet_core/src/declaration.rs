// fleet_core/src/declaration.rs

//! The static description of a simulated device and the classification of
//! devices into sensor and effector classes.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::error::{SimError, SimResult};
use crate::types::Pose2;

/// Free-form attribute map attached to declarations and live actuator values.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A single property value. Untagged so that any self-describing format
/// (TOML, figment values, JSON from the bus) maps onto it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<PropertyValue>),
    Map(Properties),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            PropertyValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True for `""` and for anything that is not text.
    pub fn is_empty_text(&self) -> bool {
        !matches!(self, PropertyValue::Text(s) if !s.is_empty())
    }

    pub fn as_map(&self) -> Option<&Properties> {
        match self {
            PropertyValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

// =========================================================================
// == Declaration Schema ==
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Robot,
    Env,
    Actor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostType {
    Robot,
    PanTilt,
}

/// Category/class/subclass triple of a robot or env device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceSubtype {
    #[serde(default)]
    pub category: String,
    pub class: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub subclass: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subtype {
    /// Actors are classified by a bare kind string (`human`, `fire`, ...).
    Actor(String),
    Device(DeviceSubtype),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// Pose as written in a declaration. `theta` is in degrees here.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPose {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub theta: Option<f64>,
}

/// A declaration exactly as it arrives on the bus. Any key outside this fixed
/// schema fails deserialization; missing keys are `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDeclaration {
    #[serde(rename = "type")]
    pub device_type: Option<DeviceType>,
    pub subtype: Option<Subtype>,
    pub name: Option<String>,
    pub pose: Option<RawPose>,
    pub base_topic: Option<String>,
    pub range: Option<f64>,
    pub fov: Option<f64>,
    pub host: Option<String>,
    pub host_type: Option<HostType>,
    pub properties: Option<Properties>,
    pub id: Option<PropertyValue>,
}

/// A validated declaration. Immutable until the device is declared again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub subtype: Option<Subtype>,
    /// Declared pose relative to the host, theta in radians.
    pub pose: Pose2,
    pub base_topic: Option<String>,
    pub range: Option<f64>,
    /// Field of view in degrees, as declared.
    pub fov: Option<f64>,
    pub host: Option<String>,
    pub host_type: Option<HostType>,
    pub properties: Properties,
    pub id: Option<PropertyValue>,
}

impl Declaration {
    /// Validates a raw declaration and converts its heading to radians.
    pub fn from_raw(raw: RawDeclaration) -> SimResult<Self> {
        let name = raw.name.ok_or_else(|| SimError::MalformedDeclaration {
            name: "<unnamed>".to_string(),
            reason: "missing 'name'".to_string(),
        })?;
        let malformed = |reason: &str| SimError::MalformedDeclaration {
            name: name.clone(),
            reason: reason.to_string(),
        };

        let device_type = raw.device_type.ok_or_else(|| malformed("missing 'type'"))?;

        match (&raw.host, &raw.host_type) {
            (Some(_), None) => return Err(malformed("'host' given without 'host_type'")),
            (None, Some(_)) => return Err(malformed("'host_type' given without 'host'")),
            _ => {}
        }

        match (&device_type, &raw.subtype) {
            (DeviceType::Actor, Some(Subtype::Device(_))) => {
                return Err(malformed("actors take a bare subtype string"))
            }
            (DeviceType::Robot | DeviceType::Env, Some(Subtype::Actor(_))) => {
                return Err(malformed("devices take a category/class/subclass subtype"))
            }
            _ => {}
        }

        let raw_pose = raw.pose.unwrap_or_default();
        let pose = Pose2::new(raw_pose.x, raw_pose.y, raw_pose.theta.map(f64::to_radians));

        Ok(Self {
            name,
            device_type,
            subtype: raw.subtype,
            pose,
            base_topic: raw.base_topic,
            range: raw.range,
            fov: raw.fov,
            host: raw.host,
            host_type: raw.host_type,
            properties: raw.properties.unwrap_or_default(),
            id: raw.id,
        })
    }

    /// Actor kind (`human`, `fire`, ...) for actors.
    pub fn actor_kind(&self) -> Option<&str> {
        match &self.subtype {
            Some(Subtype::Actor(kind)) => Some(kind),
            _ => None,
        }
    }

    pub fn device_subtype(&self) -> Option<&DeviceSubtype> {
        match &self.subtype {
            Some(Subtype::Device(d)) => Some(d),
            _ => None,
        }
    }

    /// The key this declaration is filed under in the per-type index:
    /// the class for devices, the kind for actors.
    pub fn index_key(&self) -> Option<&str> {
        match &self.subtype {
            Some(Subtype::Actor(kind)) => Some(kind),
            Some(Subtype::Device(d)) => Some(&d.class),
            None => None,
        }
    }

    pub fn effector_class(&self) -> Option<EffectorClass> {
        if self.device_type == DeviceType::Actor {
            return None;
        }
        self.device_subtype()
            .and_then(|d| EffectorClass::from_class_name(&d.class))
    }

    /// Sensor class from the declared class, falling back to the first
    /// subclass entry that names one. Effectors are never sensors.
    pub fn sensor_class(&self) -> Option<SensorClass> {
        if self.effector_class().is_some() {
            return None;
        }
        let subtype = self.device_subtype()?;
        SensorClass::from_class_name(&subtype.class).or_else(|| {
            subtype
                .subclass
                .iter()
                .find_map(|s| SensorClass::from_class_name(s))
        })
    }

    pub fn is_pan_tilt(&self) -> bool {
        self.effector_class() == Some(EffectorClass::PanTilt)
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

// =========================================================================
// == Device Classes ==
// =========================================================================

/// Every sensor class with an affectability model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorClass {
    Temperature,
    Humidity,
    Gas,
    Light,
    Microphone,
    Proximity,
    AreaAlarm,
    LinearAlarm,
    Camera,
    RfidReader,
}

impl SensorClass {
    pub fn from_class_name(class: &str) -> Option<Self> {
        let class = match class {
            "temperature" => SensorClass::Temperature,
            "humidity" => SensorClass::Humidity,
            "gas" => SensorClass::Gas,
            "light" | "light_sensor" => SensorClass::Light,
            "microphone" => SensorClass::Microphone,
            "sonar" | "ir" | "distance" | "proximity" => SensorClass::Proximity,
            "area_alarm" => SensorClass::AreaAlarm,
            "linear_alarm" => SensorClass::LinearAlarm,
            "camera" => SensorClass::Camera,
            "rfid_reader" => SensorClass::RfidReader,
            _ => return None,
        };
        Some(class)
    }
}

/// Actuators other devices can be affected by, plus the pan-tilt mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectorClass {
    Thermostat,
    Humidifier,
    Leds,
    Speaker,
    Relay,
    PanTilt,
}

impl EffectorClass {
    pub fn from_class_name(class: &str) -> Option<Self> {
        let class = match class {
            "thermostat" => EffectorClass::Thermostat,
            "humidifier" => EffectorClass::Humidifier,
            "leds" => EffectorClass::Leds,
            "speaker" => EffectorClass::Speaker,
            "relay" => EffectorClass::Relay,
            "pan_tilt" => EffectorClass::PanTilt,
            _ => return None,
        };
        Some(class)
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            EffectorClass::Thermostat => "thermostat",
            EffectorClass::Humidifier => "humidifier",
            EffectorClass::Leds => "leds",
            EffectorClass::Speaker => "speaker",
            EffectorClass::Relay => "relay",
            EffectorClass::PanTilt => "pan_tilt",
        }
    }

    /// Effectors whose current value is owned by the actuator and must be
    /// queried live rather than read from the declaration.
    pub fn has_live_value(&self) -> bool {
        matches!(
            self,
            EffectorClass::Thermostat | EffectorClass::Humidifier | EffectorClass::Leds
        )
    }
}
