// fleet_core/src/registry.rs

use std::collections::{BTreeMap, HashMap};

use crate::declaration::{Declaration, DeviceType, RawDeclaration};
use crate::error::{SimError, SimResult};

/// What happened to the registry on a successful declare.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclareOutcome {
    Added,
    /// The name was already declared; the previous declaration is returned
    /// after being replaced in place.
    Replaced(Declaration),
}

/// Owns every declaration and the per-type index used by affectability so
/// that no query ever scans the full declaration list.
#[derive(Debug, Default, Clone)]
pub struct DeclarationRegistry {
    declarations: Vec<Declaration>,
    by_name: HashMap<String, usize>,
    /// type -> class (devices) or kind (actors) -> names in declaration order.
    index: BTreeMap<DeviceType, BTreeMap<String, Vec<String>>>,
    /// Actuators whose current value must be fetched live.
    live_channels: Vec<String>,
}

impl DeclarationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores a raw declaration.
    pub fn declare(&mut self, raw: RawDeclaration) -> SimResult<DeclareOutcome> {
        let declaration = Declaration::from_raw(raw)?;
        Ok(self.insert(declaration))
    }

    /// Stores an already validated declaration. A repeated name replaces the
    /// earlier declaration (last write wins) and re-files it in the index.
    pub fn insert(&mut self, declaration: Declaration) -> DeclareOutcome {
        let name = declaration.name.clone();

        let existing = self.by_name.get(&name).copied();
        let outcome = match existing {
            Some(slot) => {
                let previous = std::mem::replace(&mut self.declarations[slot], declaration);
                self.unindex(&previous);
                DeclareOutcome::Replaced(previous)
            }
            None => {
                self.by_name.insert(name.clone(), self.declarations.len());
                self.declarations.push(declaration);
                DeclareOutcome::Added
            }
        };

        let slot = self.by_name[&name];
        let stored = &self.declarations[slot];
        let key = stored.index_key().map(str::to_string);
        let device_type = stored.device_type;
        let live = stored.effector_class().is_some_and(|e| e.has_live_value())
            && device_type == DeviceType::Env;

        if let Some(key) = key {
            self.index
                .entry(device_type)
                .or_default()
                .entry(key)
                .or_default()
                .push(name.clone());
        }
        if live {
            self.live_channels.push(name);
        }

        outcome
    }

    fn unindex(&mut self, previous: &Declaration) {
        if let Some(key) = previous.index_key() {
            if let Some(names) = self
                .index
                .get_mut(&previous.device_type)
                .and_then(|by_key| by_key.get_mut(key))
            {
                names.retain(|n| n != &previous.name);
            }
        }
        self.live_channels.retain(|n| n != &previous.name);
    }

    /// Every declaration, in the order it was first declared.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.by_name.get(name).map(|&i| &self.declarations[i])
    }

    /// Like `get`, but an unknown name is an error.
    pub fn require(&self, name: &str) -> SimResult<&Declaration> {
        self.get(name)
            .ok_or_else(|| SimError::UnknownDevice(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Names filed under `key` for the given device type.
    pub fn names_in(&self, device_type: DeviceType, key: &str) -> &[String] {
        self.index
            .get(&device_type)
            .and_then(|by_key| by_key.get(key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Declarations filed under `key` for the given device type.
    pub fn iter_in<'a>(
        &'a self,
        device_type: DeviceType,
        key: &str,
    ) -> impl Iterator<Item = &'a Declaration> + 'a {
        self.names_in(device_type, key)
            .iter()
            .filter_map(move |n| self.get(n))
    }

    pub fn live_channels(&self) -> &[String] {
        &self.live_channels
    }

    pub fn has_live_channel(&self, name: &str) -> bool {
        self.live_channels.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(src: &str) -> RawDeclaration {
        toml::from_str(src).unwrap()
    }

    fn thermostat(name: &str) -> RawDeclaration {
        raw(&format!(
            r#"
            type = "env"
            name = "{name}"
            subtype = {{ category = "actuator", class = "thermostat" }}
            range = 5.0
            properties = {{ temperature = 22.0 }}
            "#
        ))
    }

    #[test]
    fn declare_indexes_by_type_and_class() {
        let mut registry = DeclarationRegistry::new();
        registry.declare(thermostat("th_1")).unwrap();
        registry
            .declare(raw(
                r#"
                type = "actor"
                name = "fire_1"
                subtype = "fire"
                range = 3.0
                "#,
            ))
            .unwrap();

        assert_eq!(registry.names_in(DeviceType::Env, "thermostat"), ["th_1"]);
        assert_eq!(registry.names_in(DeviceType::Actor, "fire"), ["fire_1"]);
        assert!(registry.names_in(DeviceType::Actor, "human").is_empty());
        assert_eq!(registry.live_channels(), ["th_1"]);
    }

    #[test]
    fn redeclaring_replaces_the_earlier_declaration() {
        let mut registry = DeclarationRegistry::new();
        registry.declare(thermostat("dev_1")).unwrap();
        let outcome = registry
            .declare(raw(
                r#"
                type = "actor"
                name = "dev_1"
                subtype = "human"
                "#,
            ))
            .unwrap();

        assert!(matches!(outcome, DeclareOutcome::Replaced(_)));
        assert_eq!(registry.len(), 1);
        assert!(registry.names_in(DeviceType::Env, "thermostat").is_empty());
        assert_eq!(registry.names_in(DeviceType::Actor, "human"), ["dev_1"]);
        assert!(!registry.has_live_channel("dev_1"));
    }

    #[test]
    fn invalid_declaration_is_not_stored() {
        let mut registry = DeclarationRegistry::new();
        let result = registry.declare(raw(
            r#"
            name = "no_type"
            "#,
        ));
        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn require_reports_unknown_devices() {
        let registry = DeclarationRegistry::new();
        assert_eq!(
            registry.require("ghost"),
            Err(SimError::UnknownDevice("ghost".to_string()))
        );
    }
}
