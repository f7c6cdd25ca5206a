// fleet_core/src/tf.rs

//! Pose composition: the host -> children tree, relative and absolute poses,
//! and pan-tilt state.
//!
//! Absolute poses are only ever mutated through `on_host_pose_changed` and
//! `apply_pan`. All angles are radians and are never normalized here.

use std::collections::HashMap;

use crate::declaration::Declaration;
use crate::discovery::{DeviceDiscovery, HostKind};
use crate::error::{SimError, SimResult};
use crate::types::{Pose2, TfProvider};

/// Runtime state of one pan-tilt mount.
#[derive(Debug, Clone, PartialEq)]
pub struct PanTiltState {
    pub base_topic: String,
    /// The robot carrying the mount, or `None` for the world.
    pub place: Option<String>,
    /// Current pan angle, radians.
    pub pan: f64,
}

/// What `PoseTree::setup` found while wiring everything together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetupReport {
    /// Hosts referenced by a declaration that are neither declared nor a
    /// discovered robot. Reported, never repaired.
    pub inconsistencies: Vec<String>,
    pub robots: Vec<String>,
    pub pan_tilts: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PoseTree {
    /// Host (`None` = world) -> carried devices, in declaration order.
    tree: HashMap<Option<String>, Vec<String>>,
    /// Device -> host.
    hosts: HashMap<String, Option<String>>,
    relative: HashMap<String, Pose2>,
    absolute: HashMap<String, Pose2>,
    pan_tilts: HashMap<String, PanTiltState>,
    robots: Vec<String>,
}

impl PoseTree {
    /// Builds the tree and both pose maps from the full declaration list,
    /// registers every discovered robot and pan-tilt, and applies each
    /// pan-tilt's initial zero pan.
    pub fn setup(
        declarations: &[Declaration],
        discovery: &dyn DeviceDiscovery,
    ) -> (Self, SetupReport) {
        let mut tf = PoseTree::default();
        let mut report = SetupReport::default();

        // --- 1. Hosts from discovery ---
        for host in discovery.hosts() {
            let place = match host.kind {
                HostKind::Robot => {
                    tf.robots.push(host.name.clone());
                    Some(host.name.clone())
                }
                HostKind::World => None,
            };
            for device in host.devices.iter().filter(|d| d.is_pan_tilt()) {
                tf.pan_tilts.insert(
                    device.name.clone(),
                    PanTiltState {
                        base_topic: device.base_topic.clone(),
                        place: place.clone(),
                        pan: 0.0,
                    },
                );
            }
        }

        // --- 2. Tree and pose maps from declarations ---
        for decl in declarations {
            tf.insert_declaration(decl);
            if decl.is_pan_tilt() && !tf.pan_tilts.contains_key(&decl.name) {
                tf.pan_tilts.insert(
                    decl.name.clone(),
                    PanTiltState {
                        base_topic: decl.base_topic.clone().unwrap_or_default(),
                        place: decl.host.clone(),
                        pan: 0.0,
                    },
                );
            }
        }

        // --- 3. Consistency check ---
        let mut referenced: Vec<&String> = tf.tree.keys().flatten().collect();
        referenced.sort();
        for host in referenced {
            if !tf.relative.contains_key(host) && !tf.robots.contains(host) {
                report.inconsistencies.push(host.clone());
            }
        }

        // --- 4. Devices on declared hosts start where their host is ---
        // Start from every host without a pose of its own so mounts carried
        // by robots reach their devices too.
        let mut tops: Vec<Option<String>> = tf
            .tree
            .keys()
            .filter(|h| h.as_ref().is_none_or(|h| !tf.absolute.contains_key(h)))
            .cloned()
            .collect();
        tops.sort();
        let mut scratch = Vec::new();
        for top in tops {
            for mounted in tf.children(top.as_deref()).to_vec() {
                if let Some(pose) = tf.absolute.get(&mounted).copied() {
                    tf.propagate_translation(&mounted, pose.x, pose.y, &mut scratch);
                }
            }
        }

        // --- 5. Initial pan offsets ---
        let mut pan_tilts: Vec<String> = tf.pan_tilts.keys().cloned().collect();
        pan_tilts.sort();
        for pt in &pan_tilts {
            tf.apply_pan_inner(pt, 0.0, &mut scratch);
        }

        report.robots = tf.robots.clone();
        report.pan_tilts = pan_tilts;
        (tf, report)
    }

    fn insert_declaration(&mut self, decl: &Declaration) {
        self.tree
            .entry(decl.host.clone())
            .or_default()
            .push(decl.name.clone());
        self.hosts.insert(decl.name.clone(), decl.host.clone());
        self.relative.insert(decl.name.clone(), decl.pose);
        self.absolute.insert(decl.name.clone(), decl.pose);
    }

    fn detach(&mut self, name: &str) {
        if let Some(host) = self.hosts.remove(name) {
            if let Some(siblings) = self.tree.get_mut(&host) {
                siblings.retain(|n| n != name);
            }
        }
    }

    /// Adds a device declared after setup, placing it relative to its host's
    /// current pose. Returns the devices whose absolute pose was written.
    pub fn attach(&mut self, decl: &Declaration) -> Vec<String> {
        self.detach(&decl.name);
        self.insert_declaration(decl);

        let mut updated = vec![decl.name.clone()];
        if decl.is_pan_tilt() && !self.pan_tilts.contains_key(&decl.name) {
            self.pan_tilts.insert(
                decl.name.clone(),
                PanTiltState {
                    base_topic: decl.base_topic.clone().unwrap_or_default(),
                    place: decl.host.clone(),
                    pan: 0.0,
                },
            );
        }

        if let Some(host) = &decl.host {
            if let Some(host_pose) = self.absolute.get(host).copied() {
                self.propagate_translation(host, host_pose.x, host_pose.y, &mut updated);
                if let Some(pan) = self.pan_tilts.get(host).map(|s| s.pan) {
                    self.apply_pan_inner(host, pan, &mut updated);
                } else if let (Some(host_theta), Some(rel_theta)) =
                    (host_pose.theta, decl.pose.theta)
                {
                    if let Some(abs) = self.absolute.get_mut(&decl.name) {
                        abs.theta = Some(host_theta + rel_theta);
                    }
                }
            }
        }
        if let Some(pan) = self.pan_tilts.get(&decl.name).map(|s| s.pan) {
            self.apply_pan_inner(&decl.name, pan, &mut updated);
        }

        updated.dedup();
        updated
    }

    /// A host (robot or pan-tilt carrier) reported a new pose. Every device it
    /// carries translates with it; non pan-tilt devices with a heading rotate
    /// with it; pan-tilts re-apply their current pan against the new bearing.
    pub fn on_host_pose_changed(
        &mut self,
        host: &str,
        x: f64,
        y: f64,
        theta: f64,
    ) -> SimResult<Vec<String>> {
        if !self.robots.iter().any(|r| r == host) && !self.relative.contains_key(host) {
            return Err(SimError::UnknownDevice(host.to_string()));
        }

        self.absolute
            .insert(host.to_string(), Pose2::new(x, y, Some(theta)));
        let mut updated = vec![host.to_string()];

        for device in self.children(Some(host)).to_vec() {
            self.translate_subtree(&device, x, y, &mut updated);
            if let Some(pan) = self.pan_tilts.get(&device).map(|s| s.pan) {
                self.apply_pan_inner(&device, pan, &mut updated);
            } else if let Some(rel_theta) = self.relative.get(&device).and_then(|p| p.theta) {
                if let Some(abs) = self.absolute.get_mut(&device) {
                    abs.theta = Some(theta + rel_theta);
                }
            }
        }

        updated.dedup();
        Ok(updated)
    }

    /// Records a new pan angle and recomputes the heading of every device the
    /// pan-tilt carries.
    pub fn apply_pan(&mut self, pan_tilt: &str, pan: f64) -> SimResult<Vec<String>> {
        if !self.pan_tilts.contains_key(pan_tilt) {
            return Err(SimError::UnknownDevice(pan_tilt.to_string()));
        }
        let mut updated = Vec::new();
        self.apply_pan_inner(pan_tilt, pan, &mut updated);
        Ok(updated)
    }

    fn apply_pan_inner(&mut self, pan_tilt: &str, pan: f64, updated: &mut Vec<String>) {
        if let Some(state) = self.pan_tilts.get_mut(pan_tilt) {
            state.pan = pan;
        }

        let abs_pt_theta = self.pan_tilt_heading(pan_tilt, pan);
        if let Some(abs) = self.absolute.get_mut(pan_tilt) {
            abs.theta = Some(abs_pt_theta);
            updated.push(pan_tilt.to_string());
        }

        for item in self.children(Some(pan_tilt)).to_vec() {
            if let Some(inner_pan) = self.pan_tilts.get(&item).map(|s| s.pan) {
                self.apply_pan_inner(&item, inner_pan, updated);
                continue;
            }
            let Some(rel_theta) = self.relative.get(&item).and_then(|p| p.theta) else {
                continue;
            };
            if let Some(abs) = self.absolute.get_mut(&item) {
                abs.theta = Some(rel_theta + abs_pt_theta);
                updated.push(item);
            }
        }
    }

    /// `relative(pt).theta + pan + absolute(host).theta`, missing terms are 0.
    fn pan_tilt_heading(&self, pan_tilt: &str, pan: f64) -> f64 {
        let base_theta = self
            .host_of(pan_tilt)
            .and_then(|h| self.absolute.get(h))
            .and_then(|p| p.theta)
            .unwrap_or(0.0);
        let relative_theta = self
            .relative
            .get(pan_tilt)
            .and_then(|p| p.theta)
            .unwrap_or(0.0);
        relative_theta + pan + base_theta
    }

    fn translate_subtree(&mut self, device: &str, x: f64, y: f64, updated: &mut Vec<String>) {
        if let Some(abs) = self.absolute.get_mut(device) {
            abs.x = x;
            abs.y = y;
            updated.push(device.to_string());
        }
        self.propagate_translation(device, x, y, updated);
    }

    fn propagate_translation(&mut self, host: &str, x: f64, y: f64, updated: &mut Vec<String>) {
        for child in self.children(Some(host)).to_vec() {
            self.translate_subtree(&child, x, y, updated);
        }
    }

    /// The absolute pose of `name`. Pan-tilt headings are computed on demand
    /// from their relative heading, current pan and host heading.
    pub fn get_tf(&self, name: &str) -> SimResult<Pose2> {
        let mut pose = *self
            .absolute
            .get(name)
            .ok_or_else(|| SimError::UnknownDevice(name.to_string()))?;
        if let Some(state) = self.pan_tilts.get(name) {
            pose.theta = Some(self.pan_tilt_heading(name, state.pan));
        }
        Ok(pose)
    }

    pub fn children(&self, host: Option<&str>) -> &[String] {
        self.tree
            .get(&host.map(str::to_string))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn host_of(&self, name: &str) -> Option<&str> {
        self.hosts.get(name).and_then(|h| h.as_deref())
    }

    pub fn pan_tilt(&self, name: &str) -> Option<&PanTiltState> {
        self.pan_tilts.get(name)
    }

    pub fn is_robot(&self, name: &str) -> bool {
        self.robots.iter().any(|r| r == name)
    }
}

impl TfProvider for PoseTree {
    fn get_transform(&self, name: &str) -> Option<Pose2> {
        self.get_tf(name).ok()
    }

    fn robots(&self) -> Vec<String> {
        self.robots.clone()
    }

    fn carrying_robot(&self, name: &str) -> Option<String> {
        let mut current = self.host_of(name);
        while let Some(host) = current {
            if self.is_robot(host) {
                return Some(host.to_string());
            }
            current = self.host_of(host);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::RawDeclaration;
    use crate::discovery::{ConnectedDevice, HostInfo, StaticDiscovery};
    use crate::declaration::{DeviceSubtype, DeviceType};
    use approx::assert_abs_diff_eq;

    const EPS: f64 = 1e-9;

    fn decl(src: &str) -> Declaration {
        let raw: RawDeclaration = toml::from_str(src).unwrap();
        Declaration::from_raw(raw).unwrap()
    }

    fn robot_host(name: &str, devices: Vec<ConnectedDevice>) -> HostInfo {
        HostInfo {
            name: name.to_string(),
            kind: HostKind::Robot,
            devices,
        }
    }

    fn pan_tilt_device(name: &str) -> ConnectedDevice {
        ConnectedDevice {
            name: name.to_string(),
            device_type: DeviceType::Robot,
            base_topic: format!("robot/{name}"),
            categorization: DeviceSubtype {
                category: "actuator".to_string(),
                class: "pan_tilt".to_string(),
                subclass: vec![],
            },
        }
    }

    #[test]
    fn pan_composes_with_relative_heading() {
        let declarations = vec![
            decl(
                r#"
                type = "env"
                name = "pt_1"
                subtype = { category = "actuator", class = "pan_tilt" }
                pose = { x = 0.0, y = 0.0, theta = 0.0 }
                "#,
            ),
            decl(&format!(
                r#"
                type = "env"
                name = "cam_1"
                subtype = {{ category = "sensor", class = "camera" }}
                pose = {{ x = 0.0, y = 0.0, theta = {} }}
                host = "pt_1"
                host_type = "pan_tilt"
                "#,
                0.2f64.to_degrees()
            )),
        ];
        let (mut tf, report) = PoseTree::setup(&declarations, &StaticDiscovery::default());
        assert!(report.inconsistencies.is_empty());
        assert_eq!(report.pan_tilts, vec!["pt_1".to_string()]);

        let updated = tf.apply_pan("pt_1", 0.5).unwrap();
        assert!(updated.contains(&"cam_1".to_string()));
        assert_abs_diff_eq!(tf.get_tf("cam_1").unwrap().theta.unwrap(), 0.7, epsilon = EPS);
        assert_abs_diff_eq!(tf.get_tf("pt_1").unwrap().theta.unwrap(), 0.5, epsilon = EPS);
    }

    #[test]
    fn devices_follow_their_robot() {
        let declarations = vec![
            decl(
                r#"
                type = "robot"
                name = "sonar_front"
                subtype = { category = "sensor", class = "sonar" }
                pose = { x = 0.0, y = 0.0, theta = 90.0 }
                host = "robot_1"
                host_type = "robot"
                "#,
            ),
            decl(
                r#"
                type = "robot"
                name = "co2_1"
                subtype = { category = "sensor", class = "gas" }
                host = "robot_1"
                host_type = "robot"
                "#,
            ),
        ];
        let discovery = StaticDiscovery(vec![robot_host("robot_1", vec![])]);
        let (mut tf, report) = PoseTree::setup(&declarations, &discovery);
        assert!(report.inconsistencies.is_empty());

        tf.on_host_pose_changed("robot_1", 3.0, -2.0, 1.0).unwrap();

        let sonar = tf.get_tf("sonar_front").unwrap();
        assert_abs_diff_eq!(sonar.x, 3.0, epsilon = EPS);
        assert_abs_diff_eq!(sonar.y, -2.0, epsilon = EPS);
        assert_abs_diff_eq!(
            sonar.theta.unwrap(),
            1.0 + std::f64::consts::FRAC_PI_2,
            epsilon = EPS
        );

        let gas = tf.get_tf("co2_1").unwrap();
        assert_abs_diff_eq!(gas.x, 3.0, epsilon = EPS);
        assert!(gas.theta.is_none());
    }

    #[test]
    fn pan_tilt_on_a_robot_composes_both_rotations() {
        let declarations = vec![
            decl(
                r#"
                type = "robot"
                name = "pt_r"
                subtype = { category = "actuator", class = "pan_tilt" }
                pose = { x = 0.0, y = 0.0, theta = 0.0 }
                host = "robot_1"
                host_type = "robot"
                "#,
            ),
            decl(
                r#"
                type = "robot"
                name = "cam_r"
                subtype = { category = "sensor", class = "camera" }
                pose = { x = 0.0, y = 0.0, theta = 0.0 }
                host = "pt_r"
                host_type = "pan_tilt"
                "#,
            ),
        ];
        let discovery = StaticDiscovery(vec![robot_host("robot_1", vec![pan_tilt_device("pt_r")])]);
        let (mut tf, _) = PoseTree::setup(&declarations, &discovery);

        tf.apply_pan("pt_r", 0.3).unwrap();
        tf.on_host_pose_changed("robot_1", 5.0, 6.0, 1.0).unwrap();

        let cam = tf.get_tf("cam_r").unwrap();
        assert_abs_diff_eq!(cam.x, 5.0, epsilon = EPS);
        assert_abs_diff_eq!(cam.y, 6.0, epsilon = EPS);
        assert_abs_diff_eq!(cam.theta.unwrap(), 1.3, epsilon = EPS);
        assert_abs_diff_eq!(tf.get_tf("pt_r").unwrap().theta.unwrap(), 1.3, epsilon = EPS);
        assert_eq!(tf.carrying_robot("cam_r"), Some("robot_1".to_string()));
    }

    #[test]
    fn mounts_on_a_robot_carry_their_devices_from_setup() {
        let declarations = vec![
            decl(
                r#"
                type = "robot"
                name = "pt_1"
                subtype = { category = "actuator", class = "pan_tilt" }
                pose = { x = 0.2, y = -0.1, theta = 0.0 }
                host = "robot_1"
                host_type = "robot"
                "#,
            ),
            decl(
                r#"
                type = "robot"
                name = "cam_1"
                subtype = { category = "sensor", class = "camera" }
                pose = { x = 0.0, y = 0.0, theta = 0.0 }
                host = "pt_1"
                host_type = "pan_tilt"
                "#,
            ),
        ];
        let discovery = StaticDiscovery(vec![robot_host("robot_1", vec![pan_tilt_device("pt_1")])]);
        let (tf, report) = PoseTree::setup(&declarations, &discovery);
        assert!(report.inconsistencies.is_empty());

        let pt = tf.get_tf("pt_1").unwrap();
        let cam = tf.get_tf("cam_1").unwrap();
        assert_abs_diff_eq!(cam.x, pt.x, epsilon = EPS);
        assert_abs_diff_eq!(cam.y, pt.y, epsilon = EPS);
        assert_abs_diff_eq!(cam.x, 0.2, epsilon = EPS);
    }

    #[test]
    fn stacked_pan_tilts_keep_the_inner_pan() {
        let declarations = vec![
            decl(
                r#"
                type = "env"
                name = "pt_outer"
                subtype = { category = "actuator", class = "pan_tilt" }
                pose = { x = 1.0, y = 1.0, theta = 0.0 }
                "#,
            ),
            decl(
                r#"
                type = "env"
                name = "pt_inner"
                subtype = { category = "actuator", class = "pan_tilt" }
                pose = { x = 0.0, y = 0.0, theta = 0.0 }
                host = "pt_outer"
                host_type = "pan_tilt"
                "#,
            ),
            decl(
                r#"
                type = "env"
                name = "cam_1"
                subtype = { category = "sensor", class = "camera" }
                pose = { x = 0.0, y = 0.0, theta = 0.0 }
                host = "pt_inner"
                host_type = "pan_tilt"
                "#,
            ),
        ];
        let (mut tf, _) = PoseTree::setup(&declarations, &StaticDiscovery::default());

        tf.apply_pan("pt_inner", 0.2).unwrap();
        let updated = tf.apply_pan("pt_outer", 0.5).unwrap();

        assert!(updated.contains(&"cam_1".to_string()));
        assert_abs_diff_eq!(tf.get_tf("pt_inner").unwrap().theta.unwrap(), 0.7, epsilon = EPS);
        assert_abs_diff_eq!(tf.get_tf("cam_1").unwrap().theta.unwrap(), 0.7, epsilon = EPS);
    }

    #[test]
    fn unknown_device_has_no_pose() {
        let (tf, _) = PoseTree::setup(&[], &StaticDiscovery::default());
        assert_eq!(
            tf.get_tf("does-not-exist"),
            Err(SimError::UnknownDevice("does-not-exist".to_string()))
        );
    }

    #[test]
    fn undeclared_host_is_reported() {
        let declarations = vec![decl(
            r#"
            type = "robot"
            name = "orphan"
            host = "ghost_robot"
            host_type = "robot"
            "#,
        )];
        let (_, report) = PoseTree::setup(&declarations, &StaticDiscovery::default());
        assert_eq!(report.inconsistencies, vec!["ghost_robot".to_string()]);
    }

    #[test]
    fn pose_events_for_unknown_hosts_are_rejected() {
        let (mut tf, _) = PoseTree::setup(&[], &StaticDiscovery::default());
        assert!(tf.on_host_pose_changed("nobody", 0.0, 0.0, 0.0).is_err());
        assert!(tf.apply_pan("nobody", 0.1).is_err());
    }

    #[test]
    fn late_declaration_joins_a_moved_robot() {
        let discovery = StaticDiscovery(vec![robot_host("robot_1", vec![])]);
        let (mut tf, _) = PoseTree::setup(&[], &discovery);
        tf.on_host_pose_changed("robot_1", 2.0, 2.0, 0.5).unwrap();

        tf.attach(&decl(
            r#"
            type = "robot"
            name = "ir_1"
            subtype = { category = "sensor", class = "ir" }
            pose = { x = 0.0, y = 0.0, theta = 0.0 }
            host = "robot_1"
            host_type = "robot"
            "#,
        ));

        let ir = tf.get_tf("ir_1").unwrap();
        assert_abs_diff_eq!(ir.x, 2.0, epsilon = EPS);
        assert_abs_diff_eq!(ir.theta.unwrap(), 0.5, epsilon = EPS);
    }
}
