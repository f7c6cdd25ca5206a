// fleet_sim/src/simulation/config/devices.rs

//! Loads device declaration files from the scenario's `devices_dir`.

use bevy::prelude::*;
use figment::{
    providers::{Format, Toml},
    value::Value,
    Figment,
};
use std::path::Path;
use walkdir::WalkDir;

use super::structs::DeviceFile;

/// Walks `dir`, parses every `.toml` file, and returns the declarations found
/// in path order. Unreadable files are logged and skipped.
pub fn load_device_files(dir: &Path) -> Vec<Value> {
    if !dir.exists() {
        warn!(
            "Devices directory not found at {:?}, no device files will be loaded.",
            dir
        );
        return Vec::new();
    }

    info!("Loading device declarations from: {:?}", dir);

    let mut declarations = Vec::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| !e.file_type().is_dir() && e.path().extension().is_some_and(|ext| ext == "toml"))
    {
        let path = entry.path();
        match Figment::new().merge(Toml::file(path)).extract::<DeviceFile>() {
            Ok(file) => {
                let found = file.into_declarations();
                debug!("Loaded {} declaration(s) from {:?}", found.len(), path);
                declarations.extend(found);
            }
            Err(e) => {
                error!("Failed to load device file {:?}: {}", path, e);
            }
        }
    }
    declarations
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn single_and_list_files_are_both_loaded() {
        let dir = std::env::temp_dir().join(format!("fleet_sim_devices_{}", std::process::id()));
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(
            dir.join("a_fire.toml"),
            "type = \"actor\"\nname = \"fire_1\"\nsubtype = \"fire\"\n",
        )
        .unwrap();
        fs::write(
            dir.join("nested/humans.toml"),
            "[[declarations]]\ntype = \"actor\"\nname = \"h1\"\nsubtype = \"human\"\n\n\
             [[declarations]]\ntype = \"actor\"\nname = \"h2\"\nsubtype = \"human\"\n",
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let found = load_device_files(&dir);
        fs::remove_dir_all(&dir).unwrap();

        let names: Vec<String> = found
            .iter()
            .filter_map(|v| v.find_ref("name").and_then(|n| n.as_str()).map(str::to_string))
            .collect();
        assert_eq!(names, ["fire_1", "h1", "h2"]);
    }

    #[test]
    fn missing_directory_yields_nothing() {
        assert!(load_device_files(Path::new("does/not/exist")).is_empty());
    }
}
