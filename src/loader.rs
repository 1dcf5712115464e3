use crate::config::LabConfig;
use crate::topology::Topology;
use crate::validation::Task;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs::File;
use std::path::Path;

/// Load and validate the lab configuration, or fall back to defaults
pub fn load_config(config_path: Option<&Path>) -> Result<LabConfig> {
    let Some(config_path) = config_path else {
        info!("No configuration file given, using defaults");
        return Ok(LabConfig::default());
    };
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration file {:?}", config_path))?;

    let config: LabConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration file {:?}", config_path))?;

    config.validate()?;

    Ok(config)
}

/// Load a task definition from YAML
pub fn load_task(task_path: &Path) -> Result<Task> {
    info!("Loading task from: {:?}", task_path);

    let file = File::open(task_path).wrap_err_with(|| format!("Failed to open task file {:?}", task_path))?;

    let task: Task =
        serde_yaml::from_reader(file).wrap_err_with(|| format!("Failed to parse task file {:?}", task_path))?;

    if task.requirements.is_empty() {
        warn!("Task '{}' has no requirements, only basic checks will be scored", task.id);
    }
    info!("Loaded task '{}' with {} requirement(s)", task.id, task.requirements.len());

    Ok(task)
}

/// Load a topology snapshot from JSON, re-checking its invariants
pub fn load_topology(topology_path: &Path) -> Result<Topology> {
    info!("Loading topology from: {:?}", topology_path);

    let json = std::fs::read_to_string(topology_path)
        .wrap_err_with(|| format!("Failed to read topology file {:?}", topology_path))?;

    let topology =
        Topology::from_json(&json).wrap_err_with(|| format!("Invalid topology snapshot {:?}", topology_path))?;

    Ok(topology)
}

/// Write a topology snapshot as pretty JSON
pub fn save_topology(topology: &Topology, topology_path: &Path) -> Result<()> {
    let json = topology.to_json()?;
    std::fs::write(topology_path, json)
        .wrap_err_with(|| format!("Failed to write topology file {:?}", topology_path))?;
    info!("Saved topology '{}' to {:?}", topology.name, topology_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Device;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_defaults_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config, LabConfig::default());
    }

    #[test]
    fn test_load_config_from_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "simulator:\n  step_delay: 0s\n  default_ping_count: 2").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.simulator.step_delay, Duration::ZERO);
        assert_eq!(config.simulator.default_ping_count, 2);
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "simulator:\n  default_ping_count: 0").unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn test_load_task() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "id: two-pcs\ntitle: Two PCs\nrequirements:\n  - kind: device_count\n    device_type: pc\n    min: 2"
        )
        .unwrap();

        let task = load_task(file.path()).unwrap();
        assert_eq!(task.id, "two-pcs");
        assert_eq!(task.requirements.len(), 1);
    }

    #[test]
    fn test_topology_save_and_load() {
        let mut topology = Topology::new("t1", "Saved");
        topology.add_device(Device::pc("pc1", "PC-1").with_ip("10.0.0.1")).unwrap();
        topology.add_device(Device::pc("pc2", "PC-2").with_ip("10.0.0.2")).unwrap();
        topology.connect("pc1:eth0", "pc2:eth0").unwrap();

        let file = NamedTempFile::new().unwrap();
        save_topology(&topology, file.path()).unwrap();
        let loaded = load_topology(file.path()).unwrap();
        assert_eq!(loaded.devices(), topology.devices());
        assert_eq!(loaded.links(), topology.links());
    }

    #[test]
    fn test_load_missing_topology() {
        assert!(load_topology(Path::new("/nonexistent/topology.json")).is_err());
    }
}
