use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::Device;

/// Folders and defaults the host integration runs with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    pub output_dir: PathBuf,
    pub checkpoints_dir: PathBuf,
    pub model_config: PathBuf,
    pub device: Device,
    pub cached_models: usize,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            checkpoints_dir: PathBuf::from("models").join("checkpoints"),
            model_config: PathBuf::from("config.yaml"),
            device: Device::Accelerator,
            cached_models: 1,
        }
    }
}

impl HostSettings {
    pub fn load(path: &Path) -> Result<Self, String> {
        let data = std::fs::read(path).map_err(|err| format!("{}: {err}", path.display()))?;
        serde_json::from_slice(&data).map_err(|err| format!("{}: {err}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        let data = serde_json::to_vec_pretty(self).map_err(|err| err.to_string())?;
        std::fs::write(path, data).map_err(|err| format!("{}: {err}", path.display()))
    }
}
