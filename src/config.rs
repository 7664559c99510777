use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::estimator::demographics::PopulationTables;
use crate::estimator::overlap::{AffinityMatrix, CategoryTable, DemographicTiers};

/// Every static reference table the estimator consumes, loaded once at
/// startup and injected. Defaults carry the built-in Malaysia tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub taxonomy: CategoryTable,
    pub tiers: DemographicTiers,
    pub population: PopulationTables,
    pub affinity: AffinityMatrix,
}

impl ReferenceConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), String> {
        let config_path = path.or_else(default_config_path);
        let mut config = if let Some(path) = config_path.as_ref() {
            if path.exists() {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| format!("failed to read reference config: {}", err))?;
                toml::from_str(&contents)
                    .map_err(|err| format!("failed to parse reference config: {}", err))?
            } else {
                ReferenceConfig::default()
            }
        } else {
            ReferenceConfig::default()
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn write(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create config dir: {}", err))?;
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize reference config: {}", err))?;
        std::fs::write(path, payload)
            .map_err(|err| format!("failed to write reference config: {}", err))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("AFFINITY_DEFAULT") {
            if let Ok(coefficient) = value.parse::<f64>() {
                self.affinity.default = coefficient;
            }
        }
        if let Ok(value) = env::var("AFFINITY_SAME_CATEGORY") {
            if let Ok(coefficient) = value.parse::<f64>() {
                self.affinity.same_category_default = coefficient;
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("REFERENCE_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/reference.toml")))
}
