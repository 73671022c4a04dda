use std::path::Path;

use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::Value;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimConfig {
    /// Instructions (one per generated access) to simulate per workload.
    pub instructions: u64,
    /// Victim cache entries in the static configuration.
    pub victim_size: usize,
    /// Starting victim cache entries in the adaptive configuration.
    pub adaptive_start_size: usize,
    pub seed: u64,
    pub results_dir: String,
    pub log_level: String,
}

pub trait Config: DeserializeOwned + Default {
    fn from_section(section: Option<&Value>) -> Self {
        match section {
            Some(value) => value.clone().try_into().expect("cannot deserialize config"),
            None => {
                warn!("config section not found");
                Self::default()
            }
        }
    }
}

impl Config for SimConfig {}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            instructions: 500_000,
            victim_size: 128,
            adaptive_start_size: 80,
            seed: 1,
            results_dir: "results".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl SimConfig {
    /// Loads the `[sim]` section of a TOML file, falling back to defaults if
    /// the file is absent or unreadable.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match std::fs::read_to_string(path) {
            Ok(contents) => match contents.parse::<Value>() {
                Ok(value) => Self::from_section(value.get("sim")),
                Err(err) => {
                    warn!("cannot parse {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) => {
                warn!("cannot read {}: {err}", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_section_falls_back_to_defaults() {
        let config = SimConfig::from_section(None);
        assert_eq!(config.instructions, 500_000);
        assert_eq!(config.victim_size, 128);
        assert_eq!(config.adaptive_start_size, 80);
    }

    #[test]
    fn section_overrides_defaults_per_field() {
        let value: Value = "instructions = 1000\nseed = 42".parse().unwrap();
        let config = SimConfig::from_section(Some(&value));
        assert_eq!(config.instructions, 1000);
        assert_eq!(config.seed, 42);
        assert_eq!(config.victim_size, 128);
    }
}
