use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Where the player record JSON lives.
    pub record_path: PathBuf,
    /// Simulated frame length in seconds.
    pub frame_dt: f32,
    /// Autoplay frame budget per game before the run is stopped.
    pub max_frames: u32,
    /// Seed used for autoplay runs so smoke output is reproducible.
    pub seed: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            record_path: PathBuf::from("arcade_record.json"),
            frame_dt: 1.0 / 60.0,
            max_frames: 7_200,
            seed: 1,
        }
    }
}

impl HostConfig {
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ARCADE_HOST_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("arcade.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }
}
