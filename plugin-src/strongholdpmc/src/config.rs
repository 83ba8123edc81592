//! Stronghold configuration types, loaded from `config.toml`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::region::{BlockPos, SpatialRegion};

/// Top-level config file layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrongholdConfig {
    #[serde(default)]
    pub claim: ClaimConfig,
    #[serde(default)]
    pub upkeep: UpkeepConfig,
    #[serde(default)]
    pub siege: SiegeConfig,
}

/// Shape of the area a stronghold anchor claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimConfig {
    pub radius: u32,
    pub height: u32,
    /// How far below the anchor a claim reaches.
    pub underground_limit: u32,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            radius: 16,
            height: 24,
            underground_limit: 8,
        }
    }
}

impl ClaimConfig {
    /// The area claimed by a stronghold anchored at `anchor`.
    #[must_use]
    pub fn region_around(&self, anchor: BlockPos) -> SpatialRegion {
        SpatialRegion::around(anchor, self.radius, self.height, self.underground_limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpkeepConfig {
    /// In-game days of upkeep bought by one satiety point.
    pub duration_per_satiety: f64,
    /// Upkeep granted on registration, in in-game days.
    pub initial_days: f64,
}

impl Default for UpkeepConfig {
    fn default() -> Self {
        Self {
            duration_per_satiety: 0.0025,
            initial_days: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiegeConfig {
    /// Intensity added per qualifying hostile kill.
    pub increase: f32,
    /// Linear decay per real-time minute.
    pub decay_per_minute: f32,
}

impl Default for SiegeConfig {
    fn default() -> Self {
        Self {
            increase: 1.0,
            decay_per_minute: 0.1,
        }
    }
}

impl StrongholdConfig {
    /// Load config from a TOML file, writing the bundled default first if it is missing.
    pub fn load(path: &Path) -> Result<Self, String> {
        if path.exists() {
            let text = std::fs::read_to_string(path).map_err(|e| format!("read config: {e}"))?;
            toml::from_str(&text).map_err(|e| format!("parse config: {e}"))
        } else {
            let default_toml = include_str!("../config.toml");
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| format!("create config dir: {e}"))?;
            }
            std::fs::write(path, default_toml)
                .map_err(|e| format!("write default config: {e}"))?;
            log::info!("strongholdpmc: Created default config at {path:?}");
            toml::from_str(default_toml).map_err(|e| format!("parse default config: {e}"))
        }
    }
}
