//! Session configuration, persisted as JSON.

mod serialization;

pub use serialization::{load_config, save_config, ConfigError, Result};

use crate::assets::NodeNames;
use crate::color::Color;
use crate::particles::DEFAULT_FIREFLY_COUNT;
use crate::render::{CameraConfig, OrbitSettings};
use crate::tunables::Tunables;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssetPaths {
    /// Directory the other two paths are relative to.
    pub base_dir: PathBuf,
    pub baked_texture: PathBuf,
    pub model: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("static"),
            baked_texture: PathBuf::from("baked-black.jpg"),
            model: PathBuf::from("baked-portal.glb"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneConfig {
    pub assets: AssetPaths,
    pub nodes: NodeNames,
    pub firefly_count: usize,
    /// Fixed seed for the firefly layout. Random when absent.
    pub firefly_seed: Option<u64>,
    pub camera: CameraConfig,
    pub controls: OrbitSettings,
    pub pole_light_color: Color,
    pub sky_enabled: bool,
    pub tunables: Tunables,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            assets: AssetPaths::default(),
            nodes: NodeNames::default(),
            firefly_count: DEFAULT_FIREFLY_COUNT,
            firefly_seed: None,
            camera: CameraConfig::default(),
            controls: OrbitSettings::default(),
            pole_light_color: Color::from_hex(0xffffe5),
            sky_enabled: false,
            tunables: Tunables::default(),
        }
    }
}

impl SceneConfig {
    /// Pull tunables into their ranges and order the orbit limits. Anything
    /// that had to change is logged.
    pub fn normalized(mut self) -> Self {
        let tunables = self.tunables.clamped();
        if tunables != self.tunables {
            log::warn!("Config tunables outside their ranges were clamped");
            self.tunables = tunables;
        }
        let (controls, changed) = self.controls.normalized();
        if changed {
            log::warn!("Config orbit limits were inverted and have been swapped");
            self.controls = controls;
        }
        self
    }
}
