use crate::config::{load_config, SceneConfig};
use clap::Parser;
use std::path::PathBuf;

/// Argument that enables the debug panel, like a `#debug` URL fragment.
const DEBUG_MARKER: &str = "#debug";

#[derive(Debug, Parser)]
#[command(author, version, about = "Baked portal scene with fireflies", long_about = None)]
pub struct Cli {
    /// Scene config (JSON). Defaults apply when the file is missing.
    #[arg(long, default_value = "portal-scene.json")]
    pub config: PathBuf,

    /// Directory holding the baked texture and model
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Show the debug panel
    #[arg(long)]
    pub debug: bool,

    /// Add the sky dome and its panel controls
    #[arg(long)]
    pub sky: bool,

    /// Extra markers; `#debug` also shows the debug panel
    #[arg(trailing_var_arg = true)]
    pub markers: Vec<String>,
}

impl Cli {
    pub fn debug_panel(&self) -> bool {
        self.debug || self.markers.iter().any(|marker| marker == DEBUG_MARKER)
    }

    /// Load the config file and apply command-line overrides.
    pub fn scene_config(&self) -> crate::config::Result<SceneConfig> {
        let mut config = load_config(&self.config)?;
        if let Some(dir) = &self.assets {
            config.assets.base_dir = dir.clone();
        }
        config.sky_enabled |= self.sky;
        Ok(config)
    }
}
