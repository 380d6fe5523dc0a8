use super::SceneConfig;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub fn save_config(config: &SceneConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a config file. A file that does not exist yields the defaults.
/// Out-of-range values are normalized on the way in.
pub fn load_config(path: &Path) -> Result<SceneConfig> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(SceneConfig::default());
        }
        Err(err) => return Err(err.into()),
    };
    let config: SceneConfig = serde_json::from_str(&json)?;
    Ok(config.normalized())
}

#[cfg(test)]
mod tests {
    use super::{load_config, save_config, ConfigError};
    use crate::color::Color;
    use crate::config::SceneConfig;
    use std::path::PathBuf;

    fn temp_path(tag: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!(
            "portal_scene_{}_{}_{}.json",
            tag,
            std::process::id(),
            nonce
        ));
        path
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config(&temp_path("missing")).unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn test_partial_json_fills_in_defaults() {
        let json = r##"{
            "fireflyCount": 12,
            "skyEnabled": true,
            "tunables": { "clearColor": "#ff0000" }
        }"##;
        let config: SceneConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.firefly_count, 12);
        assert!(config.sky_enabled);
        assert_eq!(config.tunables.clear_color, Color::from_hex(0xff0000));
        assert_eq!(config.tunables.fireflies_size, 100.0);
        assert_eq!(config.nodes.portal_light, "Circle");
        assert_eq!(config.camera.fov, 45.0);
    }

    #[test]
    fn test_save_load_via_file() {
        let mut config = SceneConfig::default();
        config.firefly_seed = Some(7);
        config.tunables.portal_color_end = Color::from_hex(0x123456);
        config.nodes.baked = "bakedMesh".to_string();

        let path = temp_path("roundtrip");
        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, config);

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"portalColorEnd\": \"#123456\""));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let path = temp_path("malformed");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Json(_))));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_out_of_range_values_are_normalized_on_load() {
        let path = temp_path("normalize");
        let json = r#"{
            "tunables": { "firefliesSize": 10000, "sky": { "elevation": 120 } },
            "controls": {
                "minPolarAngle": 1.2, "maxPolarAngle": 0.4,
                "minDistance": 50, "maxDistance": 5
            }
        }"#;
        std::fs::write(&path, json).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.tunables.fireflies_size, 500.0);
        assert_eq!(config.tunables.sky.elevation, 90.0);
        assert_eq!(config.controls.min_polar_angle, 0.4);
        assert_eq!(config.controls.max_polar_angle, 1.2);
        assert_eq!(config.controls.min_distance, 5.0);
        assert_eq!(config.controls.max_distance, 50.0);
        let _ = std::fs::remove_file(path);
    }
}
