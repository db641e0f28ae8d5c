//! Chart configuration loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Appearance of the residual chart (loaded from an optional TOML file)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Line thickness in pixels
    pub line_width: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            title: "OpenFOAM Final Residuals vs. Time".to_string(),
            x_label: "Time (s)".to_string(),
            y_label: "Final Residual".to_string(),
            line_width: 2,
        }
    }
}

/// Load chart configuration from a TOML file
pub fn load_config(path: &Path) -> Result<ChartConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: ChartConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if config.width == 0 || config.height == 0 {
        anyhow::bail!(
            "Invalid chart size {}x{} in config file: {:?}",
            config.width,
            config.height,
            path
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            width = 1920
            height = 1080
            title = "pitzDaily residuals"
        "#;

        let config: ChartConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.width, 1920);
        assert_eq!(config.height, 1080);
        assert_eq!(config.title, "pitzDaily residuals");
        assert_eq!(config.x_label, "Time (s)");
        assert_eq!(config.line_width, 2);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: ChartConfig = toml::from_str("").unwrap();
        assert_eq!(config, ChartConfig::default());
    }

    #[test]
    fn test_load_config_rejects_zero_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "width = 0").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("no_such_chart.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
